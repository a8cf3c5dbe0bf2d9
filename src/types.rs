//! Common types used throughout segstore

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User-defined metadata attached to a stored object
pub type Metadata = HashMap<String, String>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy for transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
