//! Service endpoints and entity URLs

use crate::error::{Error, Result};
use url::Url;

/// Placeholder for the account name in endpoint templates
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Default blob service endpoint template
pub const DEFAULT_BLOB_ENDPOINT: &str = "https://{account}.blob.core.windows.net";

/// Default file service endpoint template
pub const DEFAULT_FILE_ENDPOINT: &str = "https://{account}.file.core.windows.net";

/// Base URL of a storage service for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    url: Url,
}

impl ServiceEndpoint {
    /// Resolve an endpoint template for an account
    ///
    /// `{account}` is replaced by the account name, so both host-style
    /// (`https://{account}.blob.core.windows.net`) and path-style
    /// (`http://127.0.0.1:10000/{account}`) endpoints work. A template
    /// without the placeholder is used as is.
    pub fn from_template(template: &str, account: &str) -> Result<Self> {
        if template.contains(ACCOUNT_PLACEHOLDER) && account.is_empty() {
            return Err(Error::missing_field("account_name"));
        }
        Self::parse(&template.replace(ACCOUNT_PLACEHOLDER, account))
    }

    /// Parse a concrete endpoint URL
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::invalid_value("endpoint", format!("{url}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "endpoint",
                format!("{url} cannot be used as a base URL"),
            ));
        }
        Ok(Self { url })
    }

    /// The endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Append a '/'-separated name to a URL path
///
/// Each segment is percent-encoded on its own so names with slashes keep
/// their hierarchy.
pub(crate) fn child_url(base: &Url, name: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(name.split('/').filter(|s| !s.is_empty()));
    }
    url
}
