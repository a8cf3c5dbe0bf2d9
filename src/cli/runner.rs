//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ListingArgs, OutputFormat};
use crate::config::StorageConfig;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::{ContinuationToken, PageFetcher, Paginator};
use crate::storage::{BlobServiceClient, FileServiceClient, ListOptions, StoreLocation};
use bytes::Bytes;
use futures::StreamExt;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Line written to stdout
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Message<'a, T: Serialize> {
    Item {
        item: &'a T,
    },
    Page {
        page: usize,
        count: usize,
        items: &'a [T],
    },
    Summary {
        pages: u64,
        items: u64,
        duration_ms: u64,
    },
}

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels running listings
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the CLI command
    ///
    /// Ctrl-C cancels a running listing at its next page boundary.
    pub async fn run(&self) -> Result<()> {
        let cancel = self.cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });

        let result = self.dispatch().await;
        interrupt.abort();
        result
    }

    async fn dispatch(&self) -> Result<()> {
        match &self.cli.command {
            Commands::CreateContainer { container } => {
                self.blob_service()?.container(container).create().await?;
                Ok(())
            }
            Commands::DeleteContainer { container } => {
                self.blob_service()?.container(container).delete().await?;
                Ok(())
            }
            Commands::ListBlobs { container, listing } => {
                let config = self.load_config()?;
                let container = BlobServiceClient::from_config(&config)?.container(container);
                info!(container = %container.name(), "Listing blobs");
                let fetcher = container.fetcher(Self::list_options(&config, listing));
                self.emit_listing(
                    Self::paginator(fetcher, listing),
                    listing.pages,
                    &mut std::io::stdout(),
                )
                .await
            }
            Commands::UploadBlob {
                container,
                name,
                file,
                content_type,
            } => {
                let data = Self::read_local(file)?;
                self.blob_service()?
                    .container(container)
                    .upload_blob(name, content_type, data)
                    .await?;
                Ok(())
            }
            Commands::DownloadBlob {
                container,
                name,
                output,
            } => {
                let blob = self.blob_service()?.container(container).blob(name);
                let mut stream = Box::pin(blob.download_stream().await?);
                let mut out: Box<dyn tokio::io::AsyncWrite + Unpin> = match output {
                    Some(path) => Box::new(tokio::fs::File::create(path).await?),
                    None => Box::new(tokio::io::stdout()),
                };
                while let Some(chunk) = stream.next().await {
                    out.write_all(&chunk?).await?;
                }
                out.flush().await?;
                Ok(())
            }
            Commands::DeleteBlob { container, name } => {
                self.blob_service()?
                    .container(container)
                    .delete_blob(name)
                    .await?;
                Ok(())
            }
            Commands::CreateShare { share } => {
                self.file_service()?.share(share).create().await?;
                Ok(())
            }
            Commands::DeleteShare { share } => {
                self.file_service()?.share(share).delete().await?;
                Ok(())
            }
            Commands::ListFiles {
                share,
                directory,
                listing,
            } => {
                let config = self.load_config()?;
                let share = FileServiceClient::from_config(&config)?.share(share);
                let directory = match directory {
                    Some(path) => share.root_directory().subdirectory(path),
                    None => share.root_directory(),
                };
                info!(share = %share.name(), directory = %directory.path(), "Listing files");
                let fetcher = directory.fetcher(Self::list_options(&config, listing));
                self.emit_listing(
                    Self::paginator(fetcher, listing),
                    listing.pages,
                    &mut std::io::stdout(),
                )
                .await
            }
            Commands::UploadFile {
                share,
                name,
                file,
                content_type,
            } => {
                let data = Self::read_local(file)?;
                self.file_service()?
                    .share(share)
                    .upload_file(name, content_type, data)
                    .await?;
                Ok(())
            }
            Commands::DownloadFile {
                share,
                name,
                output,
            } => {
                let data = self.file_service()?.share(share).download_file(name).await?;
                Self::write_local(output.as_deref(), &data)
            }
            Commands::ListStore {
                url,
                page_size,
                pages,
            } => {
                let location = StoreLocation::parse(url)?;
                info!(scheme = %location.scheme(), prefix = %location.prefix(), "Listing object store");
                self.emit_listing(location.list(*page_size), *pages, &mut std::io::stdout())
                    .await
            }
        }
    }

    /// Load configuration: file, then environment, then flags
    fn load_config(&self) -> Result<StorageConfig> {
        let config = match &self.cli.config {
            Some(path) => StorageConfig::load(path)?,
            None => StorageConfig::default(),
        };

        let mut config = config.with_env_overrides();
        if let Some(account) = &self.cli.account {
            config.account_name.clone_from(account);
        }

        config.validate()?;
        debug!(account = %config.account_name, "Loaded configuration");
        Ok(config)
    }

    fn blob_service(&self) -> Result<BlobServiceClient> {
        BlobServiceClient::from_config(&self.load_config()?)
    }

    fn file_service(&self) -> Result<FileServiceClient> {
        FileServiceClient::from_config(&self.load_config()?)
    }

    /// Listing options from flags, falling back to the config's page size
    fn list_options(config: &StorageConfig, listing: &ListingArgs) -> ListOptions {
        let mut options = config.list_options();
        options.prefix.clone_from(&listing.prefix);
        if let Some(size) = listing.page_size {
            options.page_size = Some(size);
        }
        options
    }

    fn paginator<F: PageFetcher>(fetcher: F, listing: &ListingArgs) -> Paginator<F> {
        match &listing.marker {
            Some(marker) => Paginator::resume(fetcher, ContinuationToken::marker(marker.as_str())),
            None => Paginator::start(fetcher),
        }
    }

    /// Print a listing, lazily item by item or grouped by page
    ///
    /// A failed or cancelled listing still prints what it fetched and the
    /// summary line before returning the error.
    async fn emit_listing<F>(
        &self,
        paginator: Paginator<F>,
        by_page: bool,
        out: &mut dyn Write,
    ) -> Result<()>
    where
        F: PageFetcher,
        F::Item: Serialize,
    {
        let start = Instant::now();
        let mut paginator = paginator.with_cancellation(self.cancel.clone());

        if by_page {
            let (listing, error) = match paginator.collect_pages().await {
                Ok(listing) => (listing, None),
                Err(partial) => (partial.collected, Some(partial.error)),
            };
            for group in listing.pages() {
                self.output_message(
                    out,
                    &Message::Page {
                        page: group.index,
                        count: group.len(),
                        items: &group.items,
                    },
                )?;
            }
            let summary: Message<'_, F::Item> = Message::Summary {
                pages: listing.page_count() as u64,
                items: listing.item_count() as u64,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            self.output_message(out, &summary)?;
            return error.map_or(Ok(()), Err);
        }

        let mut error = None;
        while let Some(item) = paginator.next_item().await {
            match item {
                Ok(item) => self.output_message(out, &Message::Item { item: &item })?,
                Err(e) => error = Some(e),
            }
        }

        let stats = paginator.stats();
        let summary: Message<'_, F::Item> = Message::Summary {
            pages: stats.pages_fetched,
            items: stats.items_fetched,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.output_message(out, &summary)?;
        error.map_or(Ok(()), Err)
    }

    /// Write one message line
    fn output_message<T: Serialize>(&self, out: &mut dyn Write, msg: &Message<'_, T>) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }

    fn read_local(path: &Path) -> Result<Bytes> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let data = fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
        Ok(Bytes::from(data))
    }

    fn write_local(path: Option<&Path>, data: &[u8]) -> Result<()> {
        match path {
            Some(path) => fs::write(path, data)
                .with_context(|| format!("Failed to write '{}'", path.display())),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(data)?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}
