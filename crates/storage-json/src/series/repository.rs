use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tickerbook_core::{Result, SeriesStore};
use tickerbook_market_data::TimeSeries;

use crate::errors::StorageError;

/// Layout of written documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JsonStyle {
    /// Single line, no whitespace.
    #[default]
    Compact,
    /// One point per line, indented by this many spaces.
    Indented(usize),
}

impl JsonStyle {
    fn render(&self, series: &TimeSeries) -> std::result::Result<Vec<u8>, serde_json::Error> {
        match self {
            JsonStyle::Compact => serde_json::to_vec(series),
            JsonStyle::Indented(width) => {
                let indent = vec![b' '; *width];
                let mut out = Vec::new();
                let formatter = PrettyFormatter::with_indent(&indent);
                let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
                series.serialize(&mut serializer)?;
                Ok(out)
            }
        }
    }
}

/// Temp files from concurrent saves in one process must not collide.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One JSON file per symbol under a root directory.
pub struct JsonSeriesStore {
    root: PathBuf,
    style: JsonStyle,
}

impl JsonSeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            style: JsonStyle::default(),
        }
    }

    pub fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record path for `symbol`. The symbol is kept verbatim except for path
    /// separators, which become `_`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        let name: String = symbol
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root.join(format!("{}.json", name))
    }

    fn temp_path_for(&self, path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_file_name(format!(".{}.{}-{}.tmp", name, std::process::id(), seq))
    }

    async fn write_atomic(&self, path: &Path, bytes: Vec<u8>) -> std::result::Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        let temp = self.temp_path_for(path);
        if let Err(source) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::Write {
                path: temp,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::Rename {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SeriesStore for JsonSeriesStore {
    async fn load(&self, symbol: &str) -> TimeSeries {
        let path = self.path_for(symbol);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored history for {} at {}", symbol, path.display());
                return TimeSeries::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {}; treating as empty", path.display(), e);
                return TimeSeries::new();
            }
        };

        match serde_json::from_slice::<TimeSeries>(&bytes) {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    "Malformed history record {}: {}; treating as empty",
                    path.display(),
                    e
                );
                TimeSeries::new()
            }
        }
    }

    async fn save(&self, symbol: &str, series: &TimeSeries) -> Result<()> {
        let path = self.path_for(symbol);
        let bytes = self.style.render(series).map_err(StorageError::from)?;
        self.write_atomic(&path, bytes).await?;
        debug!("Wrote {} points to {}", series.len(), path.display());
        Ok(())
    }
}
