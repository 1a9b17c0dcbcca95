use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{app_config_path, config_env_dirs, APP_DIR};
use crate::history::format::{parse_records, write_records};
use crate::history::HistoryStore;
use thiserror::Error;

const HISTORY_FILE: &str = "action-history";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read action history: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write action history: {path}")]
    Write { path: PathBuf, source: io::Error },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Where the ranked history lives between runs.
#[derive(Debug, Clone)]
pub struct HistoryStorage {
    path: PathBuf,
}

impl HistoryStorage {
    pub const fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_default_path() -> StorageResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        let path = app_config_path(
            APP_DIR,
            HISTORY_FILE,
            xdg_config_home.as_deref(),
            home.as_deref(),
        )
        .map_err(|_| StorageError::MissingHomeDirectory)?;
        Ok(Self::with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next save is written to before it replaces `path`.
    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        file_name.push(TEMP_SUFFIX);
        self.path.with_file_name(file_name)
    }

    /// Appends persisted records to `store`. A missing file loads nothing.
    pub fn load(
        &self,
        store: &mut HistoryStore,
        max_items: usize,
        is_excluded: impl Fn(&str) -> bool,
    ) -> StorageResult<usize> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let loaded = store.load_records(parse_records(&contents), max_items, is_excluded);
        tracing::debug!(path = %self.path.display(), loaded, "loaded action history");
        Ok(loaded)
    }

    /// Writes the first `max_items` ranked items, replacing the previous file
    /// only once the new contents are fully written.
    pub fn save(&self, store: &HistoryStore, max_items: usize) -> StorageResult<()> {
        let text = write_records(
            store
                .iter()
                .take(max_items)
                .map(|item| (item.action_name(), item.delta())),
        );

        let write_error = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let temp_path = self.temp_path();
        fs::write(&temp_path, text).map_err(write_error)?;
        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(source));
        }

        tracing::debug!(
            path = %self.path.display(),
            saved = store.len().min(max_items),
            "saved action history"
        );
        Ok(())
    }
}
