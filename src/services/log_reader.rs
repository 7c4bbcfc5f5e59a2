use crate::error::{FleetError, Result};
use crate::models::LogFileInfo;
use crate::services::process_manager::clamp_lines;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Returns the trailing `n` lines of `content` as a slice of the original
/// text, separators included. A final line terminator does not count as an
/// extra empty line.
pub fn tail_lines(content: &str, n: usize) -> &str {
    if n == 0 || content.is_empty() {
        return "";
    }
    let total = content.split_inclusive('\n').count();
    if n >= total {
        return content;
    }

    let skip = total - n;
    let start = content
        .match_indices('\n')
        .nth(skip - 1)
        .map(|(index, _)| index + 1)
        .unwrap_or(0);
    &content[start..]
}

/// Bounded reads of log files under a fixed set of allowed roots.
#[derive(Debug, Clone)]
pub struct LogReader {
    allowed_roots: Vec<PathBuf>,
}

impl LogReader {
    pub fn new(allowed_roots: Vec<PathBuf>) -> Self {
        Self { allowed_roots }
    }

    /// Rejects relative paths, `..` segments and anything outside the roots.
    pub fn check_allowed(&self, path: &Path) -> Result<()> {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir));
        let inside = self.allowed_roots.iter().any(|root| path.starts_with(root));
        if !path.is_absolute() || escapes || !inside {
            return Err(FleetError::AccessDenied {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Reads the whole file and returns its last `lines` lines (clamped to
    /// `[1, 1000]`, default 100).
    pub async fn tail(&self, path: &Path, lines: Option<usize>) -> Result<String> {
        self.check_allowed(path)?;
        let lines = clamp_lines(lines);
        let content = self.read(path).await?;
        debug!(path = %path.display(), lines, "tail");
        Ok(tail_lines(&content, lines).to_string())
    }

    /// Whole-file read behind the same allow-list.
    pub async fn read(&self, path: &Path) -> Result<String> {
        self.check_allowed(path)?;
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FleetError::not_found(format!("log file {}", path.display())),
            _ => FleetError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// `.log` files directly inside `dir`, newest first.
    pub async fn list_log_files(&self, dir: &Path) -> Result<Vec<LogFileInfo>> {
        self.check_allowed(dir)?;
        let dir = dir.to_path_buf();
        if !dir.is_dir() {
            return Err(FleetError::not_found(format!("log directory {}", dir.display())));
        }

        let mut files = tokio::task::spawn_blocking(move || scan_log_dir(&dir))
            .await
            .map_err(|e| FleetError::Io(std::io::Error::new(ErrorKind::Other, e)))?;
        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }
}

fn scan_log_dir(dir: &Path) -> Vec<LogFileInfo> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "log"))
        .filter_map(|e| {
            let metadata = e.metadata().ok()?;
            Some(LogFileInfo {
                path: e.path().to_path_buf(),
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            })
        })
        .collect()
}
