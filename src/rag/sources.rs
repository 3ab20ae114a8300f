//! Tracked inputs that a rebuild re-ingests: uploaded file backups and the
//! URL list.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    uploads_dir: PathBuf,
    urls_path: PathBuf,
}

impl SourceRegistry {
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            uploads_dir: paths.uploads_dir.clone(),
            urls_path: paths.urls_path.clone(),
        }
    }

    /// Writes a backup copy of an upload and returns its sanitized name.
    pub fn backup_file(&self, filename: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let name = sanitize_filename(filename)?;
        fs::create_dir_all(&self.uploads_dir).map_err(ApiError::internal)?;
        fs::write(self.uploads_dir.join(&name), bytes).map_err(ApiError::internal)?;
        Ok(name)
    }

    /// Backed-up files, sorted by name.
    pub fn list_files(&self) -> Result<Vec<PathBuf>, ApiError> {
        let entries = match fs::read_dir(&self.uploads_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ApiError::internal(err)),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Tracked URLs in file order. Blank lines and `#` comments are skipped.
    pub fn list_urls(&self) -> Result<Vec<String>, ApiError> {
        let contents = match fs::read_to_string(&self.urls_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ApiError::internal(err)),
        };
        Ok(parse_url_list(&contents))
    }

    /// Appends `url` unless already tracked. Returns whether it was added.
    pub fn add_url(&self, url: &str) -> Result<bool, ApiError> {
        if self.list_urls()?.iter().any(|known| known == url) {
            return Ok(false);
        }

        let needs_newline = fs::read(&self.urls_path)
            .map(|bytes| !bytes.is_empty() && !bytes.ends_with(b"\n"))
            .unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.urls_path)
            .map_err(ApiError::internal)?;
        if needs_newline {
            writeln!(file).map_err(ApiError::internal)?;
        }
        writeln!(file, "{}", url).map_err(ApiError::internal)?;
        Ok(true)
    }

    /// Stops tracking `source`, whether it is a URL line or a backed-up file.
    /// Returns whether anything was removed.
    pub fn untrack(&self, source: &str) -> Result<bool, ApiError> {
        let mut removed = false;

        if let Ok(contents) = fs::read_to_string(&self.urls_path) {
            let kept: Vec<&str> = contents
                .lines()
                .filter(|line| line.trim() != source)
                .collect();
            if kept.len() != contents.lines().count() {
                let mut rewritten = kept.join("\n");
                if !rewritten.is_empty() {
                    rewritten.push('\n');
                }
                fs::write(&self.urls_path, rewritten).map_err(ApiError::internal)?;
                removed = true;
            }
        }

        // a URL's last path segment must not match an unrelated backup
        let backup_name = sanitize_filename(source).ok().filter(|name| name == source);
        if let Some(name) = backup_name {
            let path = self.uploads_dir.join(name);
            if path.is_file() {
                fs::remove_file(&path).map_err(ApiError::internal)?;
                removed = true;
            }
        }

        Ok(removed)
    }
}

pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}

/// Keeps only the final path component and maps anything outside
/// `[A-Za-z0-9._-]` to `_`.
pub fn sanitize_filename(raw: &str) -> Result<String, ApiError> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(ApiError::BadRequest(format!("Invalid file name: {:?}", raw)));
    }
    Ok(cleaned)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
