use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of everything the service persists.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub index_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub urls_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: &Path) -> Self {
        let data_dir = data_dir.to_path_buf();
        let index_path = data_dir.join("index.json");
        let uploads_dir = data_dir.join("uploads");
        let urls_path = data_dir.join("urls.txt");
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &uploads_dir, &log_dir] {
            if let Err(err) = fs::create_dir_all(dir) {
                tracing::warn!("Failed to create directory {}: {}", dir.display(), err);
            }
        }

        AppPaths {
            data_dir,
            index_path,
            uploads_dir,
            urls_path,
            log_dir,
        }
    }
}
