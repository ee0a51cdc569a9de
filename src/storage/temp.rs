//! Temporary storage
//!
//! Screenshots, analysis output, backups and caches live under one temp
//! root, one subfolder per kind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StorageError;

pub const TEMP_FOLDERS: &[&str] = &[
    "screenshots",
    "downloads",
    "analysis",
    "cache",
    "exports",
    "backups",
];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub deleted_files: usize,
    pub size_freed_mb: f64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderUsage {
    pub files: usize,
    pub size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempInfo {
    pub total_size_mb: f64,
    pub folders: BTreeMap<String, FolderUsage>,
    pub temp_root: String,
    pub max_size_mb: u64,
    pub over_limit: bool,
}

/// Regular files directly inside `dir`
fn files_in(dir: &Path) -> Result<Vec<(PathBuf, fs::Metadata)>, StorageError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_file() {
            out.push((entry.path(), meta));
        }
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct TempFileManager {
    root: PathBuf,
    cleanup_interval_hours: u64,
    max_size_mb: u64,
}

impl TempFileManager {
    /// Create the temp root and its subfolders
    pub fn new(
        root: impl Into<PathBuf>,
        cleanup_interval_hours: u64,
        max_size_mb: u64,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        for folder in TEMP_FOLDERS {
            fs::create_dir_all(root.join(folder))?;
        }
        tracing::info!("Temp folder structure created at: {}", root.display());
        Ok(Self {
            root,
            cleanup_interval_hours,
            max_size_mb,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cleanup_interval_hours(&self) -> u64 {
        self.cleanup_interval_hours
    }

    pub fn folder(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn screenshot_path(&self) -> PathBuf {
        self.folder("screenshots")
            .join(format!("screenshot_{}.png", timestamp()))
    }

    pub fn analysis_path(&self, stem: &str) -> PathBuf {
        self.folder("analysis")
            .join(format!("{}_{}.json", stem, timestamp()))
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.folder("cache").join(name)
    }

    /// A fresh backup location for `name`; never an existing path
    pub fn backup_path(&self, name: &str) -> PathBuf {
        let stamped = format!("{}_{}", name, timestamp());
        let candidate = self.folder("backups").join(&stamped);
        if !candidate.exists() {
            return candidate;
        }
        let suffix = Uuid::new_v4().simple().to_string();
        self.folder("backups")
            .join(format!("{}_{}", stamped, &suffix[..8]))
    }

    /// Delete files older than `hours` (default: the cleanup interval)
    pub fn cleanup_old_files(&self, hours: Option<u64>) -> Result<CleanupReport, StorageError> {
        let hours = hours.unwrap_or(self.cleanup_interval_hours);
        let cutoff = SystemTime::now()
            .checked_sub(Duration::from_secs(hours.saturating_mul(3600)))
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut files = Vec::new();
        let mut freed = 0u64;
        for entry in fs::read_dir(&self.root)? {
            let folder = entry?.path();
            if !folder.is_dir() {
                continue;
            }
            for (path, meta) in files_in(&folder)? {
                let modified = meta.modified()?;
                if modified < cutoff {
                    fs::remove_file(&path)?;
                    freed += meta.len();
                    files.push(path.display().to_string());
                }
            }
        }

        tracing::info!(
            "Temp cleanup removed {} files ({:.2} MB)",
            files.len(),
            to_mb(freed)
        );
        Ok(CleanupReport {
            deleted_files: files.len(),
            size_freed_mb: to_mb(freed),
            files,
        })
    }

    pub fn info(&self) -> Result<TempInfo, StorageError> {
        let mut folders = BTreeMap::new();
        let mut total = 0u64;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let folder = entry.path();
            if !folder.is_dir() {
                continue;
            }
            let files = files_in(&folder)?;
            let size: u64 = files.iter().map(|(_, meta)| meta.len()).sum();
            total += size;
            folders.insert(
                entry.file_name().to_string_lossy().into_owned(),
                FolderUsage {
                    files: files.len(),
                    size_mb: to_mb(size),
                },
            );
        }

        let total_size_mb = to_mb(total);
        Ok(TempInfo {
            total_size_mb,
            folders,
            temp_root: self.root.display().to_string(),
            max_size_mb: self.max_size_mb,
            over_limit: total_size_mb > self.max_size_mb as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn age_file(path: &Path, hours: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(hours * 3600))
            .unwrap();
    }

    #[test]
    fn test_structure_created() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path().join("temp"), 24, 1024).unwrap();
        for folder in TEMP_FOLDERS {
            assert!(temp.folder(folder).is_dir(), "{folder} missing");
        }
    }

    #[test]
    fn test_path_naming() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path(), 24, 1024).unwrap();

        let shot = temp.screenshot_path();
        let name = shot.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("screenshot_") && name.ends_with(".png"));
        // screenshot_YYYYmmdd_HHMMSS.png
        assert_eq!(name.len(), "screenshot_".len() + 15 + ".png".len());
        assert_eq!(shot.parent().unwrap(), temp.folder("screenshots"));

        let analysis = temp.analysis_path("notes");
        assert!(analysis
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("notes_"));
        assert_eq!(temp.cache_path("x.bin"), temp.folder("cache").join("x.bin"));
        assert_eq!(temp.backup_path("a.txt").parent().unwrap(), temp.folder("backups"));
    }

    #[test]
    fn test_backups_within_one_second_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path(), 24, 1024).unwrap();

        let first = temp.backup_path("report.txt");
        fs::write(&first, "first").unwrap();
        let second = temp.backup_path("report.txt");
        fs::write(&second, "second").unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert!(second
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("report.txt_"));
    }

    #[test]
    fn test_cleanup_removes_only_old_files() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path(), 24, 1024).unwrap();

        let old = temp.folder("cache").join("old.bin");
        let fresh = temp.folder("cache").join("fresh.bin");
        fs::write(&old, vec![0u8; 2048]).unwrap();
        fs::write(&fresh, b"new").unwrap();
        age_file(&old, 48);

        let report = temp.cleanup_old_files(None).unwrap();
        assert_eq!(report.deleted_files, 1);
        assert!(!old.exists());
        assert!(fresh.exists());

        // A zero-hour cutoff removes everything older than now
        age_file(&fresh, 1);
        let report = temp.cleanup_old_files(Some(0)).unwrap();
        assert_eq!(report.deleted_files, 1);
    }

    #[test]
    fn test_info_counts_files_per_folder() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path(), 24, 1024).unwrap();
        fs::write(temp.folder("screenshots").join("a.png"), vec![0u8; 1024]).unwrap();
        fs::write(temp.folder("screenshots").join("b.png"), vec![0u8; 1024]).unwrap();
        fs::write(temp.folder("analysis").join("c.json"), b"{}").unwrap();

        let info = temp.info().unwrap();
        assert_eq!(info.folders["screenshots"].files, 2);
        assert_eq!(info.folders["analysis"].files, 1);
        assert_eq!(info.folders["exports"].files, 0);
        assert!(!info.over_limit);
    }

    #[test]
    fn test_over_limit_flag() {
        let dir = TempDir::new().unwrap();
        let temp = TempFileManager::new(dir.path(), 24, 0).unwrap();
        fs::write(temp.folder("cache").join("big.bin"), vec![0u8; 1024 * 1024]).unwrap();
        assert!(temp.info().unwrap().over_limit);
    }
}
