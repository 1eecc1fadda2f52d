use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::translation::TranslatableFile;

// @module: File and directory utilities

/// Files larger than this are refused
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    /// Whether `path` has one of `extensions` (case-insensitive, with or without dot)
    pub fn has_extension<P: AsRef<Path>>(path: P, extensions: &[String]) -> bool {
        let Some(ext) = path.as_ref().extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();
        extensions
            .iter()
            .any(|wanted| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
    }

    /// Find files with one of the extensions under a directory, sorted by path
    pub fn find_text_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow!("Directory does not exist: {:?}", dir));
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if entry.file_type().is_file() && Self::has_extension(path, extensions) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a text file, replacing invalid UTF-8 and trimming surrounding whitespace
    pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for {:?}", path))?;

        if metadata.len() > MAX_FILE_BYTES {
            return Err(anyhow!(
                "File too large: {:?} ({} bytes exceeds {} bytes)",
                path,
                metadata.len(),
                MAX_FILE_BYTES
            ));
        }

        let raw = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Load files as batch input; the file name is the path relative to `root`
    pub fn load_translatable_files<P: AsRef<Path>>(root: P, paths: &[PathBuf]) -> Result<Vec<TranslatableFile>> {
        let root = root.as_ref();
        paths
            .iter()
            .map(|path| {
                let content = Self::read_text(path)?;
                let name = path
                    .strip_prefix(root)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .to_string();
                Ok(TranslatableFile::new(name, content).with_path(path))
            })
            .collect()
    }
}
