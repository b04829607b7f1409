use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rewrite::SceneRange;
use crate::screenplay::{DocumentFormat, Scene};

// @module: File and directory utilities

/// Extension of the rewritten screenplay
pub const FOUNTAIN_EXTENSION: &str = "fountain";

/// Extension of the diff report
pub const REPORT_EXTENSION: &str = "diff.json";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @returns: Run suffix, "S001-S005" for a range or "FULL" without one
    pub fn run_suffix(range: Option<SceneRange>) -> String {
        match range {
            Some(range) => format!(
                "{}-{}",
                Scene::id_for_ordinal(range.start),
                Scene::id_for_ordinal(range.end)
            ),
            None => "FULL".to_string(),
        }
    }

    // @generates: Output path "<stem>_<suffix>.<extension>" in output_dir
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('_');
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.join(output_filename)
    }

    /// Path of the rewritten screenplay for a run
    pub fn fountain_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        range: Option<SceneRange>,
    ) -> PathBuf {
        Self::generate_output_path(input_file, output_dir, &Self::run_suffix(range), FOUNTAIN_EXTENSION)
    }

    /// Path of the diff report for a run
    pub fn report_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        range: Option<SceneRange>,
    ) -> PathBuf {
        Self::generate_output_path(input_file, output_dir, &Self::run_suffix(range), REPORT_EXTENSION)
    }

    /// Document format from the file extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();

        DocumentFormat::from_extension(&extension)
            .with_context(|| format!("Unsupported document type: {:?}", path))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
