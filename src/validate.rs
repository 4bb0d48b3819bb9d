use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SubExtractError};

/// Container extensions accepted as input (lowercase, without the dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp", "ts", "m2ts", "mpg", "mpeg",
    "ogv",
];

/// An input file that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ValidatedInput {
    pub fn display_size(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Extension allow-list check; never touches the filesystem
pub fn is_supported_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check that `path` is an existing file with a supported container extension
pub fn validate<P: AsRef<Path>>(path: P) -> Result<ValidatedInput> {
    let path = path.as_ref();
    debug!("Validating input file: {}", path.display());

    let metadata = std::fs::metadata(path)
        .map_err(|_| SubExtractError::InvalidInput(format!("File not found: {}", path.display())))?;

    if !metadata.is_file() {
        return Err(SubExtractError::InvalidInput(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }

    if !is_supported_extension(path) {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| "(none)".to_string());
        return Err(SubExtractError::InvalidInput(format!(
            "Unsupported file format {} for {}",
            ext,
            path.display()
        )));
    }

    let input = ValidatedInput {
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
    };
    info!("Validated {} ({})", path.display(), input.display_size());
    Ok(input)
}

/// Boolean form of [`validate`]
pub fn is_valid<P: AsRef<Path>>(path: P) -> bool {
    validate(path).is_ok()
}

/// Format a byte count for humans, e.g. `1.50 MB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(is_supported_extension("movie.mkv"));
        assert!(is_supported_extension("MOVIE.MKV"));
        assert!(is_supported_extension("clip.M2TS"));
        assert!(is_supported_extension("/no/such/dir/show.Mp4"));
    }

    #[test]
    fn test_rejected_extensions() {
        assert!(!is_supported_extension("subs.srt"));
        assert!(!is_supported_extension("archive.mkv.zip"));
        assert!(!is_supported_extension("no_extension"));
        assert!(!is_supported_extension(".mkv"));
    }

    #[test]
    fn test_validate_existing_video() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("Movie.MKV");
        file.write_binary(&[0u8; 2048]).unwrap();

        let input = validate(file.path()).unwrap();
        assert_eq!(input.size_bytes, 2048);
        assert_eq!(input.display_size(), "2.00 KB");
        assert!(is_valid(file.path()));
    }

    #[test]
    fn test_validate_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let missing = temp.child("missing.mkv");
        assert!(matches!(validate(missing.path()), Err(SubExtractError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_unsupported_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("notes.txt");
        file.write_str("not a video").unwrap();

        let err = validate(file.path()).unwrap_err();
        assert!(err.to_string().contains(".txt"));
        assert!(!is_valid(file.path()));
    }

    #[test]
    fn test_validate_directory_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dir = temp.child("season1.mkv");
        dir.create_dir_all().unwrap();
        assert!(!is_valid(dir.path()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
