use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::validate::is_supported_extension;

/// Platform file and folder selection used by the interactive session
pub trait PathPicker {
    /// Ask for a video file; `None` when the user cancels
    fn pick_file(&mut self, start_dir: &Path) -> Option<PathBuf>;

    /// Ask for an output folder; `None` when the user cancels
    fn pick_directory(&mut self, start_dir: &Path) -> Option<PathBuf>;
}

/// Native OS dialogs
#[cfg(feature = "dialogs")]
#[derive(Debug, Default)]
pub struct NativeDialogPicker;

#[cfg(feature = "dialogs")]
impl PathPicker for NativeDialogPicker {
    fn pick_file(&mut self, start_dir: &Path) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select a video file")
            .set_directory(start_dir)
            .add_filter("Video files", crate::validate::SUPPORTED_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_file()
    }

    fn pick_directory(&mut self, start_dir: &Path) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select output folder")
            .set_directory(start_dir)
            .pick_folder()
    }
}

/// Picker for the current build, if it has one
pub fn default_picker() -> Option<Box<dyn PathPicker>> {
    #[cfg(feature = "dialogs")]
    {
        Some(Box::new(NativeDialogPicker))
    }
    #[cfg(not(feature = "dialogs"))]
    {
        None
    }
}

/// Supported video files directly inside `dir`, sorted by path
pub fn find_videos<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    videos.sort();
    videos
}
