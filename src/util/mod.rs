use std::fs;
use std::path::Path;

mod reporting;

pub use reporting::{display_dataset_summary, export_poses_yaml, PoseReport};

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &str) -> Result<(), UtilError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                UtilError::IOError(format!("Failed to create output directory: {e}"))
            })?;
        }
    }
    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum UtilError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to write YAML: {0}")]
    YamlError(String),
}

impl From<std::io::Error> for UtilError {
    fn from(err: std::io::Error) -> Self {
        UtilError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for UtilError {
    fn from(err: serde_yaml::Error) -> Self {
        UtilError::YamlError(err.to_string())
    }
}
