use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CloneError;

pub const CONTENT_DIR: &str = "content";
pub const INDEX_FILE: &str = "index.html";

/// Owns `<output>/cloned-<timestamp>/` and its `content/` subdirectory.
#[derive(Debug, Clone)]
pub struct FileManager {
    root: PathBuf,
}

impl FileManager {
    pub fn new(output_dir: &Path, started: DateTime<Local>) -> Result<Self, CloneError> {
        let root = output_dir.join(format!("cloned-{}", started.format("%Y-%m-%d-%H-%M-%S")));

        fs::create_dir_all(output_dir).map_err(|source| CloneError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        // A run folder that already exists belongs to another run.
        for dir in [root.clone(), root.join(CONTENT_DIR)] {
            fs::create_dir(&dir).map_err(|source| CloneError::CreateDir { path: dir, source })?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a fetched resource under its `content/content<i><ext>` name.
    pub fn save_content(&self, local_name: &str, content: &[u8]) -> Result<PathBuf, CloneError> {
        let mut path = self.root.clone();
        for segment in local_name.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        write_file(path, content)
    }

    pub fn save_index(&self, content: &[u8]) -> Result<PathBuf, CloneError> {
        write_file(self.root.join(INDEX_FILE), content)
    }
}

fn write_file(path: PathBuf, content: &[u8]) -> Result<PathBuf, CloneError> {
    let written = fs::File::create(&path).and_then(|mut file| file.write_all(content));
    match written {
        Ok(()) => Ok(path),
        Err(source) => Err(CloneError::WriteFile { path, source }),
    }
}
