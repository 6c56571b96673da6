//! Project descriptors and the project handle built on top of them.

pub mod parse;

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, bail};
use log::info;

pub use parse::{
    CreateOptions, ENGINE_VERSION_FILE, ProjectMetadata, ProjectPatch, create, read,
    write_property,
};

use crate::engine;

/// A handle to a project on disk: the descriptor path plus the metadata read
/// from it. Metadata is a snapshot; [`GodotProject::reload`] refreshes it.
pub struct GodotProject {
    file_path: PathBuf,
    pub metadata: ProjectMetadata,
}

impl GodotProject {
    /// Binds to an existing `project.godot` file.
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let metadata = parse::read(&file_path)?;
        Ok(Self {
            file_path,
            metadata,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn dir_path(&self) -> &Path {
        &self.metadata.dir_path
    }

    /// Re-reads the descriptor from disk.
    pub fn reload(&mut self) -> Result<()> {
        self.metadata = parse::read(&self.file_path)?;
        Ok(())
    }

    /// Applies a patch to the descriptor and refreshes the snapshot.
    pub fn apply(&mut self, patch: &ProjectPatch) -> Result<()> {
        parse::apply(&self.file_path, patch)?;
        self.reload()
    }

    /// Opens this project in the editor of the given engine binary.
    pub fn launch(&self, binary: &Path) -> Result<()> {
        if !binary.is_file() {
            bail!("'{}' is not a valid binary", binary.display());
        }
        info!("Launching {:?} on project {:?}", binary, self.file_path);
        let mut command = Command::new(binary);
        command.arg("-e").current_dir(self.dir_path());
        engine::spawn_detached(command)
    }

    /// Opens the project directory in the native file manager.
    pub fn open_directory(&self) -> Result<()> {
        engine::open_directory(self.dir_path())
    }

    /// Recursively deletes the project directory.
    pub fn remove(self) -> Result<()> {
        engine::remove_directory(&self.metadata.dir_path)
    }
}
