//! Installed engine handling: binary discovery, launching, removal.

pub mod install;

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use glob::glob;
use log::{debug, info};

use crate::platform::Os;
use crate::version::GodotVersion;

/// Root directory where engine versions are installed by default.
pub fn default_install_root() -> Result<PathBuf> {
    let data = dirs::data_dir().ok_or_else(|| anyhow!("could not resolve the user data directory"))?;
    Ok(data.join("godotkit").join("engines"))
}

/// A locally installed engine version.
pub struct GodotEngine {
    pub version: GodotVersion,
    pub directory: PathBuf,
    pub binary: PathBuf,
}

impl GodotEngine {
    /// Binds to an install directory, locating the editor binary inside it.
    pub fn new(version: GodotVersion, directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        let binary = find_binary(&directory)?.ok_or_else(|| {
            anyhow!("cannot find a Godot binary in '{}'", directory.display())
        })?;
        debug!("Engine {} resolved to binary {:?}", version, binary);
        Ok(Self {
            version,
            directory,
            binary,
        })
    }

    /// Launches the editor detached from the current process.
    pub fn launch(&self) -> Result<()> {
        info!("Launching {:?}", self.binary);
        spawn_detached(Command::new(&self.binary))
    }

    /// Opens a project in the editor (`-e`, run from the project directory).
    pub fn launch_project(&self, project_dir: &Path) -> Result<()> {
        if !project_dir.is_dir() {
            bail!("'{}' is not a directory", project_dir.display());
        }
        info!("Launching {:?} on project {:?}", self.binary, project_dir);
        let mut command = Command::new(&self.binary);
        command.arg("-e").current_dir(project_dir);
        spawn_detached(command)
    }

    /// Opens the install directory in the native file manager.
    pub fn open_directory(&self) -> Result<()> {
        open_directory(&self.directory)
    }

    /// Recursively deletes the install directory.
    pub fn remove(self) -> Result<()> {
        remove_directory(&self.directory)
    }
}

/// Locates the editor binary inside an engine install directory.
///
/// Returns `Ok(None)` when the directory holds no recognizable binary; the
/// console companion shipped on some platforms is never picked.
pub fn find_binary(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        bail!("'{}' is not a valid directory", dir.display());
    }

    match Os::detect()? {
        Os::Windows => {
            for entry in glob(&dir.join("Godot*.exe").to_string_lossy())? {
                let path = entry?;
                if !path.to_string_lossy().to_lowercase().ends_with("console.exe") {
                    return Ok(Some(path.canonicalize()?));
                }
            }
            Ok(None)
        }
        Os::Linux => {
            for entry in glob(&dir.join("Godot*").to_string_lossy())? {
                let path = entry?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if path.is_file() && !name.contains("console") && is_executable(&path) {
                    return Ok(Some(path.canonicalize()?));
                }
            }
            Ok(None)
        }
        Os::MacOs => {
            for entry in glob(&dir.join("Godot*.app").to_string_lossy())? {
                let bundle = entry?;
                let binary = bundle.join("Contents").join("MacOS").join("Godot");
                if binary.is_file() {
                    return Ok(Some(binary.canonicalize()?));
                }
            }
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Opens a directory in the platform's native file manager.
pub fn open_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("'{}' is not a valid directory", dir.display());
    }
    let opener = match Os::detect()? {
        Os::Windows => "explorer",
        Os::MacOs => "open",
        Os::Linux => "xdg-open",
    };
    debug!("Opening {:?} with {}", dir, opener);
    let mut command = Command::new(opener);
    command.arg(dir);
    spawn_detached(command)
}

/// Recursively deletes a directory.
pub fn remove_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("'{}' is not a valid directory", dir.display());
    }
    std::fs::remove_dir_all(dir)
        .with_context(|| format!("failed to remove '{}'", dir.display()))?;
    info!("Removed {:?}", dir);
    Ok(())
}

/// Spawns a command detached so it outlives this process.
pub(crate) fn spawn_detached(mut command: Command) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let child = command
        .spawn()
        .with_context(|| format!("failed to spawn {:?}", command.get_program()))?;
    debug!("Spawned detached process {}", child.id());
    Ok(())
}
