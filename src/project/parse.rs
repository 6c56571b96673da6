//! Reading, patching, and scaffolding `project.godot` descriptors.
//!
//! The descriptor is an INI-style file edited line by line rather than
//! through a full INI model: only known keys are touched and every other
//! line is carried through byte for byte. Rewrites go through a temp file
//! in the same directory followed by an atomic rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use regex::Regex;

use crate::version::GodotVersion;

/// Marker file next to `project.godot` naming the engine version in use.
pub const ENGINE_VERSION_FILE: &str = ".godot-version";

pub const GODOT_FILE_HEADER: &str = "; Engine configuration file.
; It's best edited using the editor UI and not directly,
; since the parameters that go here are not all obvious.
;
; Format:
;   [section] ; section goes between []
;   param=value ; assign values to parameters
";

static FEATURES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"PackedStringArray\("([^"]+)"\)"#).unwrap());
static TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PackedStringArray\((.*?)\)").unwrap());

/// Metadata extracted from a project descriptor and its sibling files.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetadata {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Absolute path to the icon, if configured and present on disk.
    pub icon_path: Option<PathBuf>,
    /// From the sibling `.godot-version` file.
    pub engine_version: Option<GodotVersion>,
    /// The `config/features` compatibility tag, e.g. `"4.1"`.
    pub compatibility_version: Option<String>,
    pub file_path: PathBuf,
    pub dir_path: PathBuf,
}

/// Field-level patch for [`apply`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub tags: Option<Vec<String>>,
    pub compatibility_version: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub engine_version: Option<GodotVersion>,
}

/// Options for [`create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<PathBuf>,
    pub engine_version: Option<GodotVersion>,
    /// Only written for 4.x projects, alongside the feature tag.
    pub tags: Option<Vec<String>>,
}

fn unquote(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Parses a `project.godot` file and its sibling engine-version marker.
pub fn read(project_path: &Path) -> Result<ProjectMetadata> {
    debug!("Parsing project descriptor {:?}", project_path);
    if !project_path.is_file() {
        bail!("project file not found: '{}'", project_path.display());
    }
    let project_dir = project_path
        .parent()
        .ok_or_else(|| anyhow!("project file has no parent directory"))?;

    let mut name = "Unnamed Project".to_string();
    let mut description = "No description provided.".to_string();
    let mut version = None;
    let mut icon_res = None;
    let mut compatibility_version = None;
    let mut tags: Option<Vec<String>> = None;
    let mut in_application = false;

    let content = fs::read_to_string(project_path)
        .with_context(|| format!("failed to read '{}'", project_path.display()))?;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_application = line == "[application]";
            continue;
        }
        if !in_application {
            continue;
        }

        if let Some(rest) = line.strip_prefix("config/name=") {
            name = unquote(rest);
        } else if let Some(rest) = line.strip_prefix("config/version=") {
            version = Some(unquote(rest));
        } else if let Some(rest) = line.strip_prefix("config/description=") {
            description = unquote(rest);
        } else if let Some(rest) = line.strip_prefix("config/icon=") {
            icon_res = Some(unquote(rest));
        } else if line.starts_with("config/features=") {
            if let Some(caps) = FEATURES_RE.captures(line) {
                compatibility_version = Some(caps[1].to_string());
            }
        } else if line.starts_with("config/tags=") {
            tags = TAGS_RE
                .captures(line)
                .map(|caps| caps[1].split(',').map(|tag| unquote(tag)).collect());
        }
    }

    let icon_path = icon_res.and_then(|res| {
        let absolute = project_dir.join(res.trim_start_matches("res://"));
        if absolute.exists() {
            Some(absolute)
        } else {
            warn!("Configured icon '{}' does not exist at {:?}", res, absolute);
            None
        }
    });

    let version_file = project_dir.join(ENGINE_VERSION_FILE);
    let engine_version = if version_file.is_file() {
        let raw = fs::read_to_string(&version_file)?;
        Some(raw.trim().parse::<GodotVersion>().with_context(|| {
            format!("invalid engine version in '{}'", version_file.display())
        })?)
    } else {
        None
    };

    Ok(ProjectMetadata {
        name,
        description,
        version,
        tags,
        icon_path,
        engine_version,
        compatibility_version,
        file_path: project_path.canonicalize()?,
        dir_path: project_dir.canonicalize()?,
    })
}

/// Applies a patch, rewriting only the descriptor keys whose values changed.
pub fn apply(project_path: &Path, patch: &ProjectPatch) -> Result<()> {
    let current = read(project_path)?;

    let mut updates: Vec<(&str, String)> = Vec::new();
    if let Some(name) = &patch.name
        && *name != current.name
    {
        updates.push(("config/name=", format!("config/name=\"{name}\"\n")));
    }
    if let Some(description) = &patch.description
        && *description != current.description
    {
        updates.push((
            "config/description=",
            format!("config/description=\"{description}\"\n"),
        ));
    }
    if let Some(version) = &patch.version
        && patch.version != current.version
    {
        updates.push(("config/version=", format!("config/version=\"{version}\"\n")));
    }
    if let Some(tags) = &patch.tags
        && patch.tags != current.tags
    {
        updates.push((
            "config/tags=",
            format!("config/tags=PackedStringArray({})\n", tag_array(tags)),
        ));
    }
    if let Some(compat) = &patch.compatibility_version
        && patch.compatibility_version != current.compatibility_version
    {
        updates.push((
            "config/features=",
            format!("config/features=PackedStringArray(\"{compat}\")\n"),
        ));
    }

    if !updates.is_empty() {
        let content = fs::read_to_string(project_path)?;
        let mut out = String::with_capacity(content.len());
        for line in content.lines() {
            match updates
                .iter()
                .find(|(prefix, _)| line.trim_start().starts_with(prefix))
            {
                Some((_, replacement)) => out.push_str(replacement),
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        replace_file(project_path, &out)?;
    }

    if let Some(icon) = &patch.icon_path
        && patch.icon_path != current.icon_path
    {
        set_project_icon(project_path, icon)?;
    }
    if let Some(engine) = &patch.engine_version
        && patch.engine_version != current.engine_version
    {
        set_engine_version(project_path, engine)?;
    }

    Ok(())
}

/// Sets one key in one section, appending the key (and the section when
/// absent) if it does not exist yet. `value` is written verbatim as the
/// right-hand side.
pub fn write_property(project_path: &Path, section: &str, key: &str, value: &str) -> Result<()> {
    if !project_path.is_file() {
        bail!("project file not found: '{}'", project_path.display());
    }

    let content = fs::read_to_string(project_path)?;
    let header = format!("[{section}]");
    let key_prefix = format!("{key}=");
    let formatted = format!("{key}={value}\n");

    let mut out = String::with_capacity(content.len());
    let mut inside = false;
    let mut written = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            // Leaving the target section without a hit: insert before the
            // next header.
            if inside && !written {
                out.push_str(&formatted);
                written = true;
            }
            inside = trimmed == header;
            out.push_str(line);
            out.push('\n');
            continue;
        }

        if inside && !written && trimmed.starts_with(&key_prefix) {
            out.push_str(&formatted);
            written = true;
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !written {
        if !inside {
            out.push('\n');
            out.push_str(&header);
            out.push('\n');
        }
        out.push_str(&formatted);
    }

    replace_file(project_path, &out)
}

/// Writes the sibling `.godot-version` marker.
pub fn set_engine_version(project_path: &Path, engine_version: &GodotVersion) -> Result<()> {
    if !project_path.is_file() {
        bail!("project file not found: '{}'", project_path.display());
    }
    let version_file = project_path
        .parent()
        .ok_or_else(|| anyhow!("project file has no parent directory"))?
        .join(ENGINE_VERSION_FILE);
    fs::write(&version_file, engine_version.to_string())
        .with_context(|| format!("failed to write '{}'", version_file.display()))?;
    Ok(())
}

/// Copies an icon into the project directory as `icon.<ext>`, removes any
/// previous `icon.*`, and points `config/icon` at it.
pub fn set_project_icon(project_path: &Path, icon_path: &Path) -> Result<()> {
    if !project_path.is_file() {
        bail!("project file not found: '{}'", project_path.display());
    }
    if !icon_path.is_file() {
        bail!("icon file not found: '{}'", icon_path.display());
    }

    let project_dir = project_path
        .parent()
        .ok_or_else(|| anyhow!("project file has no parent directory"))?;
    let extension = icon_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let icon_name = format!("icon{extension}");
    let destination = project_dir.join(&icon_name);

    for stale in glob::glob(&project_dir.join("icon.*").to_string_lossy())? {
        let stale = stale?;
        if stale.is_file() && stale != destination {
            fs::remove_file(&stale)?;
        }
    }
    fs::copy(icon_path, &destination)
        .with_context(|| format!("failed to copy icon to '{}'", destination.display()))?;

    write_property(
        project_path,
        "application",
        "config/icon",
        &format!("\"res://{icon_name}\""),
    )
}

/// Scaffolds a new project. Returns the path to the created descriptor.
pub fn create(project_dir: &Path, options: &CreateOptions) -> Result<PathBuf> {
    info!("Creating new project at {:?}", project_dir);
    fs::create_dir_all(project_dir)
        .with_context(|| format!("failed to create '{}'", project_dir.display()))?;
    fs::create_dir_all(project_dir.join("addons"))?;

    let mut icon_name = None;
    if let Some(icon) = &options.icon_path
        && icon.is_file()
    {
        let extension = icon
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let name = format!("icon{extension}");
        fs::copy(icon, project_dir.join(&name))?;
        icon_name = Some(name);
    }

    let mut content = String::new();
    content.push_str(GODOT_FILE_HEADER);
    content.push_str("\n\n[application]\n\n");
    content.push_str(&format!("config/name=\"{}\"\n", options.name));
    content.push_str("config/version=\"0.1.0\"\n");
    let description = options
        .description
        .as_deref()
        .unwrap_or("A new Godot project.");
    content.push_str(&format!("config/description=\"{description}\"\n"));

    // Feature and tag keys only exist in the 4.x descriptor dialect.
    if let Some(engine) = &options.engine_version
        && engine.major >= 4
    {
        content.push_str(&format!(
            "config/features=PackedStringArray(\"{}\")\n",
            engine.major_minor()
        ));
        if let Some(tags) = &options.tags {
            content.push_str(&format!(
                "config/tags=PackedStringArray({})\n",
                tag_array(tags)
            ));
        }
    }
    if let Some(name) = &icon_name {
        content.push_str(&format!("config/icon=\"res://{name}\"\n"));
    }
    content.push('\n');

    let project_file = project_dir.join("project.godot");
    fs::write(&project_file, content)
        .with_context(|| format!("failed to write '{}'", project_file.display()))?;

    if let Some(engine) = &options.engine_version {
        fs::write(project_dir.join(ENGINE_VERSION_FILE), engine.to_string())?;
    }

    info!("Successfully created project at {:?}", project_dir);
    Ok(project_file)
}

fn tag_array(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("\"{tag}\""))
        .collect::<Vec<_>>()
        .join(",")
}

fn replace_file(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("'{}' has no parent directory", path.display()))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .context("failed to create a temporary descriptor file")?;
    temp.write_all(content.as_bytes())?;
    temp.persist(path)
        .with_context(|| format!("failed to replace '{}'", path.display()))?;
    Ok(())
}
