use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use godotkit::catalog::{FetchOptions, ReleaseFetcher, SortBy};
use godotkit::engine::{self, GodotEngine, install};
use godotkit::http::HttpClient;
use godotkit::platform::{Arch, Os};
use godotkit::project::{GodotProject, ProjectPatch};
use godotkit::version::GodotVersion;

/// godotkit - Godot Engine toolkit
///
/// List, download, and launch Godot Engine releases, and manage
/// project.godot descriptors.
///
/// Examples:
///   godotkit releases --max 10
///   godotkit download 4.1.1 --csharp
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List engine releases
    Releases(ReleasesArgs),

    /// Download and install an engine release
    Download(DownloadArgs),

    /// Launch an installed engine
    Launch(LaunchArgs),

    /// Inspect or edit a project descriptor
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(clap::Args, Debug)]
struct ReleasesArgs {
    /// Include prereleases from the all-builds listing
    #[arg(long)]
    all: bool,

    /// Sort order: "version" or "date"
    #[arg(long, default_value = "version")]
    sort: String,

    /// Maximum number of releases to list
    #[arg(long, value_name = "N")]
    max: Option<usize>,

    /// Only list releases with a download for this machine
    #[arg(long = "platform-only")]
    platform_only: bool,
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    /// Release tag, e.g. "4.1.1-stable" (a bare version implies -stable)
    version: String,

    /// Pick the C#/.NET build
    #[arg(long)]
    csharp: bool,

    /// Target OS (defaults to this machine)
    #[arg(long, value_name = "OS")]
    os: Option<String>,

    /// Target architecture (defaults to this machine)
    #[arg(long, value_name = "ARCH")]
    arch: Option<String>,

    /// Install root; the engine lands in <ROOT>/<tag> (defaults to the user
    /// data directory; also via GODOTKIT_ROOT)
    #[arg(long, env = "GODOTKIT_ROOT", value_name = "PATH")]
    root: Option<PathBuf>,

    /// Overwrite files already present in the destination
    #[arg(long)]
    overwrite: bool,
}

#[derive(clap::Args, Debug)]
struct LaunchArgs {
    /// Directory of an installed engine
    engine_dir: PathBuf,

    /// Open this project.godot file in the editor
    #[arg(long, value_name = "PROJECT_FILE")]
    project: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum ProjectCommands {
    /// Print project metadata
    Show(ProjectShowArgs),

    /// Update project metadata
    Set(ProjectSetArgs),
}

#[derive(clap::Args, Debug)]
struct ProjectShowArgs {
    /// Path to a project.godot file
    project_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ProjectSetArgs {
    /// Path to a project.godot file
    project_file: PathBuf,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Project version, e.g. "1.2.0"
    #[arg(long)]
    version: Option<String>,

    /// Comma-separated tag list
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,

    /// Engine version for the .godot-version marker, e.g. "4.1.1"
    #[arg(long = "engine-version", value_name = "VERSION")]
    engine_version: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Releases(args) => releases(args).await,
        Commands::Download(args) => download(args).await,
        Commands::Launch(args) => launch(args),
        Commands::Project(ProjectCommands::Show(args)) => project_show(args),
        Commands::Project(ProjectCommands::Set(args)) => project_set(args),
    }
}

async fn releases(args: ReleasesArgs) -> Result<()> {
    let sort_by: SortBy = args.sort.parse()?;
    let mut fetcher = ReleaseFetcher::new()?;
    let options = FetchOptions {
        stable_only: !args.all,
        sort_by,
        max_releases: args.max,
        platform_only: args.platform_only,
        refresh_cache: false,
    };

    for release in fetcher.fetch_releases(&options).await? {
        println!(
            "{:<24} {}  ({} assets)",
            release.version,
            release.published_at.format("%Y-%m-%d"),
            release.assets.len()
        );
    }
    Ok(())
}

async fn download(args: DownloadArgs) -> Result<()> {
    let tag = if args.version.contains('-') {
        args.version.clone()
    } else {
        format!("{}-stable", args.version)
    };
    let stable_only = tag.ends_with("-stable");

    let os = args.os.as_deref().map(str::parse::<Os>).transpose()?;
    let arch = args.arch.as_deref().map(str::parse::<Arch>).transpose()?;

    let mut fetcher = ReleaseFetcher::new()?;
    fetcher
        .fetch_releases(&FetchOptions {
            stable_only,
            ..Default::default()
        })
        .await?;
    let url = fetcher.get_download_url(&tag, os, arch, args.csharp)?;

    let root = match args.root {
        Some(root) => root,
        None => engine::default_install_root()?,
    };
    let dest = root.join(&tag);

    let http = HttpClient::new(Duration::from_secs(godotkit::RELEASE_DOWNLOAD_TIMEOUT_SECS))?;
    println!("Downloading {url}");
    let progress: &godotkit::http::ProgressFn<'_> = &|done, total| match total {
        Some(total) => eprint!("\r{:.1} / {:.1} MB", mb(done), mb(total)),
        None => eprint!("\r{:.1} MB", mb(done)),
    };
    install::download_and_extract(&http, &url, &dest, args.overwrite, Some(progress)).await?;
    eprintln!();

    println!("Installed {} into {}", tag, dest.display());
    Ok(())
}

fn launch(args: LaunchArgs) -> Result<()> {
    // The install directory is named after the tag; fall back to a blank
    // version when it does not parse.
    let version = args
        .engine_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .and_then(|name| name.trim_end_matches("-stable").parse::<GodotVersion>().ok())
        .unwrap_or_else(GodotVersion::lowest);
    let engine = GodotEngine::new(version, &args.engine_dir)?;

    match args.project {
        Some(project_file) => GodotProject::new(project_file)?.launch(&engine.binary),
        None => engine.launch(),
    }
}

fn project_show(args: ProjectShowArgs) -> Result<()> {
    let metadata = godotkit::project::read(&args.project_file)?;

    println!("Name:        {}", metadata.name);
    println!("Description: {}", metadata.description);
    if let Some(version) = &metadata.version {
        println!("Version:     {version}");
    }
    if let Some(tags) = &metadata.tags {
        println!("Tags:        {}", tags.join(", "));
    }
    if let Some(compat) = &metadata.compatibility_version {
        println!("Compat:      {compat}");
    }
    if let Some(engine) = &metadata.engine_version {
        println!("Engine:      {engine}");
    }
    if let Some(icon) = &metadata.icon_path {
        println!("Icon:        {}", icon.display());
    }
    println!("Directory:   {}", metadata.dir_path.display());
    Ok(())
}

fn project_set(args: ProjectSetArgs) -> Result<()> {
    let engine_version = args
        .engine_version
        .as_deref()
        .map(str::parse::<GodotVersion>)
        .transpose()
        .context("invalid --engine-version")?;
    let tags = args
        .tags
        .map(|raw| raw.split(',').map(|tag| tag.trim().to_string()).collect());

    let patch = ProjectPatch {
        name: args.name,
        description: args.description,
        version: args.version,
        tags,
        compatibility_version: engine_version
            .as_ref()
            .filter(|version| version.major >= 4)
            .map(GodotVersion::major_minor),
        icon_path: None,
        engine_version,
    };

    let mut project = GodotProject::new(&args.project_file)?;
    project.apply(&patch)?;
    println!("Updated {}", args.project_file.display());
    Ok(())
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
