use anyhow::Context;
use clap::Parser;
use filecache_core::{CacheConfig, CliOverrides, Container, ProjectCacheKey};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default configuration file looked up in the current directory
const DEFAULT_CONFIG_FILE: &str = "filecache.yaml";

/// filecache - report which files changed since the last analysis run
#[derive(Parser, Debug, Clone)]
#[command(name = "filecache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to check for changes
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Project root the cache is kept for (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Directory holding cache files (overrides FILECACHE_DIR)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Path to a filecache.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Discard the stored cache and treat every file as changed
    #[arg(long)]
    flush: bool,

    /// Report changes without recording this run
    #[arg(long)]
    dry_run: bool,

    /// Delete this project's cache file and exit
    #[arg(long)]
    clear: bool,

    /// Print the changed files as a JSON array
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the changed files
    // Set RUST_LOG=debug for detailed logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let container = Container::new(config);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let project = cli.project.clone().unwrap_or_else(|| cwd.clone());
    let project = project
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", project.display()))?;

    if cli.clear {
        return clear_project(&container, &project);
    }

    let files: Vec<PathBuf> = cli.files.iter().map(|f| absolutize(&cwd, f)).collect();
    debug!("Checking {} file(s) in {:?}", files.len(), project);

    let mut cache = container
        .open_project(&project, false)
        .context("Failed to open file cache")?;
    let changed = cache
        .compute_changed(&files)
        .context("Failed to check files for changes")?;

    if cli.json {
        println!("{}", serde_json::to_string(&changed)?);
    } else {
        for file in &changed {
            println!("{}", file.display());
        }
    }

    info!("{} of {} file(s) changed", changed.len(), files.len());

    if cli.dry_run {
        debug!("Dry run, cache not updated");
    } else {
        cache.commit().context("Failed to save file cache")?;
    }

    Ok(())
}

/// Load configuration from file (if any) and apply command line overrides
fn load_config(cli: &Cli) -> anyhow::Result<CacheConfig> {
    let mut config = if let Some(ref path) = cli.config {
        CacheConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            CacheConfig::from_file(&default_path)
                .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?
        } else {
            CacheConfig::from_env()
        }
    };

    config.merge_cli(&CliOverrides {
        cache_dir: cli.cache_dir.clone(),
        flush_cache: cli.flush.then_some(true),
    });

    Ok(config)
}

fn clear_project(container: &Container, project: &Path) -> anyhow::Result<()> {
    let store = container.open_store().context("Failed to open cache store")?;
    let key = ProjectCacheKey::from_project_dir(project)?;

    if !store.delete_all(&[key.as_str()]) {
        anyhow::bail!("Failed to clear the cache of {}", project.display());
    }

    println!("Cleared cache for {}", project.display());
    Ok(())
}

fn absolutize(cwd: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    }
}
