use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use pitchswipe::app::{App, BrowserShare};
use pitchswipe::config::Config;
use pitchswipe::engine::{EngineEvent, FeedEngine, Services, UserId};
use pitchswipe::storage::{Database, DatabaseError, Seed};
use pitchswipe::ui;

/// Largest seed file accepted by `--seed` (16 MB).
const MAX_SEED_SIZE: u64 = 16 * 1_048_576;

/// Get the config directory path (~/.config/pitchswipe/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("pitchswipe"))
}

#[derive(Parser, Debug)]
#[command(name = "pitchswipe", about = "Swipe through pitch videos in your terminal")]
struct Args {
    /// Config file (default: ~/.config/pitchswipe/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file (default: ~/.config/pitchswipe/pitchswipe.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Browse as this user (overrides `viewer_id` in the config)
    #[arg(long, value_name = "ID")]
    viewer: Option<String>,

    /// Import profiles and items from a JSON fixture before starting
    #[arg(long, value_name = "FILE")]
    seed: Option<PathBuf>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,
}

/// Log to a file; the terminal belongs to the TUI.
fn init_logging(config_dir: &Path) -> Result<()> {
    let log_path = config_dir.join("pitchswipe.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn read_seed(path: &Path) -> Result<Seed> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve seed file: {}", path.display()))?;
    let metadata = std::fs::metadata(&canonical)?;
    if !metadata.is_file() {
        anyhow::bail!("Seed path must be a regular file");
    }
    if metadata.len() > MAX_SEED_SIZE {
        anyhow::bail!(
            "Seed file is {} bytes (max {} bytes)",
            metadata.len(),
            MAX_SEED_SIZE
        );
    }
    let content = std::fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read seed file: {}", canonical.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid seed file: {}", canonical.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // SEC-007: user-only access to the config directory
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                eprintln!("Warning: could not restrict {}: {}", config_dir.display(), e);
            }
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(viewer) = args.viewer.clone() {
        config.viewer_id = viewer;
        config.validate().context("Invalid --viewer")?;
    }

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config_dir.join("pitchswipe.db"));

    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of pitchswipe appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if let Some(seed_path) = &args.seed {
        let seed = read_seed(seed_path)?;
        let (profiles, items) = db
            .import_seed(&seed)
            .await
            .context("Failed to import seed data")?;
        println!("Imported {} profiles and {} new items", profiles, items);
    }

    let viewer = UserId::new(config.viewer_id.as_str());
    tracing::info!(viewer = %viewer, db = %db_path.display(), "Starting pitchswipe");

    let services = Services::from_backend(Arc::new(db)).with_share(Arc::new(BrowserShare));
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(32);
    let mut engine = FeedEngine::new(viewer, config.engine_settings(), services, event_tx);
    engine.refresh();

    let mut app = App::new(engine);
    ui::run(&mut app, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
