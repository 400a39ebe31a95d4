mod app;
mod domain;
mod store;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;

use app::App;
use domain::task::Task;
use store::appwrite::{AppwriteConfig, AppwriteStore};
use store::local::LocalStore;
use store::memory::MemoryStore;
use store::{Readiness, TaskStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "tana — minimal two-backend todo TUI", long_about = None)]
struct Args {
    /// Tick interval of render loop in milliseconds
    #[arg(long, default_value_t = 120)]
    tick_ms: u64,

    /// Start with demo tasks
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Use in-memory store instead of the local task file
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Path to the local task file (default: OS data dir)
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Use the hosted document-store backend
    #[arg(long, default_value_t = false)]
    remote: bool,

    /// Document-store API base, e.g. https://fra.cloud.appwrite.io/v1
    /// (env fallback: APPWRITE_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Project id on the document store (env fallback: APPWRITE_PROJECT)
    #[arg(long)]
    project: Option<String>,

    /// Database id holding the task collection (env fallback: APPWRITE_DATABASE)
    #[arg(long)]
    database: Option<String>,

    /// Collection id of the task documents (env fallback: APPWRITE_COLLECTION)
    #[arg(long)]
    collection: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let store: Box<dyn TaskStore> = if args.remote {
        Box::new(AppwriteStore::connect(remote_config(&args)?)?)
    } else if args.demo {
        Box::new(MemoryStore::with_seed(seed_tasks()))
    } else if args.memory {
        Box::new(MemoryStore::default())
    } else if let Some(path) = args.store_path.as_ref() {
        Box::new(LocalStore::open(path)?)
    } else {
        Box::new(LocalStore::open_default()?)
    };

    let mut app = App::new(store);
    if app.readiness() == Readiness::Loading {
        app.set_status("Fetching tasks from the backend...");
    }
    ui::run(app, Duration::from_millis(args.tick_ms))
}

fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new("Buy milk"),
        Task::new("Write documentation"),
        Task::new("Draft release notes"),
    ]
}

fn remote_config(args: &Args) -> Result<AppwriteConfig> {
    Ok(AppwriteConfig {
        endpoint: setting(args.endpoint.as_deref(), "APPWRITE_ENDPOINT")?,
        project: setting(args.project.as_deref(), "APPWRITE_PROJECT")?,
        database_id: setting(args.database.as_deref(), "APPWRITE_DATABASE")?,
        collection_id: setting(args.collection.as_deref(), "APPWRITE_COLLECTION")?,
        api_key: optional_env("APPWRITE_API_KEY"),
    })
}

/// Flag first, env second; both trimmed, blank rejected.
fn setting(flag: Option<&str>, env_name: &str) -> Result<String> {
    if let Some(value) = flag {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    let raw = std::env::var(env_name)
        .map_err(|_| anyhow!("{env_name} is required for --remote (flag or env)"))?;
    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        return Err(anyhow!("{env_name} is empty after trimming; please re-export"));
    }
    Ok(trimmed)
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
