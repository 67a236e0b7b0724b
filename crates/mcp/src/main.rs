#![forbid(unsafe_code)]

mod entry;
mod handlers;
mod server;
mod support;

use rwm_core::tokens::ModelFamily;
use rwm_storage::SqliteStore;
use server::McpServer;
use std::path::PathBuf;

const DEFAULT_BUNDLE_TOKENS: usize = 4_500;

#[derive(Debug)]
struct Config {
    root: PathBuf,
    db_path: PathBuf,
    artifacts_dir: PathBuf,
    bundle_tokens: usize,
    model_family: ModelFamily,
}

fn parse_config() -> Config {
    let mut root: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut artifacts_dir: Option<PathBuf> = None;
    let mut bundle_tokens: Option<usize> = None;
    let mut model_family: Option<ModelFamily> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--root" => {
                if let Some(value) = args.next() {
                    root = Some(PathBuf::from(value));
                }
            }
            "--db" => {
                if let Some(value) = args.next() {
                    db_path = Some(PathBuf::from(value));
                }
            }
            "--artifacts" => {
                if let Some(value) = args.next() {
                    artifacts_dir = Some(PathBuf::from(value));
                }
            }
            "--bundleTokens" => {
                if let Some(value) = args.next() {
                    bundle_tokens = value.parse::<usize>().ok();
                }
            }
            "--modelFamily" => {
                if let Some(value) = args.next() {
                    model_family = ModelFamily::parse(&value);
                }
            }
            // Unknown flags are ignored so older launchers keep working.
            _ => {}
        }
    }

    let root = root.unwrap_or_else(|| PathBuf::from("."));
    let db_path = db_path.unwrap_or_else(|| root.join("rwm.db"));
    let artifacts_dir = artifacts_dir.unwrap_or_else(|| root.join("rwm_artifacts"));
    let bundle_tokens = bundle_tokens
        .or_else(|| {
            std::env::var("RWM_BUNDLE_TOKENS")
                .ok()
                .and_then(|raw| raw.parse::<usize>().ok())
        })
        .unwrap_or(DEFAULT_BUNDLE_TOKENS);

    Config {
        root,
        db_path,
        artifacts_dir,
        bundle_tokens,
        model_family: model_family.unwrap_or_default(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_config();
    let store = SqliteStore::open(&config.db_path, &config.root, &config.artifacts_dir)?;
    let mut server = McpServer::new(
        store,
        config.root.clone(),
        config.bundle_tokens,
        config.model_family,
    );
    entry::run_stdio(&mut server)
}
