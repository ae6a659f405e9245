//! Serve the demo blog admin backed by SQLite
//!
//! ```text
//! clarity-demo --seed --bind 127.0.0.1:8000 --database-url sqlite://demo.db
//! ```

use anyhow::Context;
use clap::Parser;
use clarity::admin::JsonRenderer;
use clarity::conf::Settings;
use clarity::conf::settings::DEFAULT_CONFIG_FILE;
use clarity::db::{ModelStore, SqliteStore};
use clarity::demo::{self, BlogModels};
use clarity::server::{init_logging, serve_until_signal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "clarity-demo", version, about = "Admin pages for a demo blog")]
struct Cli {
	/// Settings file; missing files are skipped
	#[arg(long, default_value = DEFAULT_CONFIG_FILE)]
	config: PathBuf,

	/// Address to listen on, overrides `server.bind_address`
	#[arg(long)]
	bind: Option<String>,

	/// SQLite URL, overrides `database.url`
	#[arg(long)]
	database_url: Option<String>,

	/// Insert sample rows on startup
	#[arg(long)]
	seed: bool,

	/// Log as JSON lines instead of human-readable text
	#[arg(long)]
	json_logs: bool,
}

impl Cli {
	fn settings(&self) -> anyhow::Result<Settings> {
		let mut builder = Settings::builder()
			.toml_file(&self.config)
			.dotenv_file(".env")
			.env();
		if let Some(bind) = &self.bind {
			builder = builder.set("server.bind_address", bind.as_str());
		}
		if let Some(url) = &self.database_url {
			builder = builder.set("database.url", url.as_str());
		}
		if self.json_logs {
			builder = builder.set("logging.format", "json");
		}
		builder.build().context("invalid settings")
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = cli.settings()?;
	init_logging(&settings.logging)?;

	let models = BlogModels::new();
	let store = SqliteStore::connect(&settings.database.url)
		.await
		.with_context(|| format!("cannot open {}", settings.database.url))?;
	for schema in models.all() {
		store.create_table(&schema).await?;
	}
	let store: Arc<dyn ModelStore> = Arc::new(store);
	if cli.seed {
		demo::seed(store.as_ref(), &models).await?;
	}

	let site = demo::site(&settings.admin.namespace, &models);
	let router = site.build_router(store, Arc::new(JsonRenderer), &settings.admin)?;

	let addr = settings.bind_address()?;
	tracing::info!(%addr, admin = %settings.admin.url_prefix, "starting clarity demo");
	serve_until_signal(
		addr,
		Arc::new(router),
		Duration::from_secs(settings.server.shutdown_timeout_secs),
	)
	.await?;
	Ok(())
}
