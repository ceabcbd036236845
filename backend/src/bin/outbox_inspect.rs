//! Inspect pending outbox records without delivering or deleting them.
//!
//! Without `--shard`, lists shards that have eligible records, oldest first.
//! With `--scope` and `--shard`, prints that shard's eligible records in
//! delivery order. Output is one JSON document per line.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use hybrid_cloud::domain::{OutboxScope, ShardKey};
use hybrid_cloud::outbound::persistence::run_pending_migrations;
use hybrid_cloud::telemetry::init_tracing;
use hybrid_cloud::{HybridCloudSettings, SiloServices};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::json;
use tokio::runtime::Builder;

/// `outbox-inspect` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "outbox-inspect",
    about = "List pending outbox shards or the records of one shard",
    version
)]
struct CliArgs {
    /// Shard scope: `organization_scope` or `user_scope`.
    #[arg(long, value_name = "scope", requires = "shard")]
    scope: Option<String>,
    /// Shard identifier (organization or user id).
    #[arg(long, value_name = "id", requires = "scope")]
    shard: Option<i64>,
    /// Maximum shards to list.
    #[arg(long, default_value_t = 100)]
    limit: u32,
    /// Apply pending migrations before reading.
    #[arg(long)]
    migrate: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(CliArgs::parse()))
}

async fn async_main(args: CliArgs) -> Result<()> {
    let settings = HybridCloudSettings::load_from_iter([OsString::from("outbox-inspect")])
        .map_err(|err| eyre!("load settings: {err}"))?;
    let Some(url) = settings.database_url().map(str::to_owned) else {
        return Err(eyre!("HYBRID_CLOUD_DATABASE_URL is not set"));
    };

    if args.migrate {
        tokio::task::spawn_blocking(move || run_pending_migrations(&url))
            .await
            .wrap_err("join migration task")??;
    }

    let services = SiloServices::from_settings(&settings, Arc::new(DefaultClock))
        .await
        .wrap_err("start silo services")?;
    let store = services.outbox();
    let now = Utc::now();
    let mut stdout = io::stdout().lock();

    match (args.scope, args.shard) {
        (Some(scope), Some(identifier)) => {
            let scope: OutboxScope = scope.parse()?;
            let records = store
                .drain(ShardKey::new(scope, identifier), now)
                .await
                .wrap_err("read shard")?;
            for record in records {
                writeln!(stdout, "{}", serde_json::to_string(&record)?)?;
            }
        }
        _ => {
            let shards = store
                .shards_with_pending(now, args.limit)
                .await
                .wrap_err("list pending shards")?;
            for shard in shards {
                let line = json!({"scope": shard.scope, "identifier": shard.identifier});
                writeln!(stdout, "{line}")?;
            }
        }
    }
    Ok(())
}
