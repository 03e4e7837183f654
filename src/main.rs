// Main entry point - Dependency injection and command dispatch
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use prtg_telemetry::application::entity_service::EntityService;
use prtg_telemetry::application::query_service::{QueryOptions, QueryService};
use prtg_telemetry::domain::query::{QueryDescriptor, TimeRange};
use prtg_telemetry::infrastructure::config::load_prtg_config;
use prtg_telemetry::infrastructure::prtg_repository::PrtgRepository;

const USAGE: &str = "usage: prtg-telemetry [status | groups | devices | sensors | channels <objid> [hours] | query]";

/// The `hours` before `to`.
fn lookback_range(hours: i64, to: DateTime<Utc>) -> anyhow::Result<TimeRange> {
    let from = Duration::try_hours(hours)
        .and_then(|span| to.checked_sub_signed(span))
        .with_context(|| format!("hours out of range: {}", hours))?;
    Ok(TimeRange::new(from, to))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = load_prtg_config()?;
    let server_offset = config.prtg.server_offset()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(PrtgRepository::from_config(&config)?);

    // Create services (application layer)
    let entity_service = EntityService::new(repository.clone());
    let query_service = QueryService::new(
        repository,
        QueryOptions {
            missing_values: config.query.missing_values,
            server_offset,
        },
    );

    // Ctrl-C abandons whatever request is in flight
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("query");

    let output = match command {
        "status" => serde_json::to_string_pretty(&entity_service.status(&cancel).await?)?,
        "groups" => serde_json::to_string_pretty(&entity_service.groups(&cancel).await?)?,
        "devices" => serde_json::to_string_pretty(&entity_service.devices(&cancel).await?)?,
        "sensors" => serde_json::to_string_pretty(&entity_service.sensors(&cancel).await?)?,
        "channels" => {
            let object_id = args.get(1).context(USAGE)?;
            let hours: i64 = match args.get(2) {
                Some(raw) => raw.parse().with_context(|| format!("invalid hours '{}'", raw))?,
                None => 24,
            };
            let range = lookback_range(hours, Utc::now())?;
            serde_json::to_string_pretty(&entity_service.channels(object_id, range, &cancel).await?)?
        }
        "query" => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            let descriptor: QueryDescriptor =
                serde_json::from_str(&input).context("query descriptor on stdin is not valid JSON")?;
            serde_json::to_string_pretty(&query_service.query(&descriptor, &cancel).await?)?
        }
        other => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    };

    println!("{}", output);
    Ok(())
}
