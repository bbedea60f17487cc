use std::sync::Arc;

use rocket::routes;
use serde::Deserialize;
use shared::backend::BackendClient;
use streetsweep_dashboard::feed::Context;
use streetsweep_dashboard::metrics::{ActionKind, Metrics};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    backend_url: String,
    backend_token: Option<String>,
    refresh_interval_seconds: Option<u64>,
}

#[rocket::get("/metrics")]
pub async fn metrics(
    state: &rocket::State<Context>,
) -> Option<(
    rocket::http::ContentType,
    rocket::response::content::RawHtml<String>,
)> {
    let body = state.metrics.encode().ok()?;
    Some((
        rocket::http::ContentType::new(
            "application/openmetrics-text",
            " version=1.0.0; charset=utf-8",
        ),
        rocket::response::content::RawHtml(body),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let metrics_registry: Arc<Metrics> = Default::default();
    let backend = BackendClient::new(env.backend_url, env.backend_token)?;
    let context = Context::new(backend, metrics_registry);

    tokio::select! {
        _ = run(context.clone(), env.refresh_interval_seconds.unwrap_or(60)) => {
        }
        _ = signal::ctrl_c() => {
            tracing::warn!("Received SIGINT. Exiting.");
        }
        _ = rocket::build()
            .mount("/", routes![metrics])
            .manage(context)
            .launch() => {

            }
    }
    tracing::warn!("Exiting dashboard...");

    Ok(())
}

async fn run(context: Context, refresh_interval_seconds: u64) {
    tracing::warn!("Starting dashboard feed...");

    let mut interval =
        tokio::time::interval(tokio::time::Duration::from_secs(refresh_interval_seconds));

    loop {
        interval.tick().await;

        if !context.backend.health().await {
            tracing::warn!("Backend is unhealthy, skipping refresh");
            context.metrics.record(ActionKind::Refresh, false);
            continue;
        }

        match context.refresh().await {
            Ok(stats) => {
                context.metrics.record(ActionKind::Refresh, true);
                let open = context.board.read().await.open_tickets(0, 5);
                for ticket in open {
                    tracing::debug!(
                        id = %ticket.id,
                        priority = %ticket.priority,
                        severity = ticket.severity_score(),
                        "open ticket"
                    );
                }
                tracing::info!(high_priority_open = stats.high_priority_open, "snapshot ready");
            }
            Err(error) => {
                context.metrics.record(ActionKind::Refresh, false);
                tracing::error!("Failed to refresh snapshot: {error:?}");
            }
        }
    }
}
