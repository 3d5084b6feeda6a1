use std::sync::Arc;

use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use bookshelf_backend::mailer::{EmailTemplates, InMemoryMailer, Mailer, ResendMailer};
use bookshelf_backend::server::{start_server, BackendState};
use bookshelf_backend::settings::BackendSettings;

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() {
    let app_name = "bookshelf_backend";

    // Start a new Jaeger trace pipeline.
    // Spans are exported in batch - recommended setup for a production application.
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)
        .expect("Failed to install OpenTelemetry tracer.");

    // Filter based on level - trace, debug, info, warn, error
    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to install `tracing` subscriber.")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let settings = BackendSettings::load().context("Failed to load settings")?;

    let mailer: Arc<dyn Mailer> = match settings.resend_api_key.clone() {
        Some(api_key) => Arc::new(ResendMailer::new(api_key)?),
        None => {
            tracing::warn!("RESEND_API_KEY not set, emails are kept in memory");
            Arc::new(InMemoryMailer::default())
        }
    };
    let state = BackendState::in_memory(
        mailer,
        EmailTemplates::new(&settings.email_from, &settings.app_url),
    );

    let (server, address) = start_server(state, (settings.host.as_str(), settings.port))?;
    tracing::info!("starting backend HTTP server at http://{}", address);

    server.await.context("Backend server failed")
}
