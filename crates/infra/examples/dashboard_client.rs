//! Example: Talking to the SMSDesk backend from a dashboard tool
//!
//! Loads configuration (environment first, then `smsdesk.json`/`.toml`),
//! attaches a request observer, and lists campaigns for the configured shop.
//!
//! # Setup
//!
//! ```bash
//! export SMSDESK_API_BASE_URL=http://localhost:8787
//! export SMSDESK_SHOP=my-store.myshopify.com
//! export SMSDESK_TOKEN=dev-session-token
//! cargo run -p smsdesk-infra --example dashboard_client
//! ```

use std::sync::Arc;

use anyhow::Context;
use smsdesk_domain::types::CampaignFilter;
use smsdesk_infra::api::{
    ApiClient, ApiClientConfig, ApiCommands, AppEvent, EventBus, RequestObserver,
    StaticTokenProvider,
};
use smsdesk_infra::{config, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::load().context("loading client configuration")?;
    observability::logging::init(&settings.logging);

    let token = std::env::var("SMSDESK_TOKEN").unwrap_or_default();
    let client = ApiClient::builder()
        .config(ApiClientConfig::from(&settings))
        .auth(Arc::new(StaticTokenProvider::new(token)))
        .build()
        .context("building API client")?;

    let mut events = EventBus::global().subscribe();
    tokio::spawn(async move {
        while let Ok(AppEvent::ApiError { message }) = events.recv().await {
            tracing::warn!(%message, "api-error");
        }
    });

    let observer = Arc::new(RequestObserver::new());
    let commands = ApiCommands::new(Arc::new(client)).with_observer(Arc::clone(&observer));

    let health = commands.health_check().await.context("health check")?;
    tracing::info!(status = %health.status, "backend reachable");

    match commands.list_campaigns(&CampaignFilter::default()).await {
        Ok(page) => {
            for campaign in &page.items {
                tracing::info!(id = %campaign.id, name = %campaign.name, status = %campaign.status, "campaign");
            }
        }
        Err(err) => {
            let entry = err.taxonomy_entry();
            tracing::error!(title = entry.title, action = entry.action, "listing campaigns failed");
        }
    }

    for key in observer.metrics().endpoints() {
        if let Some(metrics) = observer.metrics().get(&key.endpoint, &key.method) {
            tracing::info!(
                endpoint = %key.endpoint,
                method = %key.method,
                calls = metrics.total(),
                failures = metrics.failures(),
                p95_ms = metrics.p95_ms().unwrap_or_default(),
                "endpoint latency"
            );
        }
    }

    Ok(())
}
