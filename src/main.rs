//! Cookie-sticky A/B split between two upstream HTML variants.
//!
//! Every request discovers two variant URLs, fetches both pages and serves
//! one of them rebranded as "Yin" or "Yang". The client's side of the split
//! is kept in a 30-day cookie.

mod config;
mod health;
mod server;
mod split;

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::split::{HttpFetcher, SplitGateway};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("loading configuration")?;

    let fetcher = HttpFetcher::new(config.upstream_timeout).context("building http client")?;
    let gateway = Arc::new(SplitGateway::new(
        Arc::new(fetcher),
        config.discovery_url.clone(),
    ));

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    let health_listener = TcpListener::bind(config.health_addr)
        .await
        .with_context(|| format!("binding {}", config.health_addr))?;

    tracing::info!(
        listen = %config.listen_addr,
        health = %config.health_addr,
        discovery = %config.discovery_url,
        "yinyang-split starting"
    );

    let split = server::serve(listener, move |req| {
        let gateway = Arc::clone(&gateway);
        async move {
            let response = gateway.handle(&req);
            Ok::<_, Infallible>(response.await)
        }
    });

    tokio::select! {
        res = split => res.context("split listener failed")?,
        res = health::start_health_server(health_listener) => {
            res.context("health listener failed")?
        }
    }

    Ok(())
}
