/*! Prometheus metrics.

Counters are created against an explicit [Registry] and handed to the pipelines,
so that pipelines can be run (and tested) without any collector.
[serve] exposes a registry on `GET /metrics`.
!*/
use axum::{extract::State, http::header, http::StatusCode, routing::get, Router};
use log::{error, info};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use tokio::{net::TcpListener, task::JoinHandle};

use crate::error::Error;

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, Error> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

/// Batcher counters.
#[derive(Clone)]
pub struct BatcherMetrics {
    /// Batches successfully handed to the broker.
    pub batches: IntCounter,
    pub total_documents: IntCounter,
    pub non_english: IntCounter,
    pub non_ok: IntCounter,
    pub passed_filter: IntCounter,
}

impl BatcherMetrics {
    pub fn register(registry: &Registry) -> Result<Self, Error> {
        Ok(Self {
            batches: counter(registry, "batcher_batches", "Number of published batches")?,
            total_documents: counter(
                registry,
                "batcher_total_documents",
                "Total documents processed by the batcher",
            )?,
            non_english: counter(
                registry,
                "batcher_non_english_documents",
                "Documents filtered out for not being English",
            )?,
            non_ok: counter(
                registry,
                "batcher_non_200_documents",
                "Documents filtered out for not having status 200",
            )?,
            passed_filter: counter(
                registry,
                "batcher_passed_filter_documents",
                "Documents that passed all filters",
            )?,
        })
    }
}

/// Worker counters.
#[derive(Clone)]
pub struct WorkerMetrics {
    /// Batches fully processed (and then acknowledged).
    pub batches: IntCounter,
    pub entries_received: IntCounter,
    pub extracted: IntCounter,
    pub extraction_errors: IntCounter,
}

impl WorkerMetrics {
    pub fn register(registry: &Registry) -> Result<Self, Error> {
        Ok(Self {
            batches: counter(registry, "worker_batches", "Number of consumed batches")?,
            entries_received: counter(
                registry,
                "worker_entries_received",
                "Number of locators received inside batches",
            )?,
            extracted: counter(
                registry,
                "worker_documents_extracted",
                "Number of documents whose text has been extracted",
            )?,
            extraction_errors: counter(
                registry,
                "worker_extraction_errors",
                "Number of response records that yielded no text",
            )?,
        })
    }
}

type Scrape = ([(header::HeaderName, String); 1], Vec<u8>);

async fn metrics(State(registry): State<Registry>) -> Result<Scrape, StatusCode> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&registry.gather(), &mut buf).map_err(|e| {
        error!("could not encode metrics: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buf,
    ))
}

pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(registry)
}

/// Serve `registry` on an already bound listener.
pub fn serve_on(listener: TcpListener, registry: Registry) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(registry)).await {
            error!("metrics server stopped: {:?}", e);
        }
    })
}

/// Bind `port` on all interfaces and serve `registry` there.
///
/// Binding errors are returned, serving happens in the background.
pub async fn serve(registry: Registry, port: u16) -> Result<JoinHandle<()>, Error> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("serving metrics on {:?}", listener.local_addr()?);
    Ok(serve_on(listener, registry))
}
