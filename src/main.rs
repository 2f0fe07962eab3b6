//! # ccharvest
//!
//! Harvests English text from CommonCrawl, using a RabbitMQ queue to spread work over many workers.
//!
//! One batcher scans a `cluster.idx` file and publishes batches of candidate documents,
//! then exits. Workers run until they are stopped.
//!
//! ## Getting started
//!
//! ```sh
//! ccharvest 0.1.0
//! English text harvesting from CommonCrawl.
//!
//! USAGE:
//!     ccharvest <SUBCOMMAND>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     batcher    Scan an index and publish batches of candidate documents
//!     help       Prints this message or the help of the given subcommand(s)
//!     worker     Consume batches and extract text
//! ```
//!
//! Logging is configured with `RUST_LOG` and defaults to `info`.
use std::time::Duration;

use env_logger::Env;
use prometheus::Registry;
use structopt::StructOpt;

use ccharvest::{
    error::Error,
    fetch::ArchiveFetcher,
    filtering::Length,
    index::IndexScanner,
    metrics::{self, BatcherMetrics, WorkerMetrics},
    pipelines::{Batcher, Worker},
    queue::rabbitmq::{self, RabbitPublisher},
    sink::LogSink,
};

#[macro_use]
extern crate log;

mod cli;

fn fetcher(common: &cli::Common) -> Result<ArchiveFetcher, Error> {
    let timeout = match common.fetch_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    Ok(ArchiveFetcher::new(common.base_url.as_str(), timeout)?)
}

async fn batcher(opt: cli::Batcher) -> Result<(), Error> {
    let registry = Registry::new();
    let metrics = BatcherMetrics::register(&registry)?;
    let _server = metrics::serve(registry, opt.metrics_port).await?;

    let records = IndexScanner::from_path(&opt.index)?;

    let connection = rabbitmq::connect(&opt.common.amqp_addr).await?;
    let channel = rabbitmq::channel_with_queue(&connection, &opt.common.queue).await?;
    let publisher = RabbitPublisher::new(channel, &opt.common.queue);

    let batcher = Batcher::new(fetcher(&opt.common)?, publisher, metrics)
        .index_prefix(&opt.index_prefix)
        .batch_size(opt.batch_size)
        .limit(opt.limit);

    let summary = batcher.run(records).await;
    info!(
        "published {} batches ({} locators) from {} index records",
        summary.batches_published, summary.locators, summary.index_records
    );
    if summary.batches_dropped > 0 {
        warn!("{} batches could not be published", summary.batches_dropped);
    }

    rabbitmq::close(&connection).await
}

async fn worker(opt: cli::Worker) -> Result<(), Error> {
    let registry = Registry::new();
    let metrics = WorkerMetrics::register(&registry)?;
    let _server = metrics::serve(registry, opt.metrics_port).await?;

    let connection = rabbitmq::connect(&opt.common.amqp_addr).await?;
    let channel = rabbitmq::channel_with_queue(&connection, &opt.common.queue).await?;
    let deliveries = rabbitmq::consume(&channel, &opt.common.queue, "worker").await?;

    let mut worker = Worker::new(fetcher(&opt.common)?, LogSink, metrics)
        .with_length_filter(Length::new(opt.min_chars, opt.max_chars));

    info!("waiting for batches on {:?}", opt.common.queue);
    worker.run(deliveries).await;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opt = cli::Ccharvest::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Ccharvest::Batcher(b) => batcher(b).await,
        cli::Ccharvest::Worker(w) => worker(w).await,
    }
}
