//! Worker: the consumer half.
//!
//! Each delivered batch is decoded, then every locator of the batch is processed in order:
//! its WARC range is fetched, decompressed, and the text of each `response` record is extracted
//! and handed to a [Sink].
//!
//! A batch is acknowledged only when all of its locators have been processed.
//! Otherwise it is declined:
//! - a batch that cannot be decoded is dropped, since it will never decode,
//! - a batch that fails processing on its first delivery is requeued once,
//!   and documents of its successful locators will be extracted again,
//! - a batch that fails again on redelivery is dropped.
use futures::{Stream, StreamExt};
use log::{debug, error, info, warn};
use warc::WarcHeader;

use crate::batch::Batch;
use crate::container;
use crate::error::Error;
use crate::extract;
use crate::fetch::Fetch;
use crate::filtering::{Filter, Length};
use crate::locator::Locator;
use crate::metrics::WorkerMetrics;
use crate::queue::Delivery;
use crate::sink::{Document, Sink};

pub struct Worker<F, S> {
    fetcher: F,
    sink: S,
    length: Length,
    metrics: WorkerMetrics,
}

impl<F: Fetch, S: Sink> Worker<F, S> {
    /// New worker, keeping documents of any length.
    pub fn new(fetcher: F, sink: S, metrics: WorkerMetrics) -> Self {
        Self {
            fetcher,
            sink,
            length: Length::default(),
            metrics,
        }
    }

    /// Only keep documents whose text length passes `length`.
    pub fn with_length_filter(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Fetch the record(s) of a locator and extract them.
    ///
    /// Returns the number of documents sent to the sink.
    pub async fn process_locator(&mut self, locator: &Locator) -> Result<usize, Error> {
        let range = locator.metadata().range()?;
        let data = self
            .fetcher
            .fetch(range.filename, range.offset, range.length)
            .await?;

        let mut nb_docs = 0;
        for record in container::read(data.as_slice()) {
            let record = record?;
            let target_uri = record
                .header(WarcHeader::TargetURI)
                .map(|uri| uri.into_owned());

            let text = match extract::extract(record.body()) {
                Some(text) if !text.is_empty() => text,
                _ => {
                    warn!(
                        "no text in record {} ({})",
                        record.warc_id(),
                        locator.surt_url()
                    );
                    self.metrics.extraction_errors.inc();
                    continue;
                }
            };

            if !self.length.detect(text.as_str()) {
                debug!(
                    "skipping record {}: {} chars",
                    record.warc_id(),
                    text.chars().count()
                );
                continue;
            }

            self.metrics.extracted.inc();
            nb_docs += 1;
            self.sink.accept(Document {
                surt_url: locator.surt_url().to_string(),
                target_uri,
                text,
            });
        }

        Ok(nb_docs)
    }

    /// Process every locator of a batch.
    ///
    /// A failing locator does not prevent the next ones from being processed,
    /// but makes the whole batch fail with [Error::Processing].
    pub async fn process_batch(&mut self, batch: Batch) -> Result<(), Error> {
        let total = batch.len();
        self.metrics.entries_received.inc_by(total as u64);

        let mut failed = 0;
        for locator in batch {
            match self.process_locator(&locator).await {
                Ok(nb_docs) => debug!("{}: {} documents", locator.surt_url(), nb_docs),
                Err(e @ Error::ContainerFormat(_)) => {
                    error!("malformed container for {}: {:?}", locator.surt_url(), e);
                    failed += 1;
                }
                Err(e) => {
                    warn!("could not process {}: {:?}", locator.surt_url(), e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(Error::Processing { failed, total });
        }

        self.metrics.batches.inc();
        Ok(())
    }

    /// Decode, process and then acknowledge or decline a delivery.
    ///
    /// Returns the processing outcome. Acknowledgement errors are only logged.
    pub async fn handle<D: Delivery>(&mut self, delivery: D) -> Result<(), Error> {
        let batch = match Batch::from_json(delivery.payload()) {
            Ok(batch) => batch,
            Err(e) => {
                error!("could not decode batch, dropping it: {:?}", e);
                if let Err(settle) = delivery.decline(false).await {
                    error!("could not settle delivery: {:?}", settle);
                }
                return Err(e);
            }
        };

        info!("processing batch of size {}", batch.len());
        let outcome = self.process_batch(batch).await;

        let settled = match &outcome {
            Ok(()) => delivery.ack().await,
            Err(_) if delivery.redelivered() => {
                error!("batch failed again after redelivery, dropping it");
                delivery.decline(false).await
            }
            Err(_) => delivery.decline(true).await,
        };
        if let Err(e) = settled {
            error!("could not settle delivery: {:?}", e);
        }

        outcome
    }

    /// Handle deliveries until the stream ends.
    pub async fn run<St, D>(&mut self, mut deliveries: St)
    where
        St: Stream<Item = Result<D, Error>> + Unpin,
        D: Delivery,
    {
        while let Some(delivery) = deliveries.next().await {
            match delivery {
                Ok(delivery) => {
                    if let Err(e) = self.handle(delivery).await {
                        warn!("batch declined: {:?}", e);
                    }
                }
                Err(e) => warn!("could not receive delivery: {:?}", e),
            }
        }
        info!("no more deliveries");
    }
}
