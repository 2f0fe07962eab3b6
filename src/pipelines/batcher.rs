//! Batcher: the producer half.
//!
//! The batcher only reads index files, and never downloads WARC records.
//!
//! For each valid line of the index, it fetches the corresponding slice of a CDX file,
//! which is a gzipped list of `surt-url timestamp json-metadata` lines.
//! Records that are in English and that have been captured with a `200` status
//! are grouped into fixed size batches that are published on the queue.
//!
//! Everything is sequential: one fetch at a time, and a batch is published as soon as it is full.
//!
//! # Errors
//! - Invalid index lines and CDX lines are logged and skipped.
//! - A failed fetch skips the index line.
//! - A failed publication loses the batch (it is logged and counted in [Summary::batches_dropped]).
use log::{debug, error, info, warn};

use crate::batch::{Batch, BatchAssembler, BATCH_SIZE};
use crate::fetch::Fetch;
use crate::filtering::{CandidateFilter, Verdict};
use crate::index::IndexRecord;
use crate::locator::Locator;
use crate::metrics::BatcherMetrics;
use crate::queue::Publish;

/// Location of the CDX files of the default crawl, relative to the archive base.
pub const INDEX_PREFIX: &str = "cc-index/collections/CC-MAIN-2024-30/indexes";

/// What happened during a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub index_records: usize,
    pub failed_fetches: usize,
    pub locators: usize,
    pub batches_published: usize,
    pub batches_dropped: usize,
}

pub struct Batcher<F, P> {
    fetcher: F,
    publisher: P,
    filter: CandidateFilter,
    metrics: BatcherMetrics,
    index_prefix: String,
    batch_size: usize,
    limit: Option<usize>,
}

impl<F: Fetch, P: Publish> Batcher<F, P> {
    /// New batcher with the default filter, index prefix and batch size, and no limit.
    pub fn new(fetcher: F, publisher: P, metrics: BatcherMetrics) -> Self {
        Self {
            fetcher,
            publisher,
            filter: CandidateFilter::default(),
            metrics,
            index_prefix: INDEX_PREFIX.to_string(),
            batch_size: BATCH_SIZE,
            limit: None,
        }
    }

    /// Set the path prefix of CDX files. An empty prefix uses index paths as is.
    pub fn index_prefix(mut self, prefix: &str) -> Self {
        self.index_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Stop after `limit` index records.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Get the publisher back.
    pub fn into_publisher(self) -> P {
        self.publisher
    }

    fn cdx_path(&self, record: &IndexRecord) -> String {
        if self.index_prefix.is_empty() {
            record.path.clone()
        } else {
            format!("{}/{}", self.index_prefix, record.path)
        }
    }

    /// Run on the records of an index.
    pub async fn run<I>(&self, records: I) -> Summary
    where
        I: Iterator<Item = IndexRecord>,
    {
        let mut summary = Summary::default();
        let mut assembler = BatchAssembler::new(self.batch_size);

        for record in records.take(self.limit.unwrap_or(usize::MAX)) {
            summary.index_records += 1;
            let path = self.cdx_path(&record);

            let content = match self
                .fetcher
                .fetch(&path, record.offset, record.length)
                .await
            {
                Ok(content) => content,
                Err(e) => {
                    warn!("failed to fetch {} ({}+{}): {:?}", path, record.offset, record.length, e);
                    summary.failed_fetches += 1;
                    continue;
                }
            };

            let mut nb_accepted = 0;
            for locator in self.candidates(&content) {
                nb_accepted += 1;
                if let Some(batch) = assembler.push(locator) {
                    self.publish(batch, &mut summary).await;
                }
            }
            debug!("{}: {} candidates", record.urlkey, nb_accepted);
            summary.locators += nb_accepted;
        }

        if let Some(batch) = assembler.finish() {
            self.publish(batch, &mut summary).await;
        }

        info!("batcher done: {:?}", summary);
        summary
    }

    /// Parse and filter the lines of a decompressed CDX slice.
    fn candidates<'a>(&'a self, content: &'a [u8]) -> impl Iterator<Item = Locator> + 'a {
        content
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .filter_map(|line| match std::str::from_utf8(line) {
                Ok(line) => Some(line),
                Err(e) => {
                    debug!("skipping non-UTF-8 CDX line: {:?}", e);
                    None
                }
            })
            .filter_map(|line| match Locator::from_cdx_line(line) {
                Ok(locator) => Some(locator),
                Err(e) => {
                    debug!("skipping CDX line: {:?}", e);
                    None
                }
            })
            .filter(|locator| {
                self.metrics.total_documents.inc();
                match self.filter.verdict(locator.metadata()) {
                    Verdict::Accept => {
                        self.metrics.passed_filter.inc();
                        true
                    }
                    Verdict::NotEnglish => {
                        self.metrics.non_english.inc();
                        false
                    }
                    Verdict::NotOk => {
                        self.metrics.non_ok.inc();
                        false
                    }
                }
            })
            .filter(|locator| match locator.metadata().range() {
                Ok(_) => true,
                Err(e) => {
                    warn!("discarding {}: {:?}", locator.surt_url(), e);
                    false
                }
            })
    }

    async fn publish(&self, batch: Batch, summary: &mut Summary) {
        info!("pushing batch of size {}", batch.len());
        match self.publisher.publish(&batch).await {
            Ok(()) => {
                self.metrics.batches.inc();
                summary.batches_published += 1;
            }
            Err(e) => {
                error!("dropping batch of size {}: {:?}", batch.len(), e);
                summary.batches_dropped += 1;
            }
        }
    }
}
