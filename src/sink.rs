//! Destination of extracted documents.
use log::{debug, info};

/// Text extracted from one `response` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// SURT url of the locator the record was fetched from.
    pub surt_url: String,
    /// `WARC-Target-URI` of the record, if any.
    pub target_uri: Option<String>,
    pub text: String,
}

pub trait Sink {
    fn accept(&mut self, document: Document);
}

/// Only logs documents: length at `info`, text at `debug`.
#[derive(Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn accept(&mut self, document: Document) {
        info!(
            "extracted {} chars from {}",
            document.text.len(),
            document.target_uri.as_deref().unwrap_or(&document.surt_url)
        );
        debug!("{}", document.text);
    }
}

/// Keeps documents in memory.
impl Sink for Vec<Document> {
    fn accept(&mut self, document: Document) {
        self.push(document);
    }
}
