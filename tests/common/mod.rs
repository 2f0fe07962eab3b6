//! In-memory stand-ins for the archive and the queue.
#![allow(dead_code)]
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ccharvest::{
    batch::Batch,
    error::Error,
    fetch::{self, Fetch},
    queue::{Delivery, Publish},
};
use flate2::{write::GzEncoder, Compression};

pub fn gzip(content: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(content).unwrap();
    enc.finish().unwrap()
}

/// A single WARC/1.0 record.
pub fn warc_record(kind: &str, id: usize, body: &str) -> String {
    format!(
        "WARC/1.0\r\n\
        WARC-Type: {}\r\n\
        WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-{:012}>\r\n\
        WARC-Date: 2024-07-22T12:07:56Z\r\n\
        WARC-Target-URI: http://example.com/{}\r\n\
        Content-Length: {}\r\n\
        \r\n\
        {}\r\n\
        \r\n",
        kind,
        id,
        id,
        body.len(),
        body
    )
}

/// An HTTP response whose visible text is `text`.
pub fn html_response(text: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
        <html><head><script>var x = 1;</script></head><body><p>{}</p></body></html>",
        text
    )
}

/// CDX line of an English, `200` capture stored at `crawl-data/<id>.warc.gz`.
pub fn cdx_line(id: usize, language: &str, status: &str) -> String {
    format!(
        "com,example)/{} 20240722120756 {{\"url\": \"http://example.com/{}\", \"languages\": \"{}\", \"status\": \"{}\", \"filename\": \"crawl-data/{}.warc.gz\", \"offset\": \"{}\", \"length\": \"500\"}}\n",
        id,
        id,
        language,
        status,
        id,
        id * 500
    )
}

/// Archive serving gzipped files by path, ignoring ranges.
#[derive(Default)]
pub struct FakeArchive {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<(String, u64, u64)>>,
}

impl FakeArchive {
    /// Store `content`, gzipped, at `path`.
    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(path.to_string(), gzip(content));
        self
    }

    /// Store raw bytes at `path`.
    pub fn with_raw_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(path.to_string(), content.to_vec());
        self
    }

    pub fn requests(&self) -> Vec<(String, u64, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetch for FakeArchive {
    async fn fetch(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, fetch::Error> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), start, length));

        match self.files.get(path) {
            Some(content) => fetch::gunzip(&content[..]),
            None => Err(fetch::Error::Status {
                url: path.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            }),
        }
    }
}

impl Fetch for &FakeArchive {
    async fn fetch(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, fetch::Error> {
        (**self).fetch(path, start, length).await
    }
}

/// Keeps published batches, or refuses them all.
#[derive(Default)]
pub struct FakeQueue {
    published: Mutex<Vec<Batch>>,
    broken: bool,
}

impl FakeQueue {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<Batch> {
        self.published.lock().unwrap().clone()
    }
}

impl Publish for FakeQueue {
    async fn publish(&self, batch: &Batch) -> Result<(), Error> {
        if self.broken {
            return Err(Error::Custom("broker unreachable".to_string()));
        }
        self.published.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Requeue,
    Drop,
}

/// Delivery recording how it has been settled.
pub struct FakeDelivery {
    payload: Vec<u8>,
    redelivered: bool,
    settlements: Arc<Mutex<Vec<Settlement>>>,
}

impl FakeDelivery {
    pub fn new(payload: Vec<u8>, settlements: &Arc<Mutex<Vec<Settlement>>>) -> Self {
        Self {
            payload,
            redelivered: false,
            settlements: settlements.clone(),
        }
    }

    /// Same delivery, handed out a second time.
    pub fn again(mut self) -> Self {
        self.redelivered = true;
        self
    }
}

impl Delivery for FakeDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn redelivered(&self) -> bool {
        self.redelivered
    }

    async fn ack(self) -> Result<(), Error> {
        self.settlements.lock().unwrap().push(Settlement::Ack);
        Ok(())
    }

    async fn decline(self, requeue: bool) -> Result<(), Error> {
        let settlement = if requeue {
            Settlement::Requeue
        } else {
            Settlement::Drop
        };
        self.settlements.lock().unwrap().push(settlement);
        Ok(())
    }
}
