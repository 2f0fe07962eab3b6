/*! Ranged retrieval of gzipped archive slices.

CommonCrawl stores both CDX files and WARC files as concatenations of gzip members,
so that any member can be fetched with a `Range` request and decompressed on its own.
!*/
use std::future::Future;
use std::io::Read;
use std::time::Duration;

use bytes::Buf;
use flate2::read::MultiGzDecoder;
use log::debug;
use reqwest::{header::RANGE, StatusCode};

pub const BASE_URL: &str = "https://data.commoncrawl.org";

#[derive(Debug)]
pub enum Error {
    Reqwest(reqwest::Error),
    Status { url: String, status: StatusCode },
    Decompress(std::io::Error),
    InvalidRange { start: u64, length: u64 },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Reqwest(err)
    }
}

/// Something that can retrieve a decompressed slice of a remote archive.
pub trait Fetch {
    /// Get bytes `start..=start+length-1` of `path` and gunzip them.
    ///
    /// Either the whole slice is returned decompressed, or an error is.
    fn fetch(
        &self,
        path: &str,
        start: u64,
        length: u64,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

/// HTTP(S) fetcher against a fixed base location.
///
/// No retries are done here.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
    base: String,
}

impl ArchiveFetcher {
    /// Create a fetcher for `base`.
    ///
    /// `timeout` bounds each request as a whole (connection, headers and body).
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Full url of a path relative to the base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

impl Fetch for ArchiveFetcher {
    async fn fetch(&self, path: &str, start: u64, length: u64) -> Result<Vec<u8>, Error> {
        let end = match length.checked_sub(1).and_then(|l| start.checked_add(l)) {
            Some(end) => end,
            None => return Err(Error::InvalidRange { start, length }),
        };

        let url = self.url(path);
        let resp = self
            .client
            .get(&url)
            .header(RANGE, format!("bytes={}-{}", start, end))
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => (),
            status => return Err(Error::Status { url, status }),
        }

        let body = resp.bytes().await?;
        debug!("fetched {} bytes from {} ({}-{})", body.len(), url, start, end);

        gunzip(body.reader())
    }
}

/// Decompress a (possibly multi-member) gzip stream entirely.
pub fn gunzip<R: Read>(reader: R) -> Result<Vec<u8>, Error> {
    let mut decoder = MultiGzDecoder::new(reader);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf).map_err(Error::Decompress)?;
    Ok(buf)
}
