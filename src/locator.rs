/*! Document locators.

A [Locator] points to one captured document: its SURT url, its capture timestamp and the CDX metadata
that tells where the WARC record lives.

A CDX line looks like this (split over several lines for readability):

```text
0,100,59,139)/
20240723213521
{"url": "https://139.59.100.0/", "mime": "text/html", "status": "200", "length": "16650", "offset": "64016172",
 "filename": "crawl-data/CC-MAIN-2024-30/segments/1720763518115.82/warc/CC-MAIN-20240723194208-20240723224208-00279.warc.gz",
 "languages": "ind,eng"}
```
!*/
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// CDX metadata.
///
/// The fields the pipeline relies on are pulled out of the JSON object when they are strings.
/// Everything else (unknown keys, but also known keys holding a non-string value) is kept untouched in `extra`,
/// so that serializing back yields the same object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Metadata {
    languages: Option<String>,
    status: Option<String>,
    filename: Option<String>,
    offset: Option<String>,
    length: Option<String>,
    extra: Map<String, Value>,
}

/// Where a record lives: a path relative to the archive base and a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRange<'a> {
    pub filename: &'a str,
    pub offset: u64,
    pub length: u64,
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            languages: take_string(&mut map, "languages"),
            status: take_string(&mut map, "status"),
            filename: take_string(&mut map, "filename"),
            offset: take_string(&mut map, "offset"),
            length: take_string(&mut map, "length"),
            extra: map,
        }
    }
}

impl From<Metadata> for Map<String, Value> {
    fn from(m: Metadata) -> Self {
        let mut map = m.extra;
        for (key, value) in [
            ("languages", m.languages),
            ("status", m.status),
            ("filename", m.filename),
            ("offset", m.offset),
            ("length", m.length),
        ] {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value));
            }
        }
        map
    }
}

impl Metadata {
    /// Comma-separated language codes, as detected by CommonCrawl.
    pub fn languages(&self) -> Option<&str> {
        self.languages.as_deref()
    }

    /// HTTP status of the capture.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn offset(&self) -> Option<&str> {
        self.offset.as_deref()
    }

    pub fn length(&self) -> Option<&str> {
        self.length.as_deref()
    }

    /// Keys that are not interpreted by the pipeline.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Get the archive range of the record.
    ///
    /// Fails with [Error::Record] if `filename`, `offset` or `length` are missing,
    /// or if `offset`/`length` are not non-negative integers.
    pub fn range(&self) -> Result<ArchiveRange<'_>, Error> {
        let filename = self
            .filename()
            .ok_or_else(|| Error::Record("missing filename".to_string()))?;
        let offset = parse_number("offset", self.offset())?;
        let length = parse_number("length", self.length())?;

        Ok(ArchiveRange {
            filename,
            offset,
            length,
        })
    }
}

fn parse_number(field: &str, value: Option<&str>) -> Result<u64, Error> {
    let value = value.ok_or_else(|| Error::Record(format!("missing {}", field)))?;
    value
        .parse()
        .map_err(|e| Error::Record(format!("invalid {} {:?}: {}", field, value, e)))
}

/// A discovered document.
///
/// Serialized as `{"surt_url": .., "timestamp": .., "metadata": {..}}`, which is the batch wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    surt_url: String,
    timestamp: String,
    metadata: Metadata,
}

impl Locator {
    pub fn new(surt_url: String, timestamp: String, metadata: Metadata) -> Self {
        Self {
            surt_url,
            timestamp,
            metadata,
        }
    }

    /// Parse a `surt-url timestamp json-metadata` CDX line.
    pub fn from_cdx_line(line: &str) -> Result<Self, Error> {
        let mut parts = line.splitn(3, ' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(surt_url), Some(timestamp), Some(metadata)) => {
                let metadata = serde_json::from_str(metadata).map_err(|e| {
                    Error::Record(format!("invalid metadata for {}: {}", surt_url, e))
                })?;
                Ok(Self::new(
                    surt_url.to_string(),
                    timestamp.to_string(),
                    metadata,
                ))
            }
            _ => Err(Error::Record(format!(
                "expected 3 space-separated fields, got {:?}",
                line
            ))),
        }
    }

    pub fn surt_url(&self) -> &str {
        &self.surt_url
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
