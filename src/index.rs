/*! Index scanning.

The index file (typically a `cluster.idx`) is tab-delimited, one record per line:

```text
0,100,22,165)/ 20240722120756	cdx-00000.gz	0	188224	1
```

Only the first four fields matter: url key, path of the CDX file, offset and length of the gzipped slice in that file.
Extra fields are ignored.

[IndexScanner] streams the file, and never stops on a malformed line.
!*/
use std::convert::TryFrom;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use log::{error, warn};

use crate::error::Error;

/// A valid line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub urlkey: String,
    pub path: String,
    pub offset: u64,
    pub length: u64,
}

impl TryFrom<&StringRecord> for IndexRecord {
    type Error = Error;

    fn try_from(record: &StringRecord) -> Result<Self, Self::Error> {
        if record.len() < 4 {
            return Err(Error::Record(format!(
                "expected at least 4 fields, got {}: {:?}",
                record.len(),
                record
            )));
        }

        let offset = record[2]
            .parse()
            .map_err(|e| Error::Record(format!("invalid offset {:?}: {}", &record[2], e)))?;
        let length = record[3]
            .parse()
            .map_err(|e| Error::Record(format!("invalid length {:?}: {}", &record[3], e)))?;

        Ok(Self {
            urlkey: record[0].to_string(),
            path: record[1].to_string(),
            offset,
            length,
        })
    }
}

/// Lazy, forward-only iterator over the valid records of an index.
///
/// Invalid lines are logged and skipped.
/// An I/O error ends the iteration (after being logged), since the underlying reader cannot be trusted anymore.
pub struct IndexScanner<R> {
    records: StringRecordsIntoIter<R>,
    done: bool,
}

impl IndexScanner<File> {
    /// Open an index file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let f = File::open(path)?;
        Ok(Self::new(f))
    }
}

impl<R: Read> IndexScanner<R> {
    pub fn new(reader: R) -> Self {
        let records = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader)
            .into_records();

        Self {
            records,
            done: false,
        }
    }
}

impl<R: Read> Iterator for IndexScanner<R> {
    type Item = IndexRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    error!("stopping index scan: {:?}", e);
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    warn!("skipping unreadable index line: {:?}", e);
                    continue;
                }
            };

            match IndexRecord::try_from(&record) {
                Ok(r) => return Some(r),
                Err(e) => {
                    let line = record.position().map(|p| p.line());
                    warn!("skipping index line {:?}: {:?}", line, e);
                }
            }
        }

        None
    }
}
