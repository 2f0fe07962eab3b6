/*! WARC container reading.

Wraps [warc::WarcReader] over a decompressed archive slice, and only yields `response` records.

A slice fetched from a CDX range usually holds a single record, but nothing prevents it from holding more.
!*/
use std::io::BufRead;

use log::debug;
use warc::{BufferedBody, Record, WarcHeader, WarcReader};

use crate::error::Error;

/// Iterator over the `response` records of a container.
///
/// Other record types are skipped silently.
/// The first malformed record yields an [Error::ContainerFormat] and ends the iteration.
pub struct ContainerReader<I> {
    records: I,
    done: bool,
}

impl<I> ContainerReader<I>
where
    I: Iterator<Item = Result<Record<BufferedBody>, warc::Error>>,
{
    pub fn from_records(records: I) -> Self {
        Self {
            records,
            done: false,
        }
    }
}

/// Start reading a container.
///
/// Each call starts from the beginning of `reader`.
pub fn read<R: BufRead>(
    reader: R,
) -> ContainerReader<impl Iterator<Item = Result<Record<BufferedBody>, warc::Error>>> {
    ContainerReader::from_records(WarcReader::new(reader).iter_records())
}

/// `true` if the record is a `response`.
pub fn is_response(record: &Record<BufferedBody>) -> bool {
    record.header(WarcHeader::WarcType).as_deref() == Some("response")
}

impl<I> Iterator for ContainerReader<I>
where
    I: Iterator<Item = Result<Record<BufferedBody>, warc::Error>>,
{
    type Item = Result<Record<BufferedBody>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.records.next()? {
                Ok(record) if is_response(&record) => return Some(Ok(record)),
                Ok(record) => {
                    debug!(
                        "skipping {:?} record {}",
                        record.header(WarcHeader::WarcType),
                        record.warc_id()
                    );
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::ContainerFormat(e)));
                }
            }
        }
        None
    }
}
