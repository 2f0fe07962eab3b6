//! Error enum
use crate::fetch;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Csv(csv::Error),
    Serde(serde_json::Error),

    /// A single index line or CDX line is malformed.
    Record(String),

    /// Network or decompression failure on one archive slice.
    Retrieval(fetch::Error),

    /// A fetched slice is not a valid WARC container.
    ContainerFormat(warc::Error),

    /// The broker refused or failed a publish.
    Publish(lapin::Error),

    /// Broker connection/channel lifecycle failure.
    Amqp(lapin::Error),

    /// A delivered batch had `failed` locators out of `total`.
    Processing { failed: usize, total: usize },

    Metrics(prometheus::Error),
    Custom(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<fetch::Error> for Error {
    fn from(e: fetch::Error) -> Error {
        Error::Retrieval(e)
    }
}

impl From<warc::Error> for Error {
    fn from(e: warc::Error) -> Error {
        Error::ContainerFormat(e)
    }
}

impl From<lapin::Error> for Error {
    fn from(e: lapin::Error) -> Error {
        Error::Amqp(e)
    }
}

impl From<prometheus::Error> for Error {
    fn from(e: prometheus::Error) -> Error {
        Error::Metrics(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
