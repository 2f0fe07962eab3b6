/*! Batches of locators.

A [Batch] is the unit that goes through the queue. On the wire it is a bare JSON array of locators,
without any envelope:

```json
[{"surt_url": "com,example)/", "timestamp": "20240722120756", "metadata": {"status": "200", "...": "..."}}]
```
!*/
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::locator::Locator;

/// Default number of locators per batch.
pub const BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch(Vec<Locator>);

impl Batch {
    pub fn new(locators: Vec<Locator>) -> Self {
        Self(locators)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn locators(&self) -> &[Locator] {
        &self.0
    }

    /// Serialize into the wire format.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the wire format.
    pub fn from_json(data: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl IntoIterator for Batch {
    type Item = Locator;
    type IntoIter = std::vec::IntoIter<Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Accumulates locators into batches of a fixed size.
///
/// Boundaries only depend on the number of pushed locators, and order is kept.
#[derive(Debug)]
pub struct BatchAssembler {
    size: usize,
    current: Vec<Locator>,
}

impl BatchAssembler {
    /// Create an assembler emitting batches of `size` locators. A size of 0 is treated as 1.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            current: Vec::with_capacity(size),
        }
    }

    /// Add a locator, returning a full batch if the threshold has been reached.
    pub fn push(&mut self, locator: Locator) -> Option<Batch> {
        self.current.push(locator);
        if self.current.len() >= self.size {
            let full = std::mem::replace(&mut self.current, Vec::with_capacity(self.size));
            Some(Batch(full))
        } else {
            None
        }
    }

    /// Number of locators waiting for a batch.
    pub fn pending(&self) -> usize {
        self.current.len()
    }

    /// End the session, returning the remaining locators if any.
    pub fn finish(self) -> Option<Batch> {
        if self.current.is_empty() {
            None
        } else {
            Some(Batch(self.current))
        }
    }
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self::new(BATCH_SIZE)
    }
}
