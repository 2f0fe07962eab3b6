/*! Batch hand-off between the batcher and the workers.

The pipelines only rely on two small traits:
- [Publish]: fire-and-forget publication of a [Batch] (no confirmation is awaited).
- [Delivery]: a batch handed to a consumer, that has to be explicitly acknowledged or declined,
  with or without requeueing.

[rabbitmq] implements both on top of `lapin`.
!*/
use std::future::Future;

use crate::{batch::Batch, error::Error};

pub mod rabbitmq;

/// Publishes batches to a durable queue.
pub trait Publish {
    fn publish(&self, batch: &Batch) -> impl Future<Output = Result<(), Error>> + Send;
}

/// One unacknowledged batch, delivered to a consumer.
pub trait Delivery {
    /// Raw (wire format) batch.
    fn payload(&self) -> &[u8];

    /// `true` if the broker already handed this batch out before.
    fn redelivered(&self) -> bool;

    /// Mark the batch as processed. The broker forgets it.
    fn ack(self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Refuse the batch. With `requeue` it is given back for redelivery,
    /// otherwise the broker drops it (or dead-letters it, if the queue is set up so).
    fn decline(self, requeue: bool) -> impl Future<Output = Result<(), Error>> + Send;
}
