/*! # ccharvest

Distributed English text harvesting from CommonCrawl.

A [pipelines::Batcher] scans a CDX index, keeps the English documents captured with a `200` status,
and publishes them in batches to a RabbitMQ queue.
Any number of [pipelines::Worker]s consume the batches, fetch the archived responses with ranged requests
and extract their visible text.
!*/
pub mod batch;
pub mod container;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filtering;
pub mod index;
pub mod locator;
pub mod metrics;
pub mod pipelines;
pub mod queue;
pub mod sink;
