//! Pipelines.
//!
//! The system is split in two halves that only communicate through the queue:
//! - [Batcher] turns index records into batches of candidate locators and publishes them,
//! - [Worker] consumes batches, fetches the archived records and extracts their text.
//!
//! Both are generic over their fetcher and their queue side, and run sequentially.
pub mod batcher;
pub mod worker;

pub use batcher::{Batcher, Summary};
pub use worker::Worker;
