/*! Filtering utilities

Filters operate either on CDX metadata (see [candidate::CandidateFilter], used by the batcher)
or on extracted text (see [length::Length], used by the worker).

Filters implement [Filter]: they are pure, two successive equal inputs yield two equal outputs.
! */
pub mod candidate;
mod filter;
pub mod length;

pub use candidate::{CandidateFilter, Verdict};
pub use filter::Filter;
pub use length::Length;
