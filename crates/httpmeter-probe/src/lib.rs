//! # httpmeter-probe
//!
//! The sampler side of httpmeter:
//! - **Counter source seam**: the [`source::CounterSource`] trait over the
//!   externally maintained per-process request counter table.
//! - **Rate derivation**: pure counter-delta computation plus the periodic
//!   [`sampler::Sampler`] task that drives it.
//! - **Rate store**: the single-writer/multi-reader handoff of the latest
//!   rate snapshot to query handlers.

pub mod sampler;
pub mod source;
pub mod store;
