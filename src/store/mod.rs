//! Persistence of raw message bytes between the fetch and build phases.

pub mod raw;
