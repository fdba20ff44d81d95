//! Wide-to-long reshaping, filtering and regional aggregation of climate
//! indicator tables.
//!
//! [`data`] holds the pipeline; [`state::Session`] ties it to one set of
//! user selections and produces a [`state::Snapshot`] for rendering.

pub mod cli;
pub mod data;
pub mod report;
pub mod state;
