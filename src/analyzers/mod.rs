//! Offline reduction of station logs.
//!
//! This module rebuilds per-station occupancy series on a fixed bucket grid,
//! reduces them to station averages and hourly means, and classifies
//! stations that never logged anything.

pub mod aggregate;
pub mod analyzer;
pub mod bucket;
pub mod types;
pub mod utility;
