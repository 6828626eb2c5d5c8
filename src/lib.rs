//! CrimeScope - crime incident analysis dashboard.
//!
//! The library holds everything but the window: loading and cleaning the
//! incident table, the aggregations behind each dashboard section, static
//! chart export and the Leaflet maps.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod gui;
pub mod maps;
pub mod stats;
