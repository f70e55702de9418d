//! Metrics for roster, recorded through the `metrics` facade.
//!
//! Crates record with the re-exported macros behind their own `metrics`
//! feature. The binary installs a recorder with [`init_metrics`]; with the
//! `prometheus` feature the handle renders the Prometheus text format.
//!
//! ```rust,ignore
//! use roster_metrics::{counter, responder};
//!
//! counter!(responder::EVENTS_RECEIVED_TOTAL, "kind" => "text").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
