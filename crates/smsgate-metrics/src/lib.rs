//! Self-contained Prometheus metrics for the SMS frontend.
//!
//! The crate covers the full pipeline from recording to scraping: unordered
//! [`LabelSet`]s identify series, a concurrency-safe [`Registry`] stores
//! counters, gauges, histograms, and summaries, and [`encode`] renders
//! snapshots in the text exposition format (version 0.0.4). [`AppMetrics`]
//! wraps it all in the frontend's fixed `app_*` metric surface.

mod app;
mod encode;
mod error;
mod histogram;
mod labels;
mod registry;
mod series;

pub use app::{ActiveRequest, AppMetrics, CacheStatus, LATENCY_BUCKETS, RequestOutcome};
pub use encode::encode;
pub use error::RegistryError;
pub use histogram::HistogramSnapshot;
pub use labels::LabelSet;
pub use registry::{
    FamilySnapshot, MetricKind, Registry, SeriesSnapshot, SeriesValue, Snapshot,
};
