use crate::error::RegistryError;
use crate::labels::LabelSet;
use crate::registry::Registry;

/// Latency histogram boundaries in seconds, fixed at declaration and shared
/// by every label set of the latency metric.
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

const REQUESTS_TOTAL: &str = "app_sms_requests_total";
const LATENCY_SECONDS: &str = "app_sms_latency_seconds";
const MESSAGE_LENGTH: &str = "app_sms_message_length";
const ACTIVE_REQUESTS: &str = "app_sms_active_requests";
const CACHE_SIZE: &str = "app_cache_size";
const CACHE_HITS_TOTAL: &str = "app_cache_hits_total";
const CACHE_MISSES_TOTAL: &str = "app_cache_misses_total";
const PAGE_VIEWS_TOTAL: &str = "app_page_views_total";

/// How the prediction cache participated in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Cache enabled but the message was not cached yet.
    Miss,
    /// Cache disabled for this process.
    Bypass,
}

impl CacheStatus {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// Outcome of one completed prediction request, as recorded into metrics.
#[derive(Debug, Clone, Copy)]
pub struct RequestOutcome<'a> {
    /// Classification result label value ("spam" / "ham").
    pub result: &'a str,
    pub cache_status: CacheStatus,
}

/// The frontend's metric surface: a fixed set of `app_*` families over one
/// [`Registry`], every series tagged with a process-wide `version` label.
///
/// Built once at startup and shared by `Arc`; all recording methods take
/// `&self` and are safe under concurrent request handlers.
#[derive(Debug)]
pub struct AppMetrics {
    registry: Registry,
    version: String,
}

impl AppMetrics {
    /// Content type of the exposition body served at the metrics endpoint.
    pub const CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";

    /// Declare every frontend metric against a fresh registry.
    pub fn new(version: impl Into<String>) -> Result<Self, RegistryError> {
        let request_labels = ["version", "result", "cache_status"];
        let mut registry = Registry::new();
        registry.declare_counter(
            REQUESTS_TOTAL,
            "Total number of SMS requests",
            &request_labels,
        )?;
        registry.declare_histogram(
            LATENCY_SECONDS,
            "Time taken to predict SMS",
            &request_labels,
            &LATENCY_BUCKETS,
        )?;
        registry.declare_summary(
            MESSAGE_LENGTH,
            "Length in characters of SMS messages submitted for prediction",
            &request_labels,
        )?;
        registry.declare_gauge(
            ACTIVE_REQUESTS,
            "Number of requests currently being processed",
            &["version"],
        )?;
        registry.declare_gauge(
            CACHE_SIZE,
            "Current number of entries in the cache",
            &["version"],
        )?;
        registry.declare_counter(CACHE_HITS_TOTAL, "Total number of cache hits", &["version"])?;
        registry.declare_counter(
            CACHE_MISSES_TOTAL,
            "Total number of cache misses",
            &["version"],
        )?;
        registry.declare_counter(
            PAGE_VIEWS_TOTAL,
            "Total number of landing page views",
            &["version"],
        )?;
        Ok(Self {
            registry,
            version: version.into(),
        })
    }

    fn version_labels(&self) -> LabelSet {
        LabelSet::new().with("version", self.version.as_str())
    }

    /// Record one completed prediction request: request counter, latency
    /// histogram, message-length summary, and the hit/miss counters when the
    /// cache participated.
    pub fn record_request(
        &self,
        outcome: RequestOutcome<'_>,
        latency_seconds: f64,
        message_length: usize,
    ) {
        let labels = self
            .version_labels()
            .with("result", outcome.result)
            .with("cache_status", outcome.cache_status.as_label());
        self.registry.inc_counter(REQUESTS_TOTAL, &labels);
        self.registry
            .observe_histogram(LATENCY_SECONDS, &labels, latency_seconds);
        self.registry
            .observe_summary(MESSAGE_LENGTH, &labels, message_length as f64);
        match outcome.cache_status {
            CacheStatus::Hit => self.registry.inc_counter(CACHE_HITS_TOTAL, &self.version_labels()),
            CacheStatus::Miss => self
                .registry
                .inc_counter(CACHE_MISSES_TOTAL, &self.version_labels()),
            CacheStatus::Bypass => {}
        }
    }

    /// Mark a request as in flight for as long as the returned guard lives:
    /// the active-requests gauge goes up on creation and back down on drop,
    /// including early returns on the error path.
    pub fn track_request(&self) -> ActiveRequest<'_> {
        self.registry.inc_gauge(ACTIVE_REQUESTS, &self.version_labels());
        ActiveRequest { metrics: self }
    }

    /// Publish the current number of cache entries.
    pub fn set_cache_size(&self, entries: usize) {
        self.registry
            .set_gauge(CACHE_SIZE, &self.version_labels(), entries as i64);
    }

    /// Count one landing page view.
    pub fn record_page_view(&self) {
        self.registry.inc_counter(PAGE_VIEWS_TOTAL, &self.version_labels());
    }

    /// Render the exposition body for the metrics endpoint.
    pub fn render(&self) -> String {
        self.registry.render()
    }
}

/// RAII guard returned by [`AppMetrics::track_request`].
#[derive(Debug)]
pub struct ActiveRequest<'a> {
    metrics: &'a AppMetrics,
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.metrics
            .registry
            .dec_gauge(ACTIVE_REQUESTS, &self.metrics.version_labels());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spam_miss() -> RequestOutcome<'static> {
        RequestOutcome {
            result: "spam",
            cache_status: CacheStatus::Miss,
        }
    }

    #[test]
    fn fresh_metrics_render_headers_only() {
        let metrics = AppMetrics::new("stable").unwrap();
        let body = metrics.render();
        assert!(body.contains("# TYPE app_sms_requests_total counter\n"));
        assert!(body.contains("# TYPE app_sms_latency_seconds histogram\n"));
        assert!(body.contains("# TYPE app_sms_message_length summary\n"));
        assert!(body.contains("# TYPE app_sms_active_requests gauge\n"));
        assert!(!body.lines().any(|line| !line.starts_with('#')));
    }

    #[test]
    fn recorded_requests_show_up_with_version_result_and_cache_status() {
        let metrics = AppMetrics::new("stable").unwrap();
        metrics.record_request(spam_miss(), 0.03, 42);
        metrics.record_request(spam_miss(), 0.03, 42);

        let body = metrics.render();
        assert!(body.contains(
            "app_sms_requests_total{version=\"stable\",result=\"spam\",cache_status=\"miss\"} 2\n"
        ));
        assert!(body.contains(
            "app_sms_latency_seconds_bucket{version=\"stable\",result=\"spam\",cache_status=\"miss\",le=\"0.05\"} 2\n"
        ));
        assert!(body.contains(
            "app_sms_message_length_sum{version=\"stable\",result=\"spam\",cache_status=\"miss\"} 84\n"
        ));
        assert!(body.contains(
            "app_sms_message_length_count{version=\"stable\",result=\"spam\",cache_status=\"miss\"} 2\n"
        ));
        assert!(body.contains("app_cache_misses_total{version=\"stable\"} 2\n"));
    }

    #[test]
    fn hit_and_miss_outcomes_feed_the_cache_counters() {
        let metrics = AppMetrics::new("stable").unwrap();
        metrics.record_request(
            RequestOutcome {
                result: "ham",
                cache_status: CacheStatus::Hit,
            },
            0.001,
            10,
        );
        metrics.record_request(spam_miss(), 0.02, 20);
        metrics.record_request(
            RequestOutcome {
                result: "ham",
                cache_status: CacheStatus::Bypass,
            },
            0.002,
            30,
        );

        let body = metrics.render();
        assert!(body.contains("app_cache_hits_total{version=\"stable\"} 1\n"));
        assert!(body.contains("app_cache_misses_total{version=\"stable\"} 1\n"));
        assert!(body.contains(
            "app_sms_requests_total{version=\"stable\",result=\"ham\",cache_status=\"bypass\"} 1\n"
        ));
    }

    #[test]
    fn active_request_guard_tracks_in_flight_requests() {
        let metrics = AppMetrics::new("stable").unwrap();
        {
            let _first = metrics.track_request();
            let _second = metrics.track_request();
            assert!(
                metrics
                    .render()
                    .contains("app_sms_active_requests{version=\"stable\"} 2\n")
            );
        }
        assert!(
            metrics
                .render()
                .contains("app_sms_active_requests{version=\"stable\"} 0\n")
        );
    }

    #[test]
    fn cache_size_is_last_write_wins() {
        let metrics = AppMetrics::new("stable").unwrap();
        metrics.set_cache_size(5);
        metrics.set_cache_size(3);
        assert!(
            metrics
                .render()
                .contains("app_cache_size{version=\"stable\"} 3\n")
        );
    }

    #[test]
    fn page_views_accumulate() {
        let metrics = AppMetrics::new("canary").unwrap();
        metrics.record_page_view();
        metrics.record_page_view();
        assert!(
            metrics
                .render()
                .contains("app_page_views_total{version=\"canary\"} 2\n")
        );
    }

    #[test]
    fn render_is_idempotent_without_mutation() {
        let metrics = AppMetrics::new("stable").unwrap();
        metrics.record_request(spam_miss(), 0.03, 42);
        assert_eq!(metrics.render(), metrics.render());
    }
}
