use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::encode;
use crate::error::RegistryError;
use crate::histogram::{HistogramCell, HistogramSnapshot};
use crate::labels::LabelSet;
use crate::series::{CounterCell, GaugeCell, SummaryCell};

/// Kind of a metric family, as exposed in `# TYPE` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

/// One series: the per-label-set storage of a metric family.
#[derive(Debug)]
enum Series {
    Counter(CounterCell),
    Gauge(GaugeCell),
    Histogram(HistogramCell),
    Summary(SummaryCell),
}

/// A declared metric: name, help, kind, label-name schema, and the
/// concurrency-safe map of live series keyed by rendered label text.
#[derive(Debug)]
struct Family {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
    /// Histogram boundaries, shared by all series of the family.
    buckets: Option<Arc<[f64]>>,
    series: DashMap<String, Arc<Series>>,
}

impl Family {
    /// Fetch or lazily create the series for `labels`.
    ///
    /// Creation uses the map's native insert-if-absent, so racing first
    /// observations for the same key converge on one series instance and
    /// neither caller's contribution is lost.
    fn series(&self, labels: &LabelSet) -> Arc<Series> {
        let key = labels.render(&self.label_names);
        if let Some(existing) = self.series.get(&key) {
            return Arc::clone(&existing);
        }
        let entry = self.series.entry(key).or_insert_with(|| {
            debug!(metric = %self.name, "created series");
            Arc::new(match self.kind {
                MetricKind::Counter => Series::Counter(CounterCell::default()),
                MetricKind::Gauge => Series::Gauge(GaugeCell::default()),
                MetricKind::Histogram => Series::Histogram(HistogramCell::new(Arc::clone(
                    self.buckets.as_ref().expect("histogram family has buckets"),
                ))),
                MetricKind::Summary => Series::Summary(SummaryCell::default()),
            })
        });
        Arc::clone(&entry)
    }
}

/// Process-wide store of metric families.
///
/// Families are declared once at startup through `&mut self`; record
/// operations take `&self` and are safe under unbounded concurrent callers,
/// so the registry is shared by `Arc` after declaration. There is no global
/// lock: each family keeps its series in a [`DashMap`] and every series
/// mutates through atomics.
#[derive(Debug, Default)]
pub struct Registry {
    /// Families in declaration order; exposition preserves this order.
    families: Vec<Family>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a counter family.
    pub fn declare_counter(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError> {
        self.declare(MetricKind::Counter, name, help, label_names, None)
    }

    /// Declare a gauge family.
    pub fn declare_gauge(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError> {
        self.declare(MetricKind::Gauge, name, help, label_names, None)
    }

    /// Declare a histogram family with fixed ascending bucket boundaries.
    pub fn declare_histogram(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<(), RegistryError> {
        let ascending = buckets
            .windows(2)
            .all(|pair| pair[0] < pair[1]);
        if buckets.is_empty() || !ascending || buckets.iter().any(|b| !b.is_finite()) {
            return Err(RegistryError::InvalidBuckets(name.to_string()));
        }
        self.declare(
            MetricKind::Histogram,
            name,
            help,
            label_names,
            Some(Arc::from(buckets)),
        )
    }

    /// Declare a summary family (running sum and count only).
    pub fn declare_summary(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), RegistryError> {
        self.declare(MetricKind::Summary, name, help, label_names, None)
    }

    fn declare(
        &mut self,
        kind: MetricKind,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: Option<Arc<[f64]>>,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyMetricName);
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateMetric(name.to_string()));
        }
        if label_names.iter().any(|n| n.is_empty()) {
            return Err(RegistryError::EmptyLabelName(name.to_string()));
        }
        debug!(metric = name, kind = kind.as_str(), "declared metric");
        self.by_name.insert(name.to_string(), self.families.len());
        self.families.push(Family {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_names: label_names.iter().map(|n| n.to_string()).collect(),
            buckets,
            series: DashMap::new(),
        });
        Ok(())
    }

    /// Look up a declared family, checking the expected kind.
    ///
    /// # Panics
    /// Panics if the metric was never declared or was declared with another
    /// kind; both are programming errors.
    fn family(&self, name: &str, kind: MetricKind) -> &Family {
        let index = *self
            .by_name
            .get(name)
            .unwrap_or_else(|| panic!("metric `{name}` was never declared"));
        let family = &self.families[index];
        assert!(
            family.kind == kind,
            "metric `{name}` is a {}, not a {}",
            family.kind.as_str(),
            kind.as_str(),
        );
        family
    }

    /// Add 1 to a counter series, creating it at 0 first if absent.
    pub fn inc_counter(&self, name: &str, labels: &LabelSet) {
        self.inc_counter_by(name, labels, 1);
    }

    /// Add `delta` to a counter series. Concurrent increments from any number
    /// of callers are all reflected.
    pub fn inc_counter_by(&self, name: &str, labels: &LabelSet, delta: u64) {
        match &*self.family(name, MetricKind::Counter).series(labels) {
            Series::Counter(cell) => cell.add(delta),
            _ => unreachable!("kind checked by family lookup"),
        }
    }

    /// Set a gauge series to `value` (last write wins).
    pub fn set_gauge(&self, name: &str, labels: &LabelSet, value: i64) {
        match &*self.family(name, MetricKind::Gauge).series(labels) {
            Series::Gauge(cell) => cell.set(value),
            _ => unreachable!("kind checked by family lookup"),
        }
    }

    /// Atomically add `delta` (possibly negative) to a gauge series.
    pub fn add_gauge(&self, name: &str, labels: &LabelSet, delta: i64) {
        match &*self.family(name, MetricKind::Gauge).series(labels) {
            Series::Gauge(cell) => cell.add(delta),
            _ => unreachable!("kind checked by family lookup"),
        }
    }

    /// Add 1 to a gauge series.
    pub fn inc_gauge(&self, name: &str, labels: &LabelSet) {
        self.add_gauge(name, labels, 1);
    }

    /// Subtract 1 from a gauge series.
    pub fn dec_gauge(&self, name: &str, labels: &LabelSet) {
        self.add_gauge(name, labels, -1);
    }

    /// Record one histogram observation.
    pub fn observe_histogram(&self, name: &str, labels: &LabelSet, value: f64) {
        match &*self.family(name, MetricKind::Histogram).series(labels) {
            Series::Histogram(cell) => cell.observe(value),
            _ => unreachable!("kind checked by family lookup"),
        }
    }

    /// Record one summary observation.
    pub fn observe_summary(&self, name: &str, labels: &LabelSet, value: f64) {
        match &*self.family(name, MetricKind::Summary).series(labels) {
            Series::Summary(cell) => cell.observe(value),
            _ => unreachable!("kind checked by family lookup"),
        }
    }

    /// Capture a view of every family for encoding.
    ///
    /// Each series is internally consistent; consistency across series at a
    /// single instant is not guaranteed, matching usual scrape semantics.
    /// Series are sorted by label key so encoding is deterministic.
    pub fn snapshot(&self) -> Snapshot {
        let families = self
            .families
            .iter()
            .map(|family| {
                let mut series: Vec<SeriesSnapshot> = family
                    .series
                    .iter()
                    .map(|entry| SeriesSnapshot {
                        labels: entry.key().clone(),
                        value: match &**entry.value() {
                            Series::Counter(cell) => SeriesValue::Counter(cell.get()),
                            Series::Gauge(cell) => SeriesValue::Gauge(cell.get()),
                            Series::Histogram(cell) => SeriesValue::Histogram(cell.snapshot()),
                            Series::Summary(cell) => SeriesValue::Summary {
                                sum: cell.sum(),
                                count: cell.count(),
                            },
                        },
                    })
                    .collect();
                series.sort_by(|a, b| a.labels.cmp(&b.labels));
                FamilySnapshot {
                    name: family.name.clone(),
                    help: family.help.clone(),
                    kind: family.kind,
                    buckets: family.buckets.clone(),
                    series,
                }
            })
            .collect();
        Snapshot { families }
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> String {
        encode::encode(&self.snapshot())
    }
}

/// Read-consistent-enough view of the whole registry.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub families: Vec<FamilySnapshot>,
}

#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub buckets: Option<Arc<[f64]>>,
    pub series: Vec<SeriesSnapshot>,
}

#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    /// Rendered label text, `name="value",...`; empty for label-less series.
    pub labels: String,
    pub value: SeriesValue,
}

#[derive(Debug, Clone)]
pub enum SeriesValue {
    Counter(u64),
    Gauge(i64),
    Histogram(HistogramSnapshot),
    Summary { sum: f64, count: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_labels(result: &str, cache_status: &str) -> LabelSet {
        LabelSet::new()
            .with("result", result)
            .with("cache_status", cache_status)
    }

    fn counter_value(registry: &Registry, name: &str, labels: &str) -> u64 {
        let snapshot = registry.snapshot();
        let family = snapshot
            .families
            .iter()
            .find(|f| f.name == name)
            .expect("family not found");
        let series = family
            .series
            .iter()
            .find(|s| s.labels == labels)
            .expect("series not found");
        match series.value {
            SeriesValue::Counter(v) => v,
            _ => panic!("not a counter"),
        }
    }

    #[test]
    fn declare_rejects_duplicates_and_empty_names() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &[])
            .unwrap();
        assert!(matches!(
            registry.declare_gauge("requests_total", "Requests", &[]),
            Err(RegistryError::DuplicateMetric(_))
        ));
        assert!(matches!(
            registry.declare_counter("", "Nameless", &[]),
            Err(RegistryError::EmptyMetricName)
        ));
        assert!(matches!(
            registry.declare_counter("labelled", "Bad label", &[""]),
            Err(RegistryError::EmptyLabelName(_))
        ));
    }

    #[test]
    fn declare_rejects_unsorted_buckets() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.declare_histogram("latency", "Latency", &[], &[0.5, 0.1]),
            Err(RegistryError::InvalidBuckets(_))
        ));
        assert!(matches!(
            registry.declare_histogram("latency", "Latency", &[], &[]),
            Err(RegistryError::InvalidBuckets(_))
        ));
    }

    #[test]
    fn concurrent_counter_increments_all_land() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &["result", "cache_status"])
            .unwrap();

        let labels = request_labels("spam", "miss");
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..5_000 {
                        registry.inc_counter("requests_total", &labels);
                    }
                });
            }
        });

        assert_eq!(
            counter_value(
                &registry,
                "requests_total",
                r#"result="spam",cache_status="miss""#
            ),
            40_000
        );
    }

    #[test]
    fn racing_first_observations_share_one_series() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &["result"])
            .unwrap();

        // Every thread performs a first-time observation against a fresh key,
        // all for the same label set: exactly one series must come out of it,
        // holding every increment.
        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    registry.inc_counter("requests_total", &LabelSet::new().with("result", "ham"));
                });
            }
        });

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.families[0].series.len(), 1);
        assert_eq!(
            counter_value(&registry, "requests_total", r#"result="ham""#),
            16
        );
    }

    #[test]
    fn label_permutations_hit_the_same_series() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &["result", "cache_status"])
            .unwrap();

        registry.inc_counter(
            "requests_total",
            &LabelSet::new()
                .with("result", "spam")
                .with("cache_status", "hit"),
        );
        registry.inc_counter(
            "requests_total",
            &LabelSet::new()
                .with("cache_status", "hit")
                .with("result", "spam"),
        );

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.families[0].series.len(), 1);
        assert_eq!(
            counter_value(
                &registry,
                "requests_total",
                r#"result="spam",cache_status="hit""#
            ),
            2
        );
    }

    #[test]
    fn distinct_label_values_create_distinct_series() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &["result"])
            .unwrap();
        registry.inc_counter("requests_total", &LabelSet::new().with("result", "spam"));
        registry.inc_counter("requests_total", &LabelSet::new().with("result", "ham"));
        assert_eq!(registry.snapshot().families[0].series.len(), 2);
    }

    #[test]
    fn gauge_set_add_inc_dec() {
        let mut registry = Registry::new();
        registry
            .declare_gauge("active_requests", "Active requests", &[])
            .unwrap();

        let labels = LabelSet::new();
        registry.set_gauge("active_requests", &labels, 10);
        registry.add_gauge("active_requests", &labels, -4);
        registry.inc_gauge("active_requests", &labels);
        registry.dec_gauge("active_requests", &labels);
        registry.dec_gauge("active_requests", &labels);

        let snapshot = registry.snapshot();
        match snapshot.families[0].series[0].value {
            SeriesValue::Gauge(v) => assert_eq!(v, 5),
            _ => panic!("not a gauge"),
        }
    }

    #[test]
    fn summary_accumulates_sum_and_count() {
        let mut registry = Registry::new();
        registry
            .declare_summary("message_length", "Message length", &[])
            .unwrap();
        registry.observe_summary("message_length", &LabelSet::new(), 42.0);
        registry.observe_summary("message_length", &LabelSet::new(), 8.0);

        let snapshot = registry.snapshot();
        match snapshot.families[0].series[0].value {
            SeriesValue::Summary { sum, count } => {
                assert_eq!(sum, 50.0);
                assert_eq!(count, 2);
            }
            _ => panic!("not a summary"),
        }
    }

    #[test]
    #[should_panic(expected = "was never declared")]
    fn recording_an_undeclared_metric_panics() {
        Registry::new().inc_counter("missing_total", &LabelSet::new());
    }

    #[test]
    #[should_panic(expected = "is a counter, not a gauge")]
    fn kind_mismatch_panics() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &[])
            .unwrap();
        registry.set_gauge("requests_total", &LabelSet::new(), 1);
    }

    #[test]
    #[should_panic(expected = "missing declared label")]
    fn mismatched_label_set_panics() {
        let mut registry = Registry::new();
        registry
            .declare_counter("requests_total", "Requests", &["result"])
            .unwrap();
        registry.inc_counter("requests_total", &LabelSet::new().with("other", "x"));
    }
}
