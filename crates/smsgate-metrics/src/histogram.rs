use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::series::SumCell;

/// Cumulative histogram storage for one label set.
///
/// Boundaries are fixed at family declaration and shared by every series of
/// the metric. Each bucket holds the *exact* count of observations that
/// selected it; the cumulative "number of observations ≤ boundary" view is
/// produced by the encoder, which sums buckets in ascending order.
#[derive(Debug)]
pub(crate) struct HistogramCell {
    bounds: Arc<[f64]>,
    buckets: Box<[AtomicU64]>,
    sum: SumCell,
    count: AtomicU64,
}

impl HistogramCell {
    pub(crate) fn new(bounds: Arc<[f64]>) -> Self {
        let buckets = (0..bounds.len())
            .map(|_| AtomicU64::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            bounds,
            buckets,
            sum: SumCell::new(),
            count: AtomicU64::new(0),
        }
    }

    /// Record one observation.
    ///
    /// The first boundary `b` (ascending) with `value <= b` gets the exact
    /// count; a value equal to a boundary belongs to that boundary's bucket.
    /// A value above the largest boundary lands in no finite bucket but still
    /// counts toward sum, total count, and the implicit `+Inf` bucket at
    /// encode time.
    ///
    /// # Panics
    /// Panics on NaN; observing NaN is a programming error.
    pub(crate) fn observe(&self, value: f64) {
        assert!(!value.is_nan(), "cannot observe NaN");
        if let Some(index) = self.bounds.iter().position(|bound| value <= *bound) {
            self.buckets[index].fetch_add(1, Ordering::Relaxed);
        }
        self.sum.add(value);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            bucket_counts: self
                .buckets
                .iter()
                .map(|b| b.load(Ordering::Relaxed))
                .collect(),
            sum: self.sum.get(),
            count: self.count.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of one histogram series.
///
/// `bucket_counts` are exact per-bucket counts, index-aligned with the
/// family's boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub bucket_counts: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}

impl HistogramSnapshot {
    /// Cumulative count at bucket `index`: its own exact count plus all
    /// smaller boundaries' exact counts.
    pub fn cumulative(&self, index: usize) -> u64 {
        self.bucket_counts[..=index].iter().sum()
    }
}
