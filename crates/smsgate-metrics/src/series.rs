use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Monotonically increasing event count.
///
/// `Relaxed` ordering is sufficient: no cross-cell ordering is required, only
/// that no increment is lost.
#[derive(Debug, Default)]
pub(crate) struct CounterCell(AtomicU64);

impl CounterCell {
    pub(crate) fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Signed point-in-time value: last-write-wins `set`, atomic `add`.
#[derive(Debug, Default)]
pub(crate) struct GaugeCell(AtomicI64);

impl GaugeCell {
    pub(crate) fn set(&self, value: i64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub(crate) fn add(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// `f64` accumulator stored as bits in an `AtomicU64`.
///
/// Addition is a compare-and-swap loop, so concurrent adds are never lost and
/// reads never observe a torn value.
#[derive(Debug)]
pub(crate) struct SumCell(AtomicU64);

impl SumCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(0f64.to_bits()))
    }

    pub(crate) fn add(&self, value: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl Default for SumCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Running sum and count of observed values; no quantiles are computed.
#[derive(Debug, Default)]
pub(crate) struct SummaryCell {
    sum: SumCell,
    count: CounterCell,
}

impl SummaryCell {
    /// Record one observation.
    ///
    /// # Panics
    /// Panics on NaN; observing NaN is a programming error.
    pub(crate) fn observe(&self, value: f64) {
        assert!(!value.is_nan(), "cannot observe NaN");
        self.sum.add(value);
        self.count.add(1);
    }

    pub(crate) fn sum(&self) -> f64 {
        self.sum.get()
    }

    pub(crate) fn count(&self) -> u64 {
        self.count.get()
    }
}
