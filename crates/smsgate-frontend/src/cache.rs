use dashmap::DashMap;

/// Message-to-result prediction cache.
///
/// A disabled cache never stores and never hits, so callers can keep one code
/// path regardless of configuration.
#[derive(Debug)]
pub struct PredictionCache {
    enabled: bool,
    entries: DashMap<String, String>,
}

impl PredictionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, message: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        self.entries.get(message).map(|entry| entry.clone())
    }

    pub fn put(&self, message: &str, result: &str) {
        if !self.enabled {
            return;
        }
        self.entries.insert(message.to_string(), result.to_string());
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
