use std::collections::BTreeMap;

/// Unordered set of label name/value pairs attached to a metric observation.
///
/// Two label sets are equal iff they hold the same pairs, regardless of the
/// order they were inserted in. Backed by a [`BTreeMap`] so iteration (and
/// therefore key rendering) is stable.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a label, returning `self` for chaining.
    ///
    /// # Panics
    /// Panics if `name` is empty; an empty label name is a programming error,
    /// not a runtime condition.
    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite a label.
    ///
    /// # Panics
    /// Panics if `name` is empty.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        assert!(!name.is_empty(), "label name cannot be empty");
        self.0.insert(name, value.into());
        self
    }

    /// Get the value for a label name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.as_str())
    }

    /// Number of labels in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no labels are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate through all labels as `(&str, &str)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Render the set as exposition-format label text, `a="x",b="y"`, with the
    /// names emitted in the order given by `order`.
    ///
    /// The result doubles as the series map key: names are fixed per metric
    /// family and values are quoted and escaped, so no two distinct value
    /// combinations collapse to the same string, and any insertion order of
    /// the same pairs renders identically.
    ///
    /// # Panics
    /// Panics if the set does not contain exactly the names in `order`; a
    /// mismatched label set is a programming error.
    pub(crate) fn render(&self, order: &[String]) -> String {
        assert_eq!(
            self.0.len(),
            order.len(),
            "label set {{{}}} does not match declared label names [{}]",
            self.describe(),
            order.join(", "),
        );
        let mut out = String::new();
        for name in order {
            let value = self.get(name).unwrap_or_else(|| {
                panic!(
                    "label set {{{}}} is missing declared label `{}`",
                    self.describe(),
                    name
                )
            });
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(name);
            out.push_str("=\"");
            escape_label_value(&mut out, value);
            out.push('"');
        }
        out
    }

    fn describe(&self) -> String {
        self.0
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Escape a label value per the Prometheus text format: backslash, double
/// quote, and line feed.
pub(crate) fn escape_label_value(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
}

/// Escape HELP text per the Prometheus text format: backslash and line feed
/// (double quotes are allowed verbatim in help text).
pub(crate) fn escape_help(out: &mut String, help: &str) {
    for ch in help.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
}
