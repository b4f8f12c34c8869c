use std::fmt::Display;

use crate::labels::escape_help;
use crate::registry::{FamilySnapshot, SeriesValue, Snapshot};

/// Render a registry snapshot in the Prometheus text exposition format
/// (version 0.0.4).
///
/// Families are emitted in declaration order, series within a family in label
/// key order, so two renders of the same snapshot are byte-identical.
/// Encoding is total: an empty snapshot yields an empty string and a family
/// with no live series yields only its HELP/TYPE header.
pub fn encode(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for family in &snapshot.families {
        out.push_str("# HELP ");
        out.push_str(&family.name);
        out.push(' ');
        escape_help(&mut out, &family.help);
        out.push('\n');
        out.push_str("# TYPE ");
        out.push_str(&family.name);
        out.push(' ');
        out.push_str(family.kind.as_str());
        out.push('\n');

        for series in &family.series {
            match &series.value {
                SeriesValue::Counter(value) => {
                    data_line(&mut out, &family.name, "", &series.labels, value);
                }
                SeriesValue::Gauge(value) => {
                    data_line(&mut out, &family.name, "", &series.labels, value);
                }
                SeriesValue::Summary { sum, count } => {
                    data_line(&mut out, &family.name, "_sum", &series.labels, sum);
                    data_line(&mut out, &family.name, "_count", &series.labels, count);
                }
                SeriesValue::Histogram(hist) => {
                    let bounds = family
                        .buckets
                        .as_ref()
                        .expect("histogram family has buckets");
                    let mut cumulative = 0u64;
                    for (index, bound) in bounds.iter().enumerate() {
                        cumulative += hist.bucket_counts[index];
                        bucket_line(&mut out, family, &series.labels, bound, cumulative);
                    }
                    // The +Inf bucket also covers values above the largest
                    // finite boundary, so it equals the total count.
                    bucket_line(&mut out, family, &series.labels, &"+Inf", hist.count);
                    data_line(&mut out, &family.name, "_sum", &series.labels, &hist.sum);
                    data_line(&mut out, &family.name, "_count", &series.labels, &hist.count);
                }
            }
        }
    }
    out
}

/// One data line: `name{labels} value`, braces omitted for label-less series.
///
/// Integral values arrive as `u64`/`i64` and render without a decimal point;
/// `f64` sums use `Display`, which prints the shortest decimal text that
/// round-trips, so boundaries and sums keep their natural representation.
fn data_line(out: &mut String, name: &str, suffix: &str, labels: &str, value: &dyn Display) {
    out.push_str(name);
    out.push_str(suffix);
    if !labels.is_empty() {
        out.push('{');
        out.push_str(labels);
        out.push('}');
    }
    out.push(' ');
    out.push_str(&value.to_string());
    out.push('\n');
}

fn bucket_line(
    out: &mut String,
    family: &FamilySnapshot,
    labels: &str,
    bound: &dyn Display,
    count: u64,
) {
    out.push_str(&family.name);
    out.push_str("_bucket{");
    if !labels.is_empty() {
        out.push_str(labels);
        out.push(',');
    }
    out.push_str("le=\"");
    out.push_str(&bound.to_string());
    out.push_str("\"} ");
    out.push_str(&count.to_string());
    out.push('\n');
}
