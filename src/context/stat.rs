//! Metrics client handle.

use metrics::Label;
use std::time::Duration;

/// A metrics client shared by all invocations.
pub trait Stat: Send + Sync {
    /// Increment a counter.
    fn count(&self, name: &str, value: u64, tags: &[(&str, &str)]);

    /// Set a gauge.
    fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]);

    /// Record a histogram sample.
    fn histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]);

    /// Record a duration, in seconds.
    fn timing(&self, name: &str, value: Duration, tags: &[(&str, &str)]) {
        self.histogram(name, value.as_secs_f64(), tags);
    }
}

/// `Stat` implementation backed by the `metrics` facade.
///
/// Metric names are prefixed with `{prefix}_` and every sample carries the
/// client's base tags in addition to the per-call tags.
#[derive(Debug, Clone, Default)]
pub struct MetricsStat {
    prefix: String,
    tags: Vec<(String, String)>,
}

impl MetricsStat {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tags: Vec::new(),
        }
    }

    /// Add a tag attached to every sample.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.prefix, name)
        }
    }

    fn labels(&self, tags: &[(&str, &str)]) -> Vec<Label> {
        self.tags
            .iter()
            .map(|(k, v)| Label::new(k.clone(), v.clone()))
            .chain(tags.iter().map(|(k, v)| Label::new(k.to_string(), v.to_string())))
            .collect()
    }
}

impl Stat for MetricsStat {
    fn count(&self, name: &str, value: u64, tags: &[(&str, &str)]) {
        metrics::counter!(self.key(name), self.labels(tags)).increment(value);
    }

    fn gauge(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        metrics::gauge!(self.key(name), self.labels(tags)).set(value);
    }

    fn histogram(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        metrics::histogram!(self.key(name), self.labels(tags)).record(value);
    }
}

/// A `Stat` that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopStat;

impl Stat for NopStat {
    fn count(&self, _name: &str, _value: u64, _tags: &[(&str, &str)]) {}
    fn gauge(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
    fn histogram(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_stat_key_prefix() {
        assert_eq!(MetricsStat::new("funcgate").key("invocations"), "funcgate_invocations");
        assert_eq!(MetricsStat::default().key("invocations"), "invocations");
    }

    #[test]
    fn test_metrics_stat_labels_merge_base_tags() {
        let stat = MetricsStat::new("funcgate").tag("service", "api");
        let labels = stat.labels(&[("function", "echo")]);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].key(), "service");
        assert_eq!(labels[1].key(), "function");
        assert_eq!(labels[1].value(), "echo");
    }

    #[test]
    fn test_metrics_stat_without_recorder_is_noop() {
        let stat = MetricsStat::new("funcgate");
        stat.count("invocations", 1, &[("function", "echo")]);
        stat.timing("duration", Duration::from_millis(5), &[]);
    }
}
