//! Per-database index of measurements and their tag-set series.
//!
//! A series is a measurement name plus a distinct sorted tag set; it exists
//! in the index exactly while at least one written point with that tag set
//! has not been dropped. Measurements are not separately addressable:
//! dropping the last series of a measurement removes the measurement from
//! all listings.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The tag key/value pairs identifying one series. Sorted by key, which
/// fixes both the series key rendering and the listing column order.
pub type TagSet = BTreeMap<String, String>;

/// How `DROP SERIES FROM ...` selects measurements: an exact name or a
/// regular expression over measurement names.
#[derive(Debug, Clone)]
pub enum MeasurementMatcher {
    Name(String),
    Regex(Regex),
}

impl MeasurementMatcher {
    pub fn matches(&self, measurement: &str) -> bool {
        match self {
            Self::Name(name) => name == measurement,
            Self::Regex(re) => re.is_match(measurement),
        }
    }
}

/// Series dropped from one measurement, reported so the storage engine can
/// be told to reclaim the underlying data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSeries {
    pub measurement: Arc<str>,
    pub keys: Vec<Arc<str>>,
}

/// The live series of a single measurement, keyed by series key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSeries {
    series: BTreeMap<Arc<str>, TagSet>,
}

impl MeasurementSeries {
    /// Series in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &TagSet)> {
        self.series.iter()
    }

    /// The union of tag keys across all live series, sorted.
    pub fn tag_keys(&self) -> BTreeSet<&str> {
        self.series
            .values()
            .flat_map(|tags| tags.keys().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// All live series of one database, grouped by measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesIndex {
    measurements: BTreeMap<Arc<str>, MeasurementSeries>,
}

impl SeriesIndex {
    /// Record a series for `measurement`. Idempotent; this is the only
    /// insertion path and is driven by the write path, not by commands.
    pub fn record_series(&mut self, measurement: &str, tags: TagSet) {
        let key = series_key(measurement, &tags);
        self.measurements
            .entry(Arc::from(measurement))
            .or_default()
            .series
            .insert(Arc::from(key.as_str()), tags);
    }

    /// Drop every series of the measurements selected by `matcher` whose
    /// tag set passes `filter`. Measurements left without series disappear
    /// from the index. Selecting zero measurements is a no-op, not an
    /// error.
    pub fn drop_series<F>(&mut self, matcher: &MeasurementMatcher, filter: F) -> Vec<DroppedSeries>
    where
        F: Fn(&TagSet) -> bool,
    {
        let mut dropped = Vec::new();
        for (measurement, series) in &mut self.measurements {
            if !matcher.matches(measurement) {
                continue;
            }
            let keys: Vec<Arc<str>> = series
                .series
                .iter()
                .filter(|(_, tags)| filter(tags))
                .map(|(key, _)| Arc::clone(key))
                .collect();
            if keys.is_empty() {
                continue;
            }
            for key in &keys {
                series.series.remove(key);
            }
            dropped.push(DroppedSeries {
                measurement: Arc::clone(measurement),
                keys,
            });
        }
        self.measurements.retain(|_, series| !series.is_empty());
        dropped
    }

    /// Measurements with at least one live series, in lexicographic order.
    pub fn measurements(&self) -> impl Iterator<Item = (&Arc<str>, &MeasurementSeries)> {
        self.measurements.iter()
    }

    pub fn measurement(&self, name: &str) -> Option<&MeasurementSeries> {
        self.measurements.get(name)
    }

    /// The union of tag keys across every measurement, used to classify
    /// `WHERE` clause references before any deletion happens.
    pub fn tag_keys(&self) -> BTreeSet<&str> {
        self.measurements
            .values()
            .flat_map(|series| series.tag_keys())
            .collect()
    }

    /// Total number of live series across all measurements.
    pub fn series_count(&self) -> usize {
        self.measurements.values().map(MeasurementSeries::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

/// Canonical series key: the measurement name followed by `key=value`
/// pairs in tag key order, e.g. `cpu,host=serverA,region=uswest`.
pub fn series_key(measurement: &str, tags: &TagSet) -> String {
    let mut key = measurement.to_string();
    for (tag_key, tag_value) in tags {
        key.push(',');
        key.push_str(tag_key);
        key.push('=');
        key.push_str(tag_value);
    }
    key
}
