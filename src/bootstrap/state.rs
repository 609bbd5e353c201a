//! Process-wide bootstrap state and the records it accumulates.
//!
//! # Invariants
//! - Component log keys are unique and kept in insertion order
//! - Records are immutable once written
//! - `initialized == true` implies every registered component logged success

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

use crate::bootstrap::component::ComponentName;

/// Outcome of a logged component initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Success,
}

/// A successful component initialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRecord {
    pub status: ComponentStatus,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_duration")]
    pub duration: Duration,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: SystemTime,
}

impl ComponentRecord {
    pub fn success(duration: Duration, timestamp: SystemTime) -> Self {
        Self {
            status: ComponentStatus::Success,
            duration,
            timestamp,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// A failed component initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub source_location: String,
    pub line_number: u32,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: SystemTime,
}

/// Insertion-ordered, append-only log of successful initializations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentLog {
    entries: Vec<(ComponentName, ComponentRecord)>,
}

impl ComponentLog {
    pub fn contains(&self, name: ComponentName) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn get(&self, name: ComponentName) -> Option<&ComponentRecord> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, r)| r)
    }

    pub fn names(&self) -> Vec<ComponentName> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentName, &ComponentRecord)> {
        self.entries.iter().map(|(n, r)| (*n, r))
    }

    pub fn first(&self) -> Option<(ComponentName, &ComponentRecord)> {
        self.iter().next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a record. Returns `false` (and leaves the log untouched) if
    /// the name is already present.
    pub(crate) fn append(&mut self, name: ComponentName, record: ComponentRecord) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((name, record));
        true
    }
}

impl Serialize for ComponentLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Errors from the most recent failed attempt.
pub type ErrorLog = BTreeMap<ComponentName, ErrorRecord>;

/// Everything the sequencer knows about this process.
#[derive(Debug, Clone, Default)]
pub struct ProcessState {
    pub initialized: bool,
    /// Set while a run is underway; `initialized` is already true then.
    pub(crate) in_progress: bool,
    pub component_log: ComponentLog,
    pub component_errors: ErrorLog,
}

impl ProcessState {
    pub fn health(&self) -> HealthReport {
        if !self.initialized || self.in_progress {
            return HealthReport::NotInitialized;
        }

        let per_component: BTreeMap<_, _> = self
            .component_log
            .iter()
            .map(|(name, record)| {
                (
                    name,
                    ComponentHealth {
                        status: record.status,
                        duration_seconds: record.duration_seconds(),
                    },
                )
            })
            .collect();

        let total_duration_seconds = self
            .component_log
            .iter()
            .map(|(_, record)| record.duration_seconds())
            .sum();

        let initialized_at = self
            .component_log
            .first()
            .map(|(_, record)| unix_seconds(record.timestamp))
            .unwrap_or_default();

        HealthReport::Healthy {
            per_component,
            total_duration_seconds,
            initialized_at,
        }
    }
}

/// Per-component entry in a [`HealthReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub duration_seconds: f64,
}

/// Snapshot for health endpoints.
///
/// Serializes as `{"status": "not_initialized"}` or
/// `{"status": "healthy", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthReport {
    NotInitialized,
    Healthy {
        per_component: BTreeMap<ComponentName, ComponentHealth>,
        total_duration_seconds: f64,
        /// Unix seconds at which the first component was logged.
        initialized_at: f64,
    },
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthReport::Healthy { .. })
    }
}

/// Seconds since the Unix epoch; times before the epoch clamp to zero.
pub fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn serialize_timestamp<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(unix_seconds(*time))
}
