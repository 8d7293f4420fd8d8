//! Schedule model
//!
//! A Schedule is a named recurring extraction: which extractor feeds which
//! loader, on what interval, with which environment overrides. Schedules
//! live in the project file and are immutable from the generator's
//! perspective.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Sentinel interval meaning manual-only execution (never scheduled)
pub const INTERVAL_ONCE: &str = "@once";

/// Interval presets understood by the orchestrator
const INTERVAL_PRESETS: &[&str] = &["@once", "@hourly", "@daily", "@weekly", "@monthly", "@yearly"];

/// Invalid recurrence interval
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Interval cannot be empty")]
    Empty,

    #[error("Unknown interval preset: {0}")]
    UnknownPreset(String),

    #[error("Cron expression must have 5 fields, got {0}")]
    WrongFieldCount(usize),

    #[error("Invalid cron field: {0}")]
    InvalidField(String),
}

/// Surface-validate a recurrence interval.
///
/// Accepts the `@`-presets or a 5-field cron expression. Only the field
/// shape is checked; full cron semantics belong to the orchestrator.
pub fn validate_interval(interval: &str) -> Result<(), IntervalError> {
    let interval = interval.trim();
    if interval.is_empty() {
        return Err(IntervalError::Empty);
    }

    if let Some(stripped) = interval.strip_prefix('@') {
        if INTERVAL_PRESETS.contains(&interval) {
            return Ok(());
        }
        return Err(IntervalError::UnknownPreset(format!("@{}", stripped)));
    }

    let fields: Vec<&str> = interval.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(IntervalError::WrongFieldCount(fields.len()));
    }

    for field in fields {
        let valid = field
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '*' | '/' | '-' | ','));
        if !valid {
            return Err(IntervalError::InvalidField(field.to_string()));
        }
    }

    Ok(())
}

/// Whether the transform step runs after extract/load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// Extract and load only
    #[default]
    Skip,
    /// Extract, load, then transform
    Run,
    /// Transform only, no extract/load
    Only,
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Run => write!(f, "run"),
            Self::Only => write!(f, "only"),
        }
    }
}

impl std::str::FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "run" => Ok(Self::Run),
            "only" => Ok(Self::Only),
            _ => Err(format!("Unknown transform: {}. Use: skip, run, or only", s)),
        }
    }
}

/// A named recurring extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Unique schedule name, doubles as the job identifier in run history
    pub name: String,

    /// Recurrence interval: cron expression, preset, or `@once`
    pub interval: String,

    /// Extractor plugin identifier
    pub extractor: String,

    /// Loader plugin identifier
    pub loader: String,

    /// Transform step behavior
    #[serde(default)]
    pub transform: Transform,

    /// First date the orchestrator may run this schedule
    #[serde(rename = "start-date", default, deserialize_with = "deserialize_start_date")]
    pub start_date: Option<NaiveDateTime>,

    /// Environment overrides applied on top of the ambient environment
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Schedule {
    pub fn new(name: impl Into<String>, extractor: impl Into<String>, loader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval: INTERVAL_ONCE.to_string(),
            extractor: extractor.into(),
            loader: loader.into(),
            transform: Transform::default(),
            start_date: None,
            env: HashMap::new(),
        }
    }

    /// Set the recurrence interval
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    /// Set the transform behavior
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the start date
    pub fn with_start_date(mut self, start_date: NaiveDateTime) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Check if this schedule is manual-only
    pub fn is_once(&self) -> bool {
        self.interval == INTERVAL_ONCE
    }
}

/// Parse a start date, accepting either a date (coerced to midnight) or
/// a full datetime
pub fn parse_start_date(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }
    Err(format!("Invalid start-date: {}", raw))
}

fn deserialize_start_date<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        Some(raw) => parse_start_date(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
