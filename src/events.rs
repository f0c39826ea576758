// Core relations for the funnel pipeline
//
// Event is the read-only input; FunnelStep and FunnelSession are derived
// tables, fully recomputed on every run. Using typed records instead of a
// query engine keeps the ordering- and gap-sensitive semantics explicit.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Funnel stage kinds observed in the clickstream
///
/// Unrecognized kinds pass through as an opaque category rather than being
/// rejected; the funnel flags simply never match them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    View,
    AddToCart,
    Transaction,
    Other(String),
}

impl EventKind {
    /// Parse the wire value. Never fails: unknown kinds become `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "view" => Self::View,
            "addtocart" => Self::AddToCart,
            "transaction" => Self::Transaction,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire value as written to artifacts
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::AddToCart => "addtocart",
            Self::Transaction => "transaction",
            Self::Other(s) => s.as_str(),
        }
    }
}

/// A single clickstream event as loaded from the raw export
///
/// `user_id` and `sku` are strings even when they look numeric, so "101"
/// survives unchanged rather than becoming 101.0 somewhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub user_id: String,
    pub ts: NaiveDateTime,
    pub kind: EventKind,
    pub sku: String,
}

/// An event annotated with its per-user session sequence number
#[derive(Debug, Clone)]
pub struct SessionizedEvent {
    pub event: Event,
    pub session_seq: u64,
}

/// One ordered step within a session
#[derive(Debug, Clone)]
pub struct FunnelStep {
    pub user_id: String,
    pub session_id: String,
    pub ts: NaiveDateTime,
    pub kind: EventKind,
    pub sku: String,
    /// 1-based rank within the session, ordered by timestamp
    pub step_order: u64,
}

/// Session-level funnel flags (existence aggregate over FunnelStep)
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelSession {
    pub session_id: String,
    pub has_view: bool,
    pub has_cart: bool,
    pub has_purchase: bool,
}

impl FunnelSession {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            has_view: false,
            has_cart: false,
            has_purchase: false,
        }
    }
}

/// Structured result of a full pipeline run
///
/// Callers get counts and rates as values, never by scraping log lines;
/// rates are absent when their denominator is zero.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub events_count: usize,
    pub steps_count: usize,
    pub session_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_to_cart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_to_purchase_rate: Option<f64>,
}

/// Parse a raw timestamp field into a timezone-naive instant.
///
/// Accepted encodings, tried in order:
/// 1. integer Unix epoch milliseconds (the RetailRocket export format)
/// 2. `YYYY-MM-DD HH:MM:SS` with optional fractional seconds
/// 3. RFC 3339 (offset normalized to UTC, then dropped)
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Format a timestamp for artifact output.
///
/// Sub-second precision is appended only when present, so whole-second data
/// round-trips without trailing zeros.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
