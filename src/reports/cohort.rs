//! Cohort retention: return activity by month of a user's first session
//!
//! Cohort = calendar month of the user's first-ever session start. For each
//! cohort and month offset, counts the distinct cohort users with at least
//! one session starting that many months later.

use super::{ReportKind, StepTable};
use crate::artifacts::ArtifactStore;
use crate::error::{PipelineError, Result};
use crate::events::parse_timestamp;
use chrono::{Datelike, NaiveDateTime};
use std::collections::{HashMap, HashSet};

const HEADER: [&str; 5] = [
    "cohort_month",
    "month_offset",
    "active_users",
    "cohort_size",
    "retention_pct",
];

/// Months since year 0; turns calendar months into a flat offset axis
fn month_index(ts: NaiveDateTime) -> i32 {
    ts.year() * 12 + ts.month0() as i32
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

pub(crate) fn run(store: &ArtifactStore, table: &StepTable) -> Result<usize> {
    let kind = ReportKind::CohortRetention;
    let user_col = table.column(kind, "user_id")?;
    let session_col = table.column(kind, "session_id")?;
    let ts_col = table.column(kind, "ts")?;

    // Session start = earliest step in the session
    let mut session_start: HashMap<String, (String, NaiveDateTime)> = HashMap::new();
    for record in table.records() {
        let raw_ts = record.get(ts_col).unwrap_or("");
        let ts = parse_timestamp(raw_ts).ok_or_else(|| {
            PipelineError::query(kind.name(), format!("unparseable ts {raw_ts:?}"))
        })?;
        let user = record.get(user_col).unwrap_or("").to_string();
        let session = record.get(session_col).unwrap_or("").to_string();
        session_start
            .entry(session)
            .and_modify(|(_, start)| {
                if ts < *start {
                    *start = ts;
                }
            })
            .or_insert((user, ts));
    }

    // The user's first session start anchors their cohort
    let mut first_seen: HashMap<&str, NaiveDateTime> = HashMap::new();
    for (user, start) in session_start.values() {
        first_seen
            .entry(user.as_str())
            .and_modify(|t| {
                if *start < *t {
                    *t = *start;
                }
            })
            .or_insert(*start);
    }

    let mut cohort_users: HashMap<i32, HashSet<&str>> = HashMap::new();
    for (user, first) in &first_seen {
        cohort_users
            .entry(month_index(*first))
            .or_default()
            .insert(*user);
    }

    let mut active: HashMap<(i32, i32), HashSet<&str>> = HashMap::new();
    for (user, start) in session_start.values() {
        if let Some(first) = first_seen.get(user.as_str()) {
            let cohort = month_index(*first);
            let offset = month_index(*start) - cohort;
            active
                .entry((cohort, offset))
                .or_default()
                .insert(user.as_str());
        }
    }

    let mut rows: Vec<(i32, i32, usize, usize)> = active
        .iter()
        .map(|(&(cohort, offset), users)| {
            let size = cohort_users.get(&cohort).map_or(0, HashSet::len);
            (cohort, offset, users.len(), size)
        })
        .collect();
    rows.sort_unstable();

    store.write_csv(
        "cohort_retention.csv",
        &HEADER,
        rows.into_iter().map(|(cohort, offset, active, size)| {
            let pct = if size > 0 {
                active as f64 / size as f64 * 100.0
            } else {
                0.0
            };
            vec![
                month_label(cohort),
                offset.to_string(),
                active.to_string(),
                size.to_string(),
                format!("{pct:.2}"),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index_and_label() {
        let ts = parse_timestamp("2024-01-15 10:00:00").unwrap();
        assert_eq!(month_label(month_index(ts)), "2024-01");
        let dec = parse_timestamp("2023-12-31 23:59:59").unwrap();
        assert_eq!(month_index(ts) - month_index(dec), 1);
    }
}
