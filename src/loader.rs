//! Event loader: raw CSV export -> typed Event relation
//!
//! The input format is fixed: header row `user_id,timestamp,event,itemid`,
//! comma delimited, columns in that order. Anything else is a fatal
//! input-format error. The load is all-or-nothing: one bad row fails the
//! whole file, and no partial relation is ever returned.

use crate::error::{PipelineError, Result};
use crate::events::{parse_timestamp, Event, EventKind};
use crate::funnel::SESSION_ID_SEPARATOR;
use std::path::Path;

/// Expected input header, fixed order
pub const INPUT_COLUMNS: [&str; 4] = ["user_id", "timestamp", "event", "itemid"];

/// Load the raw event export at `path` into a typed relation.
///
/// User and item ids are carried as strings so numeric-looking values
/// survive unchanged. An unparseable timestamp fails the load with the
/// offending line number; rows are never skipped.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    if !path.exists() {
        return Err(PipelineError::missing_input(path));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let actual: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
    if actual != INPUT_COLUMNS {
        return Err(PipelineError::malformed(format!(
            "expected header {:?}, found {:?}",
            INPUT_COLUMNS.join(","),
            actual.join(",")
        )));
    }

    let mut events = Vec::new();
    let mut warned_separator = false;
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1; data starts on line 2
        let line = idx + 2;

        if record.len() != INPUT_COLUMNS.len() {
            return Err(PipelineError::malformed(format!(
                "line {}: expected {} columns, found {}",
                line,
                INPUT_COLUMNS.len(),
                record.len()
            )));
        }

        let user_id = record[0].trim().to_string();
        let raw_ts = record[1].trim();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| {
            PipelineError::malformed(format!("line {line}: unparseable timestamp {raw_ts:?}"))
        })?;

        // Session ids are "<user_id>-<seq>". A user id containing the
        // separator makes them ambiguous; documented constraint, so warn
        // rather than reject.
        if !warned_separator && user_id.contains(SESSION_ID_SEPARATOR) {
            tracing::warn!(
                user_id = %user_id,
                "user id contains the session id separator '{}'; session ids for this user are ambiguous",
                SESSION_ID_SEPARATOR
            );
            warned_separator = true;
        }

        events.push(Event {
            user_id,
            ts,
            kind: EventKind::parse(record[2].trim()),
            sku: record[3].trim().to_string(),
        });
    }

    tracing::info!(events = events.len(), path = %path.display(), "events loaded");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_input(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_input(
            "user_id,timestamp,event,itemid\n\
             101,2024-01-15 10:00:00,view,5005\n\
             101,1433221332117,addtocart,5005\n",
        );
        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        // Numeric-looking ids stay strings
        assert_eq!(events[0].user_id, "101");
        assert_eq!(events[0].sku, "5005");
        assert_eq!(events[0].kind, EventKind::View);
        assert_eq!(events[1].kind, EventKind::AddToCart);
    }

    #[test]
    fn test_unknown_event_kind_passes_through() {
        let file = write_input(
            "user_id,timestamp,event,itemid\n\
             1,2024-01-15 10:00:00,wishlist,7\n",
        );
        let events = load_events(file.path()).unwrap();
        assert_eq!(events[0].kind, EventKind::Other("wishlist".to_string()));
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let err = load_events(Path::new("/nonexistent/events.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn test_renamed_column_is_fatal() {
        let file = write_input(
            "uid,timestamp,event,itemid\n\
             1,2024-01-15 10:00:00,view,7\n",
        );
        let err = load_events(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_bad_timestamp_fails_whole_load() {
        let file = write_input(
            "user_id,timestamp,event,itemid\n\
             1,2024-01-15 10:00:00,view,7\n\
             1,not-a-time,view,7\n",
        );
        let err = load_events(file.path()).unwrap_err();
        match err {
            PipelineError::MalformedInput { context } => {
                assert!(context.contains("line 3"), "got: {context}");
            }
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_fatal() {
        let file = write_input(
            "user_id,timestamp,event,itemid\n\
             1,2024-01-15 10:00:00,view\n",
        );
        let err = load_events(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }
}
