//! Sessionizer: split each user's event stream on inactivity gaps
//!
//! A single grouped scan: each user's events are stable-sorted by timestamp
//! and walked once with a counter that increments whenever the gap to the
//! previous event strictly exceeds the threshold.

use crate::events::{Event, SessionizedEvent};
use chrono::Duration;
use std::collections::HashMap;

/// Annotate every event with its per-user session sequence number.
///
/// Sequence numbers start at 0 for a user's chronologically first event. A
/// gap strictly greater than `gap` opens a new session; a gap of exactly
/// `gap` does not. Equal timestamps keep their input order (stable sort),
/// which also fixes the downstream step-order tiebreak.
pub fn sessionize(events: Vec<Event>, gap: Duration) -> Vec<SessionizedEvent> {
    // Group per user, remembering first-appearance order so output stays
    // deterministic for a given input file
    let mut by_user: HashMap<String, Vec<Event>> = HashMap::new();
    let mut user_order: Vec<String> = Vec::new();
    for event in events {
        let entry = by_user.entry(event.user_id.clone()).or_default();
        if entry.is_empty() {
            user_order.push(event.user_id.clone());
        }
        entry.push(event);
    }

    let mut out = Vec::new();
    for user in user_order {
        let mut user_events = by_user.remove(&user).unwrap_or_default();
        user_events.sort_by_key(|e| e.ts);

        let mut seq: u64 = 0;
        let mut prev_ts = None;
        for event in user_events {
            if let Some(prev) = prev_ts {
                if event.ts - prev > gap {
                    seq += 1;
                }
            }
            prev_ts = Some(event.ts);
            out.push(SessionizedEvent {
                event,
                session_seq: seq,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use chrono::NaiveDate;

    fn event_at(user: &str, minute_offset: i64, second_offset: i64) -> Event {
        let base = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Event {
            user_id: user.to_string(),
            ts: base + Duration::minutes(minute_offset) + Duration::seconds(second_offset),
            kind: EventKind::View,
            sku: "1".to_string(),
        }
    }

    fn gap_30() -> Duration {
        Duration::minutes(30)
    }

    fn seqs(result: &[SessionizedEvent]) -> Vec<u64> {
        result.iter().map(|s| s.session_seq).collect()
    }

    #[test]
    fn test_single_event_single_session() {
        let result = sessionize(vec![event_at("u1", 0, 0)], gap_30());
        assert_eq!(seqs(&result), vec![0]);
    }

    #[test]
    fn test_gap_of_exactly_threshold_continues_session() {
        // t=0 and t=30min exactly: not-greater-than means same session
        let result = sessionize(vec![event_at("u1", 0, 0), event_at("u1", 30, 0)], gap_30());
        assert_eq!(seqs(&result), vec![0, 0]);
    }

    #[test]
    fn test_gap_one_second_over_threshold_starts_session() {
        let result = sessionize(vec![event_at("u1", 0, 0), event_at("u1", 30, 1)], gap_30());
        assert_eq!(seqs(&result), vec![0, 1]);
    }

    #[test]
    fn test_session_count_is_one_plus_oversized_gaps() {
        // Gaps: 31 (over), 5, 40 (over), 30 (exact, not over) => 3 sessions
        let events = vec![
            event_at("u1", 0, 0),
            event_at("u1", 31, 0),
            event_at("u1", 36, 0),
            event_at("u1", 76, 0),
            event_at("u1", 106, 0),
        ];
        let result = sessionize(events, gap_30());
        assert_eq!(seqs(&result), vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_users_are_independent() {
        let events = vec![
            event_at("u1", 0, 0),
            event_at("u2", 0, 0),
            event_at("u1", 45, 0),
            event_at("u2", 10, 0),
        ];
        let result = sessionize(events, gap_30());
        let for_user = |user: &str| -> Vec<u64> {
            result
                .iter()
                .filter(|s| s.event.user_id == user)
                .map(|s| s.session_seq)
                .collect()
        };
        assert_eq!(for_user("u1"), vec![0, 1]);
        assert_eq!(for_user("u2"), vec![0, 0]);
    }

    #[test]
    fn test_identical_timestamps_share_session_in_input_order() {
        let mut first = event_at("u1", 0, 0);
        first.sku = "a".to_string();
        let mut second = event_at("u1", 0, 0);
        second.sku = "b".to_string();

        let result = sessionize(vec![first, second], gap_30());
        assert_eq!(seqs(&result), vec![0, 0]);
        // Stable sort keeps input order on the tie
        assert_eq!(result[0].event.sku, "a");
        assert_eq!(result[1].event.sku, "b");
    }

    #[test]
    fn test_out_of_order_input_is_sorted_before_walking() {
        let result = sessionize(vec![event_at("u1", 45, 0), event_at("u1", 0, 0)], gap_30());
        assert_eq!(result[0].event.ts, event_at("u1", 0, 0).ts);
        assert_eq!(seqs(&result), vec![0, 1]);
    }
}
