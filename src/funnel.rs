//! Funnel step builder and session-level aggregation
//!
//! `build_steps` ranks every event 1-based within its (user, session) group
//! ordered by timestamp. `aggregate_sessions` is an existence reduction:
//! one row of flags per session, order-independent and idempotent.

use crate::events::{EventKind, FunnelSession, FunnelStep, SessionizedEvent};
use std::collections::HashMap;

/// Separator between user id and session sequence in `session_id`.
///
/// User ids must not contain this character or session ids become
/// ambiguous; the loader warns when it sees one.
pub const SESSION_ID_SEPARATOR: char = '-';

/// Build ordered funnel steps from sessionized events.
///
/// Output is sorted by user id, session sequence, then step order, so
/// repeated runs over identical input write byte-identical artifacts. The
/// timestamp tiebreak is inherited from the sessionizer's stable sort.
pub fn build_steps(events: Vec<SessionizedEvent>) -> Vec<FunnelStep> {
    // The sessionizer emits each user's events already time-ordered; a
    // stable sort by (user, seq) groups sessions without disturbing that
    // order.
    let mut events = events;
    events.sort_by(|a, b| {
        (a.event.user_id.as_str(), a.session_seq).cmp(&(b.event.user_id.as_str(), b.session_seq))
    });

    let mut steps = Vec::with_capacity(events.len());
    let mut current: Option<(String, u64)> = None;
    let mut order: u64 = 0;
    for se in events {
        let key = (se.event.user_id.clone(), se.session_seq);
        if current.as_ref() != Some(&key) {
            current = Some(key);
            order = 0;
        }
        order += 1;

        let session_id = format!(
            "{}{}{}",
            se.event.user_id, SESSION_ID_SEPARATOR, se.session_seq
        );
        steps.push(FunnelStep {
            user_id: se.event.user_id,
            session_id,
            ts: se.event.ts,
            kind: se.event.kind,
            sku: se.event.sku,
            step_order: order,
        });
    }
    steps
}

/// Reduce funnel steps to one row of existence flags per session.
///
/// The flags depend only on the set of kinds present in the session, so the
/// reduction is order-independent and re-running it over the same steps
/// yields the same rows. Output keeps the step table's session order.
pub fn aggregate_sessions(steps: &[FunnelStep]) -> Vec<FunnelSession> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sessions: Vec<FunnelSession> = Vec::new();

    for step in steps {
        let i = *index.entry(step.session_id.clone()).or_insert_with(|| {
            sessions.push(FunnelSession::new(step.session_id.clone()));
            sessions.len() - 1
        });
        let session = &mut sessions[i];
        match &step.kind {
            EventKind::View => session.has_view = true,
            EventKind::AddToCart => session.has_cart = true,
            EventKind::Transaction => session.has_purchase = true,
            EventKind::Other(_) => {}
        }
    }
    sessions
}

/// Stage totals across all sessions
///
/// Feeds the conversion rates the summary and API surfaces expose. The
/// numerators are unconditioned: view-to-cart divides every carting session
/// by every viewing session, whether or not the cart followed a view.
#[derive(Debug, Clone, Default)]
pub struct FunnelTotals {
    pub views: usize,
    pub carts: usize,
    pub purchases: usize,
}

impl FunnelTotals {
    pub fn from_sessions(sessions: &[FunnelSession]) -> Self {
        let mut totals = Self::default();
        for session in sessions {
            if session.has_view {
                totals.views += 1;
            }
            if session.has_cart {
                totals.carts += 1;
            }
            if session.has_purchase {
                totals.purchases += 1;
            }
        }
        totals
    }

    /// Carting sessions per viewing session, percent. None without views.
    pub fn view_to_cart_rate(&self) -> Option<f64> {
        (self.views > 0).then(|| self.carts as f64 / self.views as f64 * 100.0)
    }

    /// Purchasing sessions per carting session, percent. None without carts.
    pub fn cart_to_purchase_rate(&self) -> Option<f64> {
        (self.carts > 0).then(|| self.purchases as f64 / self.carts as f64 * 100.0)
    }
}
