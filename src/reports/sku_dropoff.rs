//! SKU drop-off: how many sessions reach each funnel stage per item
//!
//! Counts distinct sessions per stage per sku, then ranks items by the
//! number of viewing sessions that never carted them. Items whose only
//! steps are opaque event kinds do not appear.

use super::{ReportKind, StepTable};
use crate::artifacts::ArtifactStore;
use crate::error::Result;
use crate::events::EventKind;
use std::collections::{HashMap, HashSet};

const HEADER: [&str; 6] = [
    "sku",
    "view_sessions",
    "cart_sessions",
    "purchase_sessions",
    "abandoned_sessions",
    "drop_off_pct",
];

#[derive(Default)]
struct StageSessions {
    view: HashSet<String>,
    cart: HashSet<String>,
    purchase: HashSet<String>,
}

struct SkuRow {
    sku: String,
    views: usize,
    carts: usize,
    purchases: usize,
    abandoned: usize,
    drop_off_pct: f64,
}

pub(crate) fn run(store: &ArtifactStore, table: &StepTable) -> Result<usize> {
    let kind = ReportKind::SkuDropoff;
    let session_col = table.column(kind, "session_id")?;
    let event_col = table.column(kind, "event_type")?;
    let sku_col = table.column(kind, "sku")?;

    let mut by_sku: HashMap<String, StageSessions> = HashMap::new();
    for record in table.records() {
        let sku = record.get(sku_col).unwrap_or("");
        let session = record.get(session_col).unwrap_or("");
        let stages = by_sku.entry(sku.to_string()).or_default();
        match EventKind::parse(record.get(event_col).unwrap_or("")) {
            EventKind::View => {
                stages.view.insert(session.to_string());
            }
            EventKind::AddToCart => {
                stages.cart.insert(session.to_string());
            }
            EventKind::Transaction => {
                stages.purchase.insert(session.to_string());
            }
            EventKind::Other(_) => {}
        }
    }

    let mut rows: Vec<SkuRow> = by_sku
        .into_iter()
        .filter_map(|(sku, stages)| {
            let views = stages.view.len();
            let carts = stages.cart.len();
            let purchases = stages.purchase.len();
            if views == 0 && carts == 0 && purchases == 0 {
                return None;
            }
            let abandoned = views.saturating_sub(carts);
            let drop_off_pct = if views > 0 {
                abandoned as f64 / views as f64 * 100.0
            } else {
                0.0
            };
            Some(SkuRow {
                sku,
                views,
                carts,
                purchases,
                abandoned,
                drop_off_pct,
            })
        })
        .collect();

    // Rank by abandonment; sku breaks ties so output is deterministic
    rows.sort_by(|a, b| {
        b.abandoned
            .cmp(&a.abandoned)
            .then_with(|| a.sku.cmp(&b.sku))
    });

    store.write_csv(
        "sku_dropoff.csv",
        &HEADER,
        rows.into_iter().map(|r| {
            vec![
                r.sku,
                r.views.to_string(),
                r.carts.to_string(),
                r.purchases.to_string(),
                r.abandoned.to_string(),
                format!("{:.2}", r.drop_off_pct),
            ]
        }),
    )
}
