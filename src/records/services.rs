//! Waste metrics. Everything here is derived on read from the stored
//! quantities; nothing is written back.

use serde::Serialize;
use time::macros::format_description;

use crate::records::repo_types::WasteRecord;

/// `food_prepared - food_served`. Negative when more was served than
/// prepared; the input is not guarded.
pub fn wasted(record: &WasteRecord) -> f64 {
    record.food_prepared - record.food_served
}

/// Wasted share of prepared food, out of 100. Zero when nothing was prepared.
pub fn waste_percentage(record: &WasteRecord) -> f64 {
    if record.food_prepared > 0.0 {
        wasted(record) / record.food_prepared * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub total_records: usize,
    pub total_wasted: f64,
    pub total_prepared: f64,
    /// Weighted by quantity prepared, not a mean of per-record percentages.
    pub avg_waste_percentage: f64,
}

pub fn aggregate(records: &[WasteRecord]) -> Aggregate {
    let total_wasted: f64 = records.iter().map(wasted).sum();
    let total_prepared: f64 = records.iter().map(|r| r.food_prepared).sum();
    let avg_waste_percentage = if total_prepared > 0.0 {
        total_wasted / total_prepared * 100.0
    } else {
        0.0
    };
    Aggregate {
        total_records: records.len(),
        total_wasted,
        total_prepared,
        avg_waste_percentage,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    #[serde(rename = "date")]
    pub date_label: String,
    #[serde(rename = "waste")]
    pub wasted: f64,
}

/// Last `n` records of `records`, kept in the given order, as chart points.
/// Missing days are not filled in.
pub fn recent_trend(records: &[WasteRecord], n: usize) -> Vec<TrendPoint> {
    let fmt = format_description!("[day]/[month]");
    let start = records.len().saturating_sub(n);
    records[start..]
        .iter()
        .map(|r| TrendPoint {
            date_label: r
                .date
                .format(fmt)
                .unwrap_or_else(|_| r.date.to_string()),
            wasted: wasted(r),
        })
        .collect()
}
