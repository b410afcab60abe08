//! Aggregator: the summary statistics and grouped series behind the four
//! standard dashboard views.
//!
//! Everything here is a pure function of the view: sums are order-independent
//! and ordering of the output series is imposed explicitly (chronological for
//! time and year series, by quantity for the ranked ones), never inherited
//! from input row order.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::constants;
use crate::filter::FilteredView;
use crate::schema::Record;

pub const DEFAULT_TOP_N: usize = 10;

/// Sentinel shown when a top-* value is undefined (empty view or the
/// material column is unavailable).
pub const NOT_AVAILABLE: &str = "N/A";

/// One point of the monthly time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub date: NaiveDate,
    pub period: String,
    pub kg: f64,
}

/// A labeled quantity in a ranked series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    pub label: String,
    pub kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteShare {
    pub site: String,
    pub kg: f64,
    pub pct_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub kg: f64,
}

/// The output bundle, recomputed on every filter change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub total_kg: f64,
    /// Mean of the per-(year, month) sums; 0 for an empty view.
    pub monthly_average_kg: f64,
    pub top_material: Option<String>,
    pub top_site: Option<String>,
    /// Chronological by date, not alphabetical by label.
    pub by_period: Vec<PeriodTotal>,
    /// Highest-quantity materials, descending; empty when the material
    /// column is unavailable.
    pub by_material_top_n: Vec<LabelTotal>,
    /// Per-site totals with share of `total_kg`, descending.
    pub by_site: Vec<SiteShare>,
    /// Chronological by year.
    pub by_year: Vec<YearTotal>,
}

impl Aggregate {
    pub fn compute(view: &FilteredView<'_>, top_n: usize) -> Aggregate {
        let total_kg: f64 = view.rows.iter().map(|r| r.quantity_kg).sum();

        // One bucket per (year, month) actually present in the view
        let mut period_sums: HashMap<NaiveDate, f64> = HashMap::new();
        for record in &view.rows {
            *period_sums.entry(record.date).or_insert(0.0) += record.quantity_kg;
        }
        // Guard the division: an empty view has no months to average over
        let monthly_average_kg = if period_sums.is_empty() {
            0.0
        } else {
            total_kg / period_sums.len() as f64
        };

        let mut by_period: Vec<PeriodTotal> = period_sums
            .into_iter()
            .map(|(date, kg)| PeriodTotal { date, period: period_label(date), kg })
            .collect();
        by_period.sort_by_key(|point| point.date);

        let material_sums = sums_by_label(view, |r| r.material.as_deref());
        let site_sums = sums_by_label(view, |r| Some(r.site.as_str()));

        let top_material = top_label(&material_sums, &view.dataset.materials);
        let top_site = top_label(&site_sums, &view.dataset.sites);

        let mut by_material_top_n = ranked(&material_sums, &view.dataset.materials);
        by_material_top_n.truncate(top_n);

        let by_site = ranked(&site_sums, &view.dataset.sites)
            .into_iter()
            .map(|entry| SiteShare {
                site: entry.label,
                kg: entry.kg,
                pct_of_total: if total_kg > 0.0 { entry.kg / total_kg * 100.0 } else { 0.0 },
            })
            .collect();

        let mut year_sums: HashMap<i32, f64> = HashMap::new();
        for record in &view.rows {
            *year_sums.entry(record.year).or_insert(0.0) += record.quantity_kg;
        }
        let mut by_year: Vec<YearTotal> =
            year_sums.into_iter().map(|(year, kg)| YearTotal { year, kg }).collect();
        by_year.sort_by_key(|entry| entry.year);

        Aggregate {
            total_kg,
            monthly_average_kg,
            top_material,
            top_site,
            by_period,
            by_material_top_n,
            by_site,
            by_year,
        }
    }

    pub fn top_material_label(&self) -> &str {
        self.top_material.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn top_site_label(&self) -> &str {
        self.top_site.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

fn period_label(date: NaiveDate) -> String {
    // date always carries a valid month, the name lookup cannot miss
    let month_name = constants::month_name(date.month()).unwrap_or(NOT_AVAILABLE);
    format!("{} {}", month_name, date.year())
}

fn sums_by_label<'a>(
    view: &FilteredView<'a>,
    label_of: impl Fn(&'a Record) -> Option<&'a str>,
) -> HashMap<String, f64> {
    let mut sums = HashMap::new();
    for record in view.rows.iter().copied() {
        if let Some(label) = label_of(record) {
            *sums.entry(label.to_string()).or_insert(0.0) += record.quantity_kg;
        }
    }
    sums
}

/// Label with the maximum sum. Ties go to the label that appeared first in
/// the dataset's distinct-value ordering, keeping the result stable under
/// row-order permutation of the view.
fn top_label(sums: &HashMap<String, f64>, order: &[String]) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for label in order {
        if let Some(&kg) = sums.get(label) {
            if best.map_or(true, |(_, best_kg)| kg > best_kg) {
                best = Some((label, kg));
            }
        }
    }
    best.map(|(label, _)| label.clone())
}

/// Labels present in the view, descending by quantity. The sort is stable,
/// so equal quantities keep the distinct-value order.
fn ranked(sums: &HashMap<String, f64>, order: &[String]) -> Vec<LabelTotal> {
    let mut entries: Vec<LabelTotal> = order
        .iter()
        .filter_map(|label| {
            sums.get(label).map(|&kg| LabelTotal { label: label.clone(), kg })
        })
        .collect();
    entries.sort_by(|a, b| b.kg.partial_cmp(&a.kg).unwrap_or(std::cmp::Ordering::Equal));
    entries
}
