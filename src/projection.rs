//! Inflation-adjusted budget projection: given a current budget, a projected
//! annual inflation rate and a horizon, computes the budget needed each year
//! to preserve today's purchasing power, and what that power would be with no
//! adjustment at all.
//!
//! Purchasing power is `100 / (1 + rate)^elapsed_years` for every period,
//! year 0 and the final year included.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionRow {
    /// "Actual" for year 0, then "Año 1", "Año 2", ...
    pub label: String,
    /// Budget adjusted by compound growth up to this year.
    pub budget: f64,
    /// This year's increment over the previous one; 0 at year 0.
    pub increment: f64,
    /// Remaining purchasing power of the unadjusted budget, in percent.
    pub purchasing_power_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub rows: Vec<ProjectionRow>,
    pub final_budget: f64,
    pub total_increment: f64,
}

pub fn project(budget_now: f64, annual_rate_pct: f64, years: u32) -> Projection {
    let rate = annual_rate_pct / 100.0;
    let mut rows = Vec::with_capacity(years as usize + 1);
    let mut adjusted = budget_now;

    for year in 0..=years {
        if year == 0 {
            rows.push(ProjectionRow {
                label: "Actual".to_string(),
                budget: budget_now,
                increment: 0.0,
                purchasing_power_pct: 100.0,
            });
        } else {
            let increment = adjusted * rate;
            adjusted += increment;
            rows.push(ProjectionRow {
                label: format!("A\u{f1}o {year}"),
                budget: adjusted,
                increment,
                purchasing_power_pct: 100.0 / (1.0 + rate).powi(year as i32),
            });
        }
    }

    Projection { final_budget: adjusted, total_increment: adjusted - budget_now, rows }
}

/// `$12,345.67` with a fixed dollar sign and thousands separators.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// The projection table as CSV, mirroring the dashboard's download format.
pub fn projection_to_csv(projection: &Projection) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Per\u{ed}odo", "Presupuesto", "Incremento", "Poder Adquisitivo Sin Ajuste"])?;
    for row in &projection.rows {
        writer.write_record([
            row.label.as_str(),
            format_currency(row.budget).as_str(),
            format_currency(row.increment).as_str(),
            format!("{:.2}%", row.purchasing_power_pct).as_str(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}
