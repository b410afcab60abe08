//! Schema Normalizer: turns a [`RawTable`] into the canonical [`Dataset`].
//!
//! Required fields are located through an explicit [`ColumnMap`]; rows that
//! fail coercion are excluded and counted, never silently dropped. Derived
//! fields (`date`, `month_name`, `period`) are a pure function of
//! (`year`, `month`).

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::constants;
use crate::error::NormalizeError;
use crate::source::RawTable;

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub site: String,
    pub year: i32,
    /// 1-based; rows outside 1..=12 never make it into a dataset.
    pub month: u32,
    /// `None` when the source has no material column at all.
    pub material: Option<String>,
    pub quantity_kg: f64,
    /// First day of (`year`, `month`).
    pub date: NaiveDate,
    pub month_name: &'static str,
    /// "MonthName Year", e.g. "Enero 2023".
    pub period: String,
}

/// Maps source column names onto the canonical fields. Defaults to the
/// Montevideo catalog's headers; callers loading re-exported CSV swap the
/// month column for `mes_nombre`.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub site: String,
    pub year: String,
    pub month: String,
    pub material: String,
    pub quantity_kg: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            site: constants::COL_SITE.to_string(),
            year: constants::COL_YEAR.to_string(),
            month: constants::COL_MONTH.to_string(),
            material: constants::COL_MATERIAL.to_string(),
            quantity_kg: constants::COL_QUANTITY.to_string(),
        }
    }
}

impl ColumnMap {
    /// Default mapping except that months are read from the exported
    /// `mes_nombre` column.
    pub fn for_export_format() -> Self {
        Self { month: constants::COL_MONTH_NAME.to_string(), ..Self::default() }
    }
}

/// Which degradable fields the source actually provided.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    pub material: bool,
}

/// The normalized, immutable row collection plus its distinct-value sets.
///
/// Distinct values are kept in first-encountered order; that order is the
/// deterministic tie-break for the top-* aggregates.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub sites: Vec<String>,
    pub materials: Vec<String>,
    pub years: Vec<i32>,
    /// Rows excluded because a field failed coercion.
    pub skipped_count: usize,
    pub capabilities: Capabilities,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builds a [`Dataset`] from raw rows. Row order is preserved from the source.
pub fn normalize(raw: &RawTable, map: &ColumnMap) -> Result<Dataset, NormalizeError> {
    let column = |name: &str| {
        raw.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let required = |name: &str| {
        column(name).ok_or_else(|| NormalizeError::MissingRequiredColumn(name.to_string()))
    };

    let site_idx = required(&map.site)?;
    let year_idx = required(&map.year)?;
    let month_idx = required(&map.month)?;
    let quantity_idx = required(&map.quantity_kg)?;
    // Degradable: without it the material views are simply unavailable
    let material_idx = column(&map.material);
    if material_idx.is_none() {
        warn!(column = %map.material, "material column absent; material views disabled");
    }

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut sites: Vec<String> = Vec::new();
    let mut materials: Vec<String> = Vec::new();
    let mut years: Vec<i32> = Vec::new();
    let mut skipped_count = 0usize;

    for (row_number, row) in raw.rows.iter().enumerate() {
        let Some(record) = coerce_row(row, site_idx, year_idx, month_idx, quantity_idx, material_idx)
        else {
            debug!(row = row_number + 1, "row failed coercion, excluded");
            skipped_count += 1;
            continue;
        };
        if record.quantity_kg < 0.0 {
            // Data-quality error upstream; kept, not filtered
            warn!(row = row_number + 1, kg = record.quantity_kg, "negative quantity in source");
        }
        if !sites.contains(&record.site) {
            sites.push(record.site.clone());
        }
        if let Some(material) = &record.material {
            if !materials.contains(material) {
                materials.push(material.clone());
            }
        }
        if !years.contains(&record.year) {
            years.push(record.year);
        }
        records.push(record);
    }

    Ok(Dataset {
        records,
        sites,
        materials,
        years,
        skipped_count,
        capabilities: Capabilities { material: material_idx.is_some() },
    })
}

fn coerce_row(
    row: &[String],
    site_idx: usize,
    year_idx: usize,
    month_idx: usize,
    quantity_idx: usize,
    material_idx: Option<usize>,
) -> Option<Record> {
    let site = row.get(site_idx)?.trim();
    if site.is_empty() {
        return None;
    }
    let year = parse_integer(row.get(year_idx)?)?;
    let month = parse_month(row.get(month_idx)?)?;
    let quantity_kg: f64 = row.get(quantity_idx)?.trim().parse().ok().filter(|q: &f64| !q.is_nan())?;
    let material = match material_idx {
        Some(idx) => Some(row.get(idx)?.trim().to_string()),
        None => None,
    };
    // Also rejects month 0 and 13+: no such calendar date exists
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let month_name = constants::month_name(month)?;
    Some(Record {
        site: site.to_string(),
        year,
        month,
        material,
        quantity_kg,
        date,
        month_name,
        period: format!("{month_name} {year}"),
    })
}

fn parse_integer(field: &str) -> Option<i32> {
    let field = field.trim();
    if let Ok(value) = field.parse::<i32>() {
        return Some(value);
    }
    // Some exports serialize integers as "2023.0"
    let as_float: f64 = field.parse().ok()?;
    (as_float.fract() == 0.0).then_some(as_float as i32)
}

/// Accepts the numeric form ("7") and the localized name ("Julio"), so CSV
/// produced by the export module loads back through the same path.
fn parse_month(field: &str) -> Option<u32> {
    let field = field.trim();
    if let Some(month) = parse_integer(field) {
        return u32::try_from(month).ok();
    }
    constants::month_from_name(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            encoding: "UTF-8",
        }
    }

    const HEADERS: [&str; 5] = ["ecocentro", "anio", "mes", "residuo", "kg"];

    #[test]
    fn derives_date_and_period_from_year_and_month() {
        let raw = table(&HEADERS, &[&["Buceo", "2023", "1", "Papel", "100"]]);
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        let record = &dataset.records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(record.month_name, "Enero");
        assert_eq!(record.period, "Enero 2023");
        assert_eq!(dataset.skipped_count, 0);
    }

    #[test]
    fn month_thirteen_is_excluded_and_counted() {
        let raw = table(
            &HEADERS,
            &[
                &["Buceo", "2023", "13", "Papel", "100"],
                &["Buceo", "2023", "2", "Vidrio", "20"],
            ],
        );
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_count, 1);
        assert_eq!(dataset.records[0].material.as_deref(), Some("Vidrio"));
    }

    #[test]
    fn non_numeric_fields_are_excluded_and_counted() {
        let raw = table(
            &HEADERS,
            &[
                &["Buceo", "dos mil", "1", "Papel", "100"],
                &["Buceo", "2023", "1", "Papel", "mucho"],
                &["Prado", "2023", "1", "Papel", "50"],
            ],
        );
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_count, 2);
        assert_eq!(dataset.records[0].site, "Prado");
    }

    #[test]
    fn float_serialized_year_still_coerces() {
        let raw = table(&HEADERS, &[&["Buceo", "2023.0", "7", "Papel", "100"]]);
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert_eq!(dataset.records[0].year, 2023);
        assert_eq!(dataset.records[0].month_name, "Julio");
    }

    #[test]
    fn month_names_coerce_like_numbers() {
        let raw = table(
            &["ecocentro", "anio", "mes_nombre", "residuo", "kg"],
            &[&["Buceo", "2023", "Febrero", "Papel", "100"]],
        );
        let dataset = normalize(&raw, &ColumnMap::for_export_format()).unwrap();
        assert_eq!(dataset.records[0].month, 2);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let raw = table(&["ecocentro", "anio", "mes", "residuo"], &[]);
        let err = normalize(&raw, &ColumnMap::default()).unwrap_err();
        match err {
            NormalizeError::MissingRequiredColumn(name) => assert_eq!(name, "kg"),
        }
    }

    #[test]
    fn absent_material_column_degrades_instead_of_failing() {
        let raw = table(
            &["ecocentro", "anio", "mes", "kg"],
            &[&["Buceo", "2023", "1", "100"]],
        );
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert!(!dataset.capabilities.material);
        assert_eq!(dataset.records[0].material, None);
        assert!(dataset.materials.is_empty());
    }

    #[test]
    fn distinct_values_keep_first_encountered_order() {
        let raw = table(
            &HEADERS,
            &[
                &["Prado", "2024", "1", "Vidrio", "10"],
                &["Buceo", "2023", "1", "Papel", "10"],
                &["Prado", "2023", "2", "Vidrio", "10"],
            ],
        );
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert_eq!(dataset.sites, vec!["Prado", "Buceo"]);
        assert_eq!(dataset.materials, vec!["Vidrio", "Papel"]);
        assert_eq!(dataset.years, vec![2024, 2023]);
    }

    #[test]
    fn negative_quantity_is_kept() {
        let raw = table(&HEADERS, &[&["Buceo", "2023", "1", "Papel", "-5"]]);
        let dataset = normalize(&raw, &ColumnMap::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].quantity_kg, -5.0);
        assert_eq!(dataset.skipped_count, 0);
    }
}
