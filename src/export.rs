//! CSV export of a filtered view, the backend of the UI's download button.

use std::path::Path;

use crate::filter::FilteredView;

/// Stable column order of the export format.
pub const EXPORT_HEADERS: [&str; 5] = ["ecocentro", "anio", "mes_nombre", "residuo", "kg"];

/// Serializes the view as UTF-8 CSV. Rows keep their view order; an absent
/// material column exports as empty cells.
pub fn view_to_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;
    for record in &view.rows {
        let year = record.year.to_string();
        let quantity = record.quantity_kg.to_string();
        writer.write_record([
            record.site.as_str(),
            year.as_str(),
            record.month_name,
            record.material.as_deref().unwrap_or(""),
            quantity.as_str(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

pub fn write_view_file(view: &FilteredView<'_>, path: &Path) -> Result<(), csv::Error> {
    let bytes = view_to_csv(view)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
