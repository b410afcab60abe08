//! Dataset constants: the open-data catalog URL, the canonical column names of
//! the Montevideo ecocentros CSV, the Spanish month labels, and a small
//! bundled sample used as the last-resort source.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Material received at the ecocentros, from the Montevideo open-data catalog.
pub const DATA_URL: &str = "https://ckan-data.montevideo.gub.uy/dataset/0a4cdc0a-ec35-4517-9e90-081659188ac0/resource/9eb3e81c-b916-4c6d-9f40-31dabebc708d/download/tabla_de_datos_de_material_ingresado_a_ecocentros.csv";

// Canonical column names as published in the catalog
pub const COL_SITE: &str = "ecocentro";
pub const COL_YEAR: &str = "anio";
pub const COL_MONTH: &str = "mes";
pub const COL_MATERIAL: &str = "residuo";
pub const COL_QUANTITY: &str = "kg";
// Used by the CSV export in place of the numeric month
pub const COL_MONTH_NAME: &str = "mes_nombre";

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

static MONTH_INDEX: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i as u32 + 1))
        .collect()
});

/// Localized label for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Inverse of [`month_name`], case-insensitive. Accepts "Julio", "julio", ...
pub fn month_from_name(name: &str) -> Option<u32> {
    MONTH_INDEX.get(&name.trim().to_lowercase()).copied()
}

/// Small excerpt of the real dataset, bundled so the pipeline still produces
/// output when both the catalog and a local file are unavailable.
pub const SAMPLE_CSV: &str = "\
ecocentro,anio,mes,residuo,kg
Buceo,2023,1,Papel,1200
Buceo,2023,1,Vidrio,830
Buceo,2023,2,Escombros,2150
Prado,2023,1,Papel,940
Prado,2023,2,Vidrio,610
Prado,2023,3,Metales,380
M\u{f3}vil,2023,2,Pl\u{e1}stico,275
M\u{f3}vil,2023,3,Electr\u{f3}nicos,190
Buceo,2023,3,Papel,1105
Buceo,2024,1,Poda,1720
Prado,2024,1,Escombros,1980
Prado,2024,2,Papel,870
M\u{f3}vil,2024,1,Vidrio,340
M\u{f3}vil,2024,2,Pl\u{e1}stico,295
Buceo,2024,2,Metales,505
Buceo,2024,3,Papel,1230
";
