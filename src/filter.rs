//! Filter Engine: equality predicates over a [`Dataset`].

use serde::{Deserialize, Serialize};

use crate::schema::{Dataset, Record};

/// Optional equality constraints; `None` is the "Todos" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub site: Option<String>,
    pub material: Option<String>,
    pub year: Option<i32>,
}

impl FilterSelection {
    pub fn is_unfiltered(&self) -> bool {
        self.site.is_none() && self.material.is_none() && self.year.is_none()
    }

    fn matches(&self, record: &Record) -> bool {
        if let Some(site) = &self.site {
            if record.site != *site {
                return false;
            }
        }
        if let Some(material) = &self.material {
            if record.material.as_deref() != Some(material.as_str()) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if record.year != year {
                return false;
            }
        }
        true
    }

    /// Produces a view over the matching rows. The dataset is never mutated;
    /// a selection naming values absent from the data yields an empty view,
    /// which is a valid "no matches" outcome rather than an error.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        FilteredView {
            dataset,
            rows: dataset.records.iter().filter(|r| self.matches(r)).collect(),
        }
    }
}

/// Borrowed view over the rows a selection matched.
pub struct FilteredView<'a> {
    pub dataset: &'a Dataset,
    pub rows: Vec<&'a Record>,
}

impl FilteredView<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
