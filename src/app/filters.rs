//! Basin / sub-district filtering

use super::App;
use crate::constants::{COL_BASIN, COL_SUB_DISTRICT};
use crate::store::WorkingSet;
use std::collections::HashSet;
use tracing::debug;

/// Options and selections of the two multi-select filters
#[derive(Debug, Clone, Default)]
pub(crate) struct FilterState {
    pub basins: Vec<String>,
    pub districts: Vec<String>,
    pub selected_basins: HashSet<String>,
    pub selected_districts: HashSet<String>,
}

impl FilterState {
    /// Every distinct value offered and selected
    pub fn from_working_set(set: &WorkingSet) -> Self {
        let basins = set.distinct(COL_BASIN);
        let districts = set.distinct(COL_SUB_DISTRICT);
        Self {
            selected_basins: basins.iter().cloned().collect(),
            selected_districts: districts.iter().cloned().collect(),
            basins,
            districts,
        }
    }
}

/// Indices of rows whose basin AND sub district are both selected
pub(crate) fn filter_indices(
    set: &WorkingSet,
    basins: &HashSet<String>,
    districts: &HashSet<String>,
) -> Vec<usize> {
    set.rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            basins.contains(set.text(row, COL_BASIN))
                && districts.contains(set.text(row, COL_SUB_DISTRICT))
        })
        .map(|(i, _)| i)
        .collect()
}

impl App {
    pub fn apply_filters(&mut self) {
        self.filtered_indices = filter_indices(
            &self.working,
            &self.filters.selected_basins,
            &self.filters.selected_districts,
        );
        // Recenter the map on what is left
        self.map_view = None;
        debug!(
            shown = self.filtered_indices.len(),
            total = self.working.rows.len(),
            "Filters applied"
        );
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterState::from_working_set(&self.working);
        self.apply_filters();
    }
}
