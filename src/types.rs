//! Common types and data structures

use crate::store::Table;
use crate::utils::format_number;
use std::path::PathBuf;

/// Screens reachable from the side menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    MapViewer,
    AddWell,
    EditWell,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::MapViewer, Page::AddWell, Page::EditWell];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::MapViewer => "Well Map Viewer",
            Page::AddWell => "Add New Well",
            Page::EditWell => "Edit Well Data",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Page::Home => egui_phosphor::regular::HOUSE,
            Page::MapViewer => egui_phosphor::regular::MAP_TRIFOLD,
            Page::AddWell => egui_phosphor::regular::PLUS_CIRCLE,
            Page::EditWell => egui_phosphor::regular::PENCIL_SIMPLE,
        }
    }
}

/// Sub-panels of the map viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerTab {
    Filters,
    Table,
    Map,
    Upload,
}

impl ViewerTab {
    pub const ALL: [ViewerTab; 4] = [
        ViewerTab::Filters,
        ViewerTab::Table,
        ViewerTab::Map,
        ViewerTab::Upload,
    ];

    pub fn label(self) -> String {
        let (icon, text) = match self {
            ViewerTab::Filters => (egui_phosphor::regular::FUNNEL, "Filters"),
            ViewerTab::Table => (egui_phosphor::regular::TABLE, "Data Table"),
            ViewerTab::Map => (egui_phosphor::regular::MAP_PIN, "Map View"),
            ViewerTab::Upload => (egui_phosphor::regular::UPLOAD_SIMPLE, "Upload CSV"),
        };
        format!("{}  {}", icon, text)
    }
}

/// Sub-panels of the add-well screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddTab {
    Manual,
    Upload,
}

impl AddTab {
    pub fn label(self) -> String {
        match self {
            AddTab::Manual => format!("{}  Manual Entry", egui_phosphor::regular::NOTE_PENCIL),
            AddTab::Upload => format!("{}  Upload CSV", egui_phosphor::regular::FOLDER_OPEN),
        }
    }
}

/// Inline message shown under an action
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// A CSV the user picked for appending
pub struct UploadPreview {
    pub path: PathBuf,
    pub table: Table,
    /// Required columns absent from the headers (Add Well only)
    pub missing: Vec<&'static str>,
    /// Missing columns would all match after header cleanup
    pub header_hint: bool,
}

impl UploadPreview {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Manual entry form for one well
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WellForm {
    pub well_name: String,
    pub sub_district: String,
    pub basin: String,
    pub depth: f64,
    pub formation: String,
    pub utm_x: f64,
    pub utm_y: f64,
    pub elevation: f64,
    pub coord_x: f64,
    pub coord_y: f64,
}

impl WellForm {
    /// Row cells in `REQUIRED_COLUMNS` order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.well_name.clone(),
            self.sub_district.clone(),
            self.basin.clone(),
            format_number(self.depth),
            self.formation.clone(),
            format_number(self.utm_x),
            format_number(self.utm_y),
            format_number(self.elevation),
            format_number(self.coord_x),
            format_number(self.coord_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REQUIRED_COLUMNS;

    #[test]
    fn test_form_row_defaults() {
        let form = WellForm {
            well_name: "W-1".to_string(),
            depth: 100.0,
            ..Default::default()
        };
        let row = form.to_row();

        assert_eq!(row.len(), REQUIRED_COLUMNS.len());
        assert_eq!(row[0], "W-1");
        assert_eq!(row[1], "");
        assert_eq!(row[3], "100.0");
        assert_eq!(row[9], "0.0");
    }

    #[test]
    fn test_form_row_keeps_fractions() {
        let form = WellForm {
            coord_x: 36.1901,
            coord_y: 44.0092,
            elevation: 412.5,
            ..Default::default()
        };
        let row = form.to_row();
        assert_eq!(row[7], "412.5");
        assert_eq!(row[8], "36.1901");
        assert_eq!(row[9], "44.0092");
    }
}
