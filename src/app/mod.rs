//! App module - contains the main application state and logic

mod add_well;
mod edit;
mod filters;
mod home;
mod map;
mod tiles;
mod viewer;

pub(crate) use filters::FilterState;

use crate::settings::Settings;
use crate::store::{self, StoreError, Table, WorkingSet};
use crate::theme;
use crate::types::*;
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) page: Page,
    pub(crate) data_dir: PathBuf,
    // Backing file
    pub(crate) data_path: PathBuf,
    pub(crate) data_path_str: String,
    // Working set of the current screen (re-read on every navigation)
    pub(crate) working: WorkingSet,
    pub(crate) load_error: Option<String>,
    pub(crate) notice: Option<Notice>,
    // Map viewer
    pub(crate) viewer_tab: ViewerTab,
    pub(crate) filters: FilterState,
    pub(crate) filtered_indices: Vec<usize>,
    pub(crate) viewer_upload: Option<UploadPreview>,
    pub(crate) marker_radius: f32,
    pub(crate) map_view: Option<map::MapView>,
    pub(crate) tiles: tiles::TileCache,
    pub(crate) tile_url: String,
    // Add well
    pub(crate) add_tab: AddTab,
    pub(crate) form: WellForm,
    pub(crate) add_upload: Option<UploadPreview>,
    // Edit well data
    pub(crate) edit_table: Option<Table>,
    pub(crate) edit_error: Option<String>,
    pub(crate) edit_dirty: bool,
    // Window
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, data_dir: PathBuf) -> Self {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        Self::with_settings(settings, data_dir)
    }

    /// State without an egui context; performs the first screen load.
    pub(crate) fn with_settings(settings: Settings, data_dir: PathBuf) -> Self {
        let data_path = settings.data_file_or_default();
        info!(path = %data_path.display(), "Using backing file");
        let tiles = tiles::TileCache::new(data_dir.join("tiles"), settings.tile_url.clone());

        let mut app = Self {
            page: Page::Home,
            data_dir,
            data_path_str: data_path.to_string_lossy().to_string(),
            data_path,
            working: WorkingSet::default(),
            load_error: None,
            notice: None,
            viewer_tab: ViewerTab::Filters,
            filters: FilterState::default(),
            filtered_indices: Vec::new(),
            viewer_upload: None,
            marker_radius: settings.marker_radius,
            map_view: None,
            tiles,
            tile_url: settings.tile_url,
            add_tab: AddTab::Manual,
            form: WellForm::default(),
            add_upload: None,
            edit_table: None,
            edit_error: None,
            edit_dirty: false,
            window_pos: None,
            window_size: None,
            needs_center: false,
        };
        app.load_page();
        app
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            data_file: Some(self.data_path_str.clone()),
            marker_radius: self.marker_radius,
            tile_url: self.tile_url.clone(),
        };
        settings.save(&self.data_dir);
    }

    /// Switch screens. Every switch re-reads the backing file.
    pub fn navigate(&mut self, page: Page) {
        if page == self.page {
            return;
        }
        info!(from = ?self.page, to = ?page, "Navigate");
        self.page = page;
        self.load_page();
    }

    /// Point the app at another backing file and reload the current screen
    pub fn set_data_path(&mut self, path: PathBuf) {
        info!(path = %path.display(), "Backing file changed");
        self.data_path_str = path.to_string_lossy().to_string();
        self.data_path = path;
        self.save_settings();
        self.load_page();
    }

    /// Fresh load for the current screen. Drops notices, pending uploads and
    /// filter selections.
    pub fn load_page(&mut self) {
        self.notice = None;
        self.viewer_upload = None;
        self.add_upload = None;
        self.edit_table = None;
        self.edit_error = None;
        self.edit_dirty = false;

        self.reload_working_set();
        // The edit grid reads the file on its own; a missing file keeps the
        // generic message
        if self.page == Page::EditWell && self.data_path.exists() {
            self.load_edit_table();
        }
    }

    /// Re-read the backing file into the working set and reset filters
    pub(crate) fn reload_working_set(&mut self) {
        match store::load_working_set(&self.data_path) {
            Ok(set) => {
                self.working = set;
                self.load_error = None;
            }
            Err(e) => {
                error!(error = %e, path = %self.data_path.display(), "Failed to load well data");
                self.working = WorkingSet::default();
                self.load_error = Some(match e {
                    StoreError::NotFound(_) => {
                        "CSV file not found. Please check the file path.".to_string()
                    }
                    other => format!("Failed to load data: {}", other),
                });
            }
        }
        self.reset_filters();
    }

    /// Render the active screen into the central panel
    pub fn render_page(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.blocking_message() {
            crate::ui::components::blocking_error(ui, message);
            return;
        }
        match self.page {
            Page::Home => self.render_home(ui),
            Page::MapViewer => self.render_map_viewer(ui),
            Page::AddWell => self.render_add_well(ui),
            Page::EditWell => self.render_edit(ui),
        }
    }
}

impl App {
    /// Error that replaces the current screen, if any
    pub(crate) fn blocking_message(&self) -> Option<&str> {
        let edit_error = match self.page {
            Page::EditWell => self.edit_error.as_deref(),
            _ => None,
        };
        edit_error.or(self.load_error.as_deref())
    }
}

/// Open the native picker for a CSV file
pub(crate) fn pick_csv() -> Option<PathBuf> {
    rfd::FileDialog::new().add_filter("CSV", &["csv"]).pick_file()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const SAMPLE: &str = "Well Name,sub district,Basin,Depth (m),Geological Formation,GPS Coor. (UTM) X,GPS Coor. (UTM) Y,Elevation (Meter),Coordinate X,Coordinate Y
W-1,North,Alpha,120,Sand,1,2,300,12.34,56.78
W-2,South,Beta,80,Clay,3,4,310,13.5,57.1
W-3,South,Alpha,90,Sand,5,6,320,14.0,57.2
W-4,East,Gamma,70,Lime,7,8,330,,57.3
";

    pub fn app_with(dir: &tempfile::TempDir, content: Option<&str>) -> App {
        let path = dir.path().join("wells.csv");
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        let settings = Settings {
            data_file: Some(path.to_string_lossy().to_string()),
            ..Default::default()
        };
        App::with_settings(settings, dir.path().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_missing_file_blocks_every_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, None);
        assert!(app.load_error.as_deref().unwrap().contains("not found"));

        app.navigate(Page::EditWell);
        assert!(app.load_error.is_some());
        assert!(app.edit_table.is_none());
    }

    #[test]
    fn test_navigation_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        assert_eq!(app.working.rows.len(), 3);

        let extra = "W-5,West,Delta,10,Silt,0,0,0,15.0,58.0\n";
        let mut content = SAMPLE.to_string();
        content.push_str(extra);
        std::fs::write(&app.data_path, content).unwrap();

        app.navigate(Page::MapViewer);
        assert_eq!(app.working.rows.len(), 4);
        assert_eq!(app.filtered_indices.len(), 4);
    }

    #[test]
    fn test_edit_screen_loads_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        app.navigate(Page::EditWell);

        let table = app.edit_table.as_ref().unwrap();
        // Rows without coordinates are still editable
        assert_eq!(table.rows.len(), 4);
        assert!(table.headers.iter().any(|h| h == "Coordinate X"));
    }

    #[test]
    fn test_unreadable_file_on_edit_screen_reports_edit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(""));
        assert!(app.blocking_message().unwrap().starts_with("Failed to load data:"));

        app.navigate(Page::EditWell);
        assert!(app
            .blocking_message()
            .unwrap()
            .starts_with("Failed to load data for editing:"));

        // Other screens keep the generic message
        app.navigate(Page::MapViewer);
        assert!(app.blocking_message().unwrap().starts_with("Failed to load data:"));
    }

    #[test]
    fn test_missing_file_on_edit_screen_says_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, None);
        app.navigate(Page::EditWell);
        assert_eq!(
            app.blocking_message(),
            Some("CSV file not found. Please check the file path.")
        );
    }

    #[test]
    fn test_set_data_path_persists_setting() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));

        let other = dir.path().join("other.csv");
        std::fs::write(&other, "Basin,Coordinate X,Coordinate Y\nZeta,1,2\n").unwrap();
        app.set_data_path(other.clone());

        assert_eq!(app.working.rows.len(), 1);
        let saved = Settings::load(dir.path());
        assert_eq!(saved.data_file_or_default(), other);
    }
}
