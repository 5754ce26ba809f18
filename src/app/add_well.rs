//! Add new wells by manual entry or by uploading a CSV

use super::{pick_csv, App};
use crate::constants::*;
use crate::store::{self, normalize_header};
use crate::theme;
use crate::types::*;
use crate::ui::components;
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn};

fn text_field(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(value).desired_width(f32::INFINITY));
    ui.end_row();
}

/// Decimals shown for an input step (at least two, like 100.00)
fn step_decimals(step: f64) -> usize {
    (-step.log10()).round().max(2.0) as usize
}

/// Round to `decimals` places
fn snap(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn number_field(ui: &mut egui::Ui, label: &str, value: &mut f64, step: f64) {
    let decimals = step_decimals(step);
    ui.label(label);
    let response = ui.add(
        egui::DragValue::new(value)
            .speed(step)
            .fixed_decimals(decimals),
    );
    // Typed text is taken as-is by the widget
    if response.changed() {
        *value = snap(*value, decimals);
    }
    ui.end_row();
}

/// Parse an Add Well upload. Headers are taken as-is; the required-column
/// check runs against the raw names.
pub(crate) fn inspect_upload(path: PathBuf) -> store::Result<UploadPreview> {
    let table = store::load_table(&path, false)?;
    let missing = store::missing_columns(&table.headers);
    let header_hint = !missing.is_empty() && {
        let cleaned: Vec<String> = table.headers.iter().map(|h| normalize_header(h)).collect();
        store::missing_columns(&cleaned).is_empty()
    };
    if !missing.is_empty() {
        warn!(path = %path.display(), ?missing, "Upload lacks required columns");
    }
    Ok(UploadPreview { path, table, missing, header_hint })
}

impl App {
    pub(crate) fn render_add_well(&mut self, ui: &mut egui::Ui) {
        components::page_title(ui, "Add New Well Data");

        let tabs = [AddTab::Manual, AddTab::Upload];
        let labels: Vec<String> = tabs.iter().map(|t| t.label()).collect();
        let active = tabs.iter().position(|t| *t == self.add_tab).unwrap_or(0);
        if let Some(clicked) = theme::tab_bar(ui, &labels, active) {
            self.add_tab = tabs[clicked];
            self.notice = None;
        }
        ui.add_space(theme::SPACING_LG);

        match self.add_tab {
            AddTab::Manual => self.render_manual_entry(ui),
            AddTab::Upload => self.render_add_upload(ui),
        }

        if let Some(notice) = &self.notice {
            ui.add_space(theme::SPACING_MD);
            components::notice(ui, notice);
        }
    }

    fn render_manual_entry(&mut self, ui: &mut egui::Ui) {
        let mut submitted = false;
        theme::section_frame().show(ui, |ui| {
            ui.columns(2, |cols| {
                let form = &mut self.form;
                egui::Grid::new("add_form_left")
                    .num_columns(2)
                    .spacing([theme::SPACING_LG, theme::SPACING_MD])
                    .show(&mut cols[0], |ui| {
                        text_field(ui, "Well Name", &mut form.well_name);
                        text_field(ui, "Sub District", &mut form.sub_district);
                        text_field(ui, "Basin", &mut form.basin);
                        number_field(ui, "Depth (m)", &mut form.depth, 1.0);
                        text_field(ui, "Geological Formation", &mut form.formation);
                    });
                egui::Grid::new("add_form_right")
                    .num_columns(2)
                    .spacing([theme::SPACING_LG, theme::SPACING_MD])
                    .show(&mut cols[1], |ui| {
                        number_field(ui, "GPS Coor. (UTM) X", &mut form.utm_x, 0.0001);
                        number_field(ui, "GPS Coor. (UTM) Y", &mut form.utm_y, 0.0001);
                        number_field(ui, "Elevation (Meter)", &mut form.elevation, 0.1);
                        number_field(ui, "Latitude (Coordinate X)", &mut form.coord_x, 0.0001);
                        number_field(ui, "Longitude (Coordinate Y)", &mut form.coord_y, 0.0001);
                    });
            });
            ui.add_space(theme::SPACING_MD);
            submitted = ui.add(theme::button_accent("Submit")).clicked();
        });

        if submitted {
            self.submit_form();
        }
    }

    /// Append the form as one row. No duplicate or range checks.
    pub(crate) fn submit_form(&mut self) {
        let row = self.form.to_row();
        match store::append_rows(&self.data_path, &[row]) {
            Ok(_) => {
                info!(well = %self.form.well_name, "Well added");
                self.notice = Some(Notice::Success(format!(
                    "Well '{}' added successfully!",
                    self.form.well_name
                )));
            }
            Err(e) => {
                error!(error = %e, "Failed to add entry");
                self.notice = Some(Notice::Error(format!("Failed to add entry: {}", e)));
            }
        }
    }

    fn render_add_upload(&mut self, ui: &mut egui::Ui) {
        ui.label("Upload a CSV file with the same structure as the original dataset.");
        ui.add_space(theme::SPACING_SM);

        if ui
            .add(theme::button(format!("{}  Choose CSV file", egui_phosphor::regular::FILE_CSV)))
            .clicked()
        {
            if let Some(path) = pick_csv() {
                self.notice = None;
                match inspect_upload(path) {
                    Ok(preview) => self.add_upload = Some(preview),
                    Err(e) => {
                        error!(error = %e, "Error processing upload");
                        self.add_upload = None;
                        self.notice = Some(Notice::Error(format!("Error processing file: {}", e)));
                    }
                }
            }
        }

        let mut append = false;
        if let Some(upload) = &self.add_upload {
            ui.add_space(theme::SPACING_MD);
            ui.label(format!("Preview of uploaded data ({}):", upload.file_name()));
            let rows: Vec<&[String]> = upload.table.rows.iter().map(Vec::as_slice).collect();
            components::data_table(ui, "add_upload_preview", &upload.table.headers, &rows, 300.0);
            ui.add_space(theme::SPACING_MD);

            if upload.missing.is_empty() {
                append = ui
                    .add(theme::button_accent("Append Uploaded Data to Dataset"))
                    .clicked();
            } else {
                components::notice(
                    ui,
                    &Notice::Error(format!("Missing required columns: {:?}", upload.missing)),
                );
                if upload.header_hint {
                    ui.label(
                        egui::RichText::new(
                            "Header names contain extra spaces or line breaks. Clean them up and upload again.",
                        )
                        .color(theme::STATUS_WARNING),
                    );
                }
            }
        }

        if append {
            self.append_add_upload();
        }
    }

    pub(crate) fn append_add_upload(&mut self) {
        let Some(upload) = self.add_upload.take() else {
            return;
        };
        if !upload.missing.is_empty() {
            self.add_upload = Some(upload);
            return;
        }
        match store::append_rows(&self.data_path, &upload.table.rows) {
            Ok(n) => {
                info!(rows = n, "Upload appended");
                self.notice = Some(Notice::Success("Uploaded data appended successfully!".to_string()));
            }
            Err(e) => {
                error!(error = %e, "Append failed");
                self.notice = Some(Notice::Error(format!("Error processing file: {}", e)));
                self.add_upload = Some(upload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::load_table;

    fn full_header() -> String {
        REQUIRED_COLUMNS.join(",")
    }

    #[test]
    fn test_number_inputs_round_to_step_precision() {
        assert_eq!(step_decimals(1.0), 2);
        assert_eq!(step_decimals(0.1), 2);
        assert_eq!(step_decimals(0.0001), 4);

        assert_eq!(snap(36.190_149, step_decimals(0.0001)), 36.1901);
        assert_eq!(snap(412.456, step_decimals(0.1)), 412.46);
        assert_eq!(snap(100.0, step_decimals(1.0)), 100.0);
    }

    #[test]
    fn test_manual_entry_appends_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        app.navigate(Page::AddWell);
        let before = load_table(&app.data_path, true).unwrap();

        app.form = WellForm {
            well_name: "W-1".to_string(),
            depth: 100.0,
            ..Default::default()
        };
        app.submit_form();

        assert_eq!(app.notice, Some(Notice::Success("Well 'W-1' added successfully!".to_string())));
        let after = load_table(&app.data_path, true).unwrap();
        assert_eq!(after.rows.len(), before.rows.len() + 1);
        assert_eq!(&after.rows[..before.rows.len()], &before.rows[..]);
        assert_eq!(
            after.rows.last().unwrap(),
            &vec!["W-1", "", "", "100.0", "", "0.0", "0.0", "0.0", "0.0", "0.0"]
        );
    }

    #[test]
    fn test_duplicate_names_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        app.form.well_name = "W-1".to_string();
        app.submit_form();
        app.submit_form();

        let table = load_table(&app.data_path, true).unwrap();
        let count = table.rows.iter().filter(|r| r[0] == "W-1").count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_upload_missing_columns_blocks_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        let upload = dir.path().join("upload.csv");
        std::fs::write(&upload, "Well Name,Basin\nW-9,Alpha\n").unwrap();

        let preview = inspect_upload(upload).unwrap();
        assert_eq!(preview.missing.len(), 8);
        assert!(!preview.header_hint);

        app.add_upload = Some(preview);
        app.append_add_upload();
        assert!(app.add_upload.is_some());
        assert_eq!(load_table(&app.data_path, true).unwrap().rows.len(), 4);
    }

    #[test]
    fn test_upload_headers_are_not_cleaned_before_check() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("upload.csv");
        let header = full_header().replace("Basin", " Basin ");
        std::fs::write(&upload, format!("{}\nW-9,N,A,1,S,0,0,0,1,2\n", header)).unwrap();

        let preview = inspect_upload(upload).unwrap();
        assert_eq!(preview.missing, vec!["Basin"]);
        assert!(preview.header_hint);
    }

    #[test]
    fn test_valid_upload_appends_rows_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(&dir, Some(SAMPLE));
        let upload = dir.path().join("upload.csv");
        std::fs::write(
            &upload,
            format!("{}\nW-9,N,A,1,S,0,0,0,1,2\nW-10,N,A,2,S,0,0,0,3,4\n", full_header()),
        )
        .unwrap();

        app.add_upload = Some(inspect_upload(upload).unwrap());
        app.append_add_upload();

        assert!(matches!(app.notice, Some(Notice::Success(_))));
        let table = load_table(&app.data_path, true).unwrap();
        assert_eq!(table.rows.len(), 6);
        assert_eq!(table.rows[4][0], "W-9");
        assert_eq!(table.rows[5][0], "W-10");
        assert!(table.rows.iter().all(|r| r[0] != "Well Name"));
    }
}
