//! Well map viewer: filters, data table, map and upload-append
//!
//! The map tab itself lives in `map.rs`.

use super::{pick_csv, App};
use crate::store;
use crate::theme;
use crate::types::*;
use crate::ui::components;
use eframe::egui;
use tracing::{error, info};

impl App {
    pub(crate) fn render_map_viewer(&mut self, ui: &mut egui::Ui) {
        components::page_title(ui, "Well Map Viewer");

        ui.horizontal(|ui| {
            let active = ViewerTab::ALL.iter().position(|t| *t == self.viewer_tab).unwrap_or(0);
            let labels: Vec<String> = ViewerTab::ALL.iter().map(|t| t.label()).collect();
            if let Some(clicked) = theme::tab_bar(ui, &labels, active) {
                self.viewer_tab = ViewerTab::ALL[clicked];
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(format!(
                            "Showing {} of {} wells",
                            self.filtered_indices.len(),
                            self.working.rows.len()
                        ))
                        .color(theme::TEXT_DIM),
                    )
                    .selectable(false),
                );
            });
        });
        ui.add_space(theme::SPACING_LG);

        match self.viewer_tab {
            ViewerTab::Filters => self.render_filters_tab(ui),
            ViewerTab::Table => self.render_table_tab(ui),
            ViewerTab::Map => self.render_map_tab(ui),
            ViewerTab::Upload => self.render_viewer_upload_tab(ui),
        }
    }

    fn render_filters_tab(&mut self, ui: &mut egui::Ui) {
        components::subheading(ui, "Filter Options");

        let mut changed = false;
        ui.columns(2, |cols| {
            changed |= components::multi_select(
                &mut cols[0],
                "Select Basin(s):",
                &self.filters.basins,
                &mut self.filters.selected_basins,
            );
            changed |= components::multi_select(
                &mut cols[1],
                "Select Sub-District(s):",
                &self.filters.districts,
                &mut self.filters.selected_districts,
            );
        });
        if changed {
            self.apply_filters();
        }

        ui.add_space(theme::SPACING_MD);
        components::notice(ui, &Notice::Success("Filters applied.".to_string()));
    }

    fn render_table_tab(&mut self, ui: &mut egui::Ui) {
        components::subheading(ui, "Filtered Well Data");
        let rows: Vec<&[String]> = self
            .filtered_indices
            .iter()
            .filter_map(|&i| self.working.rows.get(i))
            .map(|row| row.cells.as_slice())
            .collect();
        let height = ui.available_height();
        components::data_table(ui, "filtered_table", &self.working.headers, &rows, height);
    }

    fn render_viewer_upload_tab(&mut self, ui: &mut egui::Ui) {
        components::subheading(ui, "Upload Additional Well Data (CSV)");
        ui.label(egui::RichText::new("Upload a CSV file with matching column format").color(theme::TEXT_MUTED));
        ui.add_space(theme::SPACING_SM);

        if ui
            .add(theme::button(format!("{}  Choose CSV file", egui_phosphor::regular::FILE_CSV)))
            .clicked()
        {
            if let Some(path) = pick_csv() {
                self.notice = None;
                match store::load_table(&path, true) {
                    Ok(table) => {
                        info!(path = %path.display(), rows = table.rows.len(), "Upload parsed");
                        self.viewer_upload = Some(UploadPreview {
                            path,
                            table,
                            missing: Vec::new(),
                            header_hint: false,
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Upload failed");
                        self.viewer_upload = None;
                        self.notice = Some(Notice::Error(format!("Failed to upload: {}", e)));
                    }
                }
            }
        }

        let mut append = false;
        if let Some(upload) = &self.viewer_upload {
            ui.add_space(theme::SPACING_MD);
            ui.label(format!("Preview of uploaded data ({}):", upload.file_name()));
            let rows: Vec<&[String]> = upload.table.rows.iter().map(Vec::as_slice).collect();
            components::data_table(ui, "viewer_upload_preview", &upload.table.headers, &rows, 300.0);
            ui.add_space(theme::SPACING_MD);
            append = ui
                .add(theme::button_accent("Append Uploaded Data to Dataset"))
                .clicked();
        }

        if append {
            self.append_viewer_upload();
        }

        if let Some(notice) = &self.notice {
            ui.add_space(theme::SPACING_SM);
            components::notice(ui, notice);
        }
    }

    fn append_viewer_upload(&mut self) {
        let Some(upload) = self.viewer_upload.take() else {
            return;
        };
        match store::append_rows(&self.data_path, &upload.table.rows) {
            Ok(_) => {
                self.reload_working_set();
                self.notice = Some(Notice::Success("Data uploaded and appended successfully.".to_string()));
            }
            Err(e) => {
                error!(error = %e, "Append failed");
                self.notice = Some(Notice::Error(format!("Failed to upload: {}", e)));
                self.viewer_upload = Some(upload);
            }
        }
    }
}
