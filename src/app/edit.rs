//! Editable grid over the whole backing file

use super::App;
use crate::store;
use crate::theme;
use crate::types::Notice;
use crate::ui::components;
use eframe::egui;
use tracing::{error, info};

impl App {
    /// Read the backing file for editing (headers cleaned, nothing coerced or dropped)
    pub(crate) fn load_edit_table(&mut self) {
        self.edit_dirty = false;
        match store::load_table(&self.data_path, true) {
            Ok(table) => {
                self.edit_table = Some(table);
                self.edit_error = None;
            }
            Err(e) => {
                error!(error = %e, "Failed to load data for editing");
                self.edit_table = None;
                self.edit_error = Some(format!("Failed to load data for editing: {}", e));
            }
        }
    }

    /// Replace the backing file with the grid contents
    pub(crate) fn save_edits(&mut self) {
        let Some(table) = &self.edit_table else {
            return;
        };
        match store::overwrite(&self.data_path, table) {
            Ok(()) => {
                self.edit_dirty = false;
                self.notice = Some(Notice::Success("Data updated and saved successfully!".to_string()));
            }
            Err(e) => {
                error!(error = %e, "Failed to save changes");
                self.notice = Some(Notice::Error(format!("Failed to save changes: {}", e)));
            }
        }
    }

    pub(crate) fn render_edit(&mut self, ui: &mut egui::Ui) {
        components::page_title(ui, "Edit Existing Well Data");

        if let Some(message) = &self.edit_error {
            components::blocking_error(ui, message);
            return;
        }

        ui.label("You can edit the table below. When you're done, click Save Changes.");
        ui.add_space(theme::SPACING_SM);

        let mut save = false;
        let mut reload = false;
        ui.horizontal(|ui| {
            save = ui
                .add(theme::button_accent(format!(
                    "{}  Save Changes to CSV",
                    egui_phosphor::regular::FLOPPY_DISK
                )))
                .clicked();
            if ui
                .add(theme::button(format!("{}  Add Row", egui_phosphor::regular::PLUS)))
                .clicked()
            {
                if let Some(table) = self.edit_table.as_mut() {
                    let blank = table.blank_row();
                    table.rows.push(blank);
                    self.edit_dirty = true;
                }
            }
            reload = ui
                .add(theme::button(format!("{}  Reload", egui_phosphor::regular::ARROW_CLOCKWISE)))
                .on_hover_text("Discard unsaved edits and read the file again")
                .clicked();

            if self.edit_dirty {
                ui.label(egui::RichText::new("Unsaved changes").color(theme::STATUS_WARNING));
            }
        });

        if let Some(notice) = &self.notice {
            components::notice(ui, notice);
        }
        ui.add_space(theme::SPACING_MD);

        if save {
            self.save_edits();
        }
        if reload {
            info!("Edit grid reloaded");
            self.notice = None;
            self.load_edit_table();
        }

        self.render_edit_grid(ui);
    }

    fn render_edit_grid(&mut self, ui: &mut egui::Ui) {
        use egui_extras::{Column, TableBuilder};

        let Some(table) = self.edit_table.as_mut() else {
            return;
        };

        let mut changed = false;
        let mut remove_row: Option<usize> = None;
        let columns = table.headers.len();
        let height = ui.available_height();

        egui::ScrollArea::horizontal().show(ui, |ui| {
            let mut builder = TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .min_scrolled_height(0.0)
                .max_scroll_height(height);

            builder = builder.column(Column::exact(40.0));
            for _ in 0..columns {
                builder = builder.column(Column::initial(150.0).at_least(60.0).clip(true));
            }

            let headers = &table.headers;
            let rows = &mut table.rows;
            builder
                .header(theme::ROW_HEIGHT + 4.0, |mut header| {
                    header.col(|_ui| {});
                    for name in headers {
                        header.col(|ui| {
                            ui.label(
                                egui::RichText::new(name)
                                    .size(theme::FONT_LABEL)
                                    .strong()
                                    .color(theme::TEXT_SECONDARY),
                            );
                        });
                    }
                })
                .body(|body| {
                    body.rows(theme::EDIT_ROW_HEIGHT, rows.len(), |mut row| {
                        let index = row.index();
                        row.col(|ui| {
                            if ui
                                .add(theme::button_danger(egui_phosphor::regular::TRASH).small())
                                .on_hover_text("Delete row")
                                .clicked()
                            {
                                remove_row = Some(index);
                            }
                        });
                        for col in 0..columns {
                            row.col(|ui| {
                                let cell = &mut rows[index][col];
                                let edit = egui::TextEdit::singleline(cell)
                                    .desired_width(f32::INFINITY)
                                    .font(egui::FontId::proportional(theme::FONT_LABEL));
                                if ui.add(edit).changed() {
                                    changed = true;
                                }
                            });
                        }
                    });
                });
        });

        if let Some(index) = remove_row {
            if index < table.rows.len() {
                table.rows.remove(index);
                changed = true;
            }
        }
        if changed {
            self.edit_dirty = true;
        }
    }
}
