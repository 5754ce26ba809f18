//! Landing screen

use super::App;
use crate::theme;
use crate::ui::components;
use eframe::egui;

const FEATURES: [&str; 3] = [
    "Explore and filter well data",
    "Visualize well locations on a map",
    "Add, upload, and edit well data",
];

impl App {
    pub(crate) fn render_home(&mut self, ui: &mut egui::Ui) {
        components::page_title(ui, "Welcome to the Well Data Viewer");

        ui.label(egui::RichText::new("Features:").strong());
        for feature in FEATURES {
            ui.label(format!("  •  {}", feature));
        }
        ui.add_space(theme::SPACING_XL);

        theme::section_frame().show(ui, |ui| {
            egui::Grid::new("home_summary")
                .num_columns(2)
                .spacing([theme::SPACING_XL, theme::SPACING_SM])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Data file").color(theme::TEXT_DIM));
                    ui.label(self.data_path.display().to_string());
                    ui.end_row();

                    ui.label(egui::RichText::new("Rows in file").color(theme::TEXT_DIM));
                    ui.label(self.working.source_rows.to_string());
                    ui.end_row();

                    ui.label(egui::RichText::new("Wells with coordinates").color(theme::TEXT_DIM));
                    ui.label(self.working.rows.len().to_string());
                    ui.end_row();

                    ui.label(egui::RichText::new("Basins").color(theme::TEXT_DIM));
                    ui.label(self.filters.basins.len().to_string());
                    ui.end_row();
                });
        });
    }
}
