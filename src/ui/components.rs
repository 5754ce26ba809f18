//! Reusable UI components
//!
//! Standalone widgets shared by the screens: page headers, notices,
//! the read-only data grid and the multi-select filter.

use crate::theme;
use crate::types::Notice;
use crate::utils::value_label;
use eframe::egui;
use std::collections::HashSet;

/// Screen title
pub fn page_title(ui: &mut egui::Ui, text: &str) {
    ui.add(
        egui::Label::new(
            egui::RichText::new(text)
                .size(theme::FONT_TITLE)
                .strong()
                .color(theme::TEXT_PRIMARY),
        )
        .selectable(false),
    );
    ui.add_space(theme::SPACING_MD);
}

pub fn subheading(ui: &mut egui::Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .size(theme::FONT_HEADING)
            .color(theme::TEXT_SECONDARY),
    );
    ui.add_space(theme::SPACING_SM);
}

/// Inline success/error message
pub fn notice(ui: &mut egui::Ui, notice: &Notice) {
    let (icon, color, text) = match notice {
        Notice::Success(text) => (egui_phosphor::regular::CHECK_CIRCLE, theme::STATUS_SUCCESS, text),
        Notice::Error(text) => (egui_phosphor::regular::X_CIRCLE, theme::STATUS_ERROR, text),
    };
    ui.label(egui::RichText::new(format!("{}  {}", icon, text)).color(color));
}

/// Error card that replaces the whole screen
pub fn blocking_error(ui: &mut egui::Ui, message: &str) {
    ui.add_space(theme::SPACING_XL);
    theme::error_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(
            egui::RichText::new(format!("{}  {}", egui_phosphor::regular::WARNING_CIRCLE, message))
                .size(theme::FONT_BODY)
                .color(theme::STATUS_ERROR),
        );
    });
}

/// Read-only grid. `rows` are borrowed cell slices so callers can pass a
/// filtered subset without cloning.
pub fn data_table(ui: &mut egui::Ui, id: &str, headers: &[String], rows: &[&[String]], max_height: f32) {
    use egui_extras::{Column, TableBuilder};

    ui.push_id(id, |ui| {
        egui::ScrollArea::horizontal().show(ui, |ui| {
            let mut table = TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .min_scrolled_height(0.0)
                .max_scroll_height(max_height);

            table = table.column(Column::exact(48.0));
            for _ in headers {
                table = table.column(Column::initial(140.0).at_least(60.0).clip(true));
            }

            table
                .header(theme::ROW_HEIGHT + 4.0, |mut header| {
                    header.col(|ui| {
                        ui.label(egui::RichText::new("#").color(theme::TEXT_DIM));
                    });
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
                    body.rows(theme::ROW_HEIGHT, rows.len(), |mut row| {
                        let index = row.index();
                        let cells = rows[index];
                        row.col(|ui| {
                            ui.label(egui::RichText::new(index.to_string()).color(theme::TEXT_DIM));
                        });
                        for i in 0..headers.len() {
                            row.col(|ui| {
                                ui.label(cells.get(i).map(String::as_str).unwrap_or(""));
                            });
                        }
                    });
                });
        });
    });
}

/// Multi-select list with All/None shortcuts. Returns true if the selection
/// changed.
pub fn multi_select(
    ui: &mut egui::Ui,
    title: &str,
    options: &[String],
    selected: &mut HashSet<String>,
) -> bool {
    let mut changed = false;

    theme::section_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(title).strong().color(theme::TEXT_SECONDARY));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(theme::button("None")).clicked() && !selected.is_empty() {
                    selected.clear();
                    changed = true;
                }
                if ui.add(theme::button("All")).clicked() && selected.len() != options.len() {
                    selected.extend(options.iter().cloned());
                    changed = true;
                }
                ui.label(
                    egui::RichText::new(format!("{}/{}", selected.len(), options.len()))
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_DIM),
                );
            });
        });
        ui.add_space(theme::SPACING_SM);

        ui.push_id(title, |ui| {
            egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                for option in options {
                    let is_selected = selected.contains(option);
                    if theme::checkbox_row(ui, is_selected, value_label(option)) {
                        if is_selected {
                            selected.remove(option);
                        } else {
                            selected.insert(option.clone());
                        }
                        changed = true;
                    }
                }
            });
        });
    });

    changed
}
