#![windows_subsystem = "windows"]
//! Well Data Viewer - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod app;
mod constants;
mod settings;
mod store;
mod theme;
mod types;
mod ui;
mod utils;

use app::App;
use constants::*;
use eframe::egui;
use std::path::PathBuf;
use tracing::info;
use types::Page;
use utils::{format_bytes, get_data_dir};

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "well-data-viewer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,well_data_viewer=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "Well Data Viewer starting");

    // Load saved window position/size
    let settings = settings::Settings::load(&data_dir);
    let win_pos = match (settings.window_x, settings.window_y) {
        (Some(x), Some(y)) => Some(egui::pos2(x, y)),
        _ => None,
    };
    let win_size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) => Some(egui::vec2(w, h)),
        _ => None,
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(win_size.unwrap_or(egui::vec2(1400.0, 860.0)))
        .with_min_inner_size([960.0, 600.0])
        .with_title(APP_NAME);

    let needs_center = win_pos.is_none();

    if let Some(pos) = win_pos {
        viewport = viewport.with_position(pos);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| {
            let mut app = App::new(cc, settings, data_dir);
            app.needs_center = needs_center;
            Ok(Box::new(app))
        }),
    )
}

// ============================================================================
// MAIN UPDATE LOOP & UI RENDERING
// ============================================================================

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window position/size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                self.window_pos = Some(rect.min);
            }
            if let Some(rect) = i.viewport().inner_rect {
                self.window_size = Some(rect.size());
            }
        });

        // Center window on first launch
        if self.needs_center {
            self.needs_center = false;
            if let Some(cmd) = egui::ViewportCommand::center_on_screen(ctx) {
                ctx.send_viewport_cmd(cmd);
            }
        }

        // Left sidebar - navigation (must be added BEFORE CentralPanel)
        egui::SidePanel::left("nav_panel")
            .exact_width(theme::SIDEBAR_WIDTH)
            .resizable(false)
            .show_separator_line(true)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(12, 16)),
            )
            .show(ctx, |ui| {
                // Capture panel rect at start for absolute positioning of the footer
                let panel_max_rect = ui.max_rect();

                ui.add(
                    egui::Label::new(
                        egui::RichText::new("Navigation")
                            .size(theme::FONT_HEADING)
                            .strong()
                            .color(theme::TEXT_PRIMARY),
                    )
                    .selectable(false),
                );
                ui.add_space(theme::SPACING_LG);

                let mut target = None;
                for page in Page::ALL {
                    if theme::nav_item(ui, page.icon(), page.label(), self.page == page) {
                        target = Some(page);
                    }
                }
                if let Some(page) = target {
                    self.navigate(page);
                }

                // Backing file footer - fixed at absolute bottom of panel
                let footer_height = 84.0;
                let footer_rect = egui::Rect::from_min_max(
                    egui::pos2(panel_max_rect.left(), panel_max_rect.bottom() - footer_height),
                    panel_max_rect.max,
                );
                ui.allocate_ui_at_rect(footer_rect, |ui| {
                    ui.set_min_width(footer_rect.width());
                    self.render_data_file_footer(ui);
                });
            });

        // Central panel - active screen (MUST be added LAST after all side panels)
        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::same(20)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.render_page(ui);
                    });
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application shutting down");
        self.save_settings();
    }
}

impl App {
    /// Data file path, picker and open-folder button
    fn render_data_file_footer(&mut self, ui: &mut egui::Ui) {
        ui.label(
            egui::RichText::new("DATA FILE")
                .size(theme::FONT_SMALL)
                .color(theme::TEXT_DIM),
        );
        ui.add_space(theme::SPACING_SM);

        let mut path_changed = false;
        let mut pick = false;
        ui.horizontal(|ui| {
            let te = ui.add(
                egui::TextEdit::singleline(&mut self.data_path_str)
                    .desired_width(ui.available_width() - 32.0)
                    .font(egui::FontId::proportional(theme::FONT_LABEL)),
            );
            path_changed = te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            pick = ui
                .add(egui::Button::new(egui_phosphor::regular::FOLDER_OPEN).frame(false))
                .on_hover_text("Choose data file")
                .clicked();
        });

        if pick {
            if let Some(path) = app::pick_csv() {
                self.set_data_path(path);
            }
        } else if path_changed {
            self.set_data_path(PathBuf::from(self.data_path_str.trim()));
        }

        ui.horizontal(|ui| {
            let size = std::fs::metadata(&self.data_path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "missing".to_string());
            ui.label(
                egui::RichText::new(size)
                    .size(theme::FONT_SMALL)
                    .color(theme::TEXT_DIM),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui_phosphor::regular::ARROW_SQUARE_OUT).frame(false))
                    .on_hover_text("Open containing folder")
                    .clicked()
                {
                    let folder = self
                        .data_path
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| PathBuf::from("."));
                    if let Err(e) = open::that(&folder) {
                        tracing::warn!(error = %e, "Failed to open folder");
                    }
                }
            });
        });
    }
}
