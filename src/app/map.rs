//! Well locations on a slippy-map basemap

use super::tiles::TileId;
use super::App;
use crate::constants::*;
use crate::store::WorkingSet;
use crate::theme;
use crate::ui::components;
use crate::utils::{format_number, value_label};
use eframe::egui;
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 18.0;
const MAX_LAT: f64 = 85.051_128_78;
/// Extra pick distance around a marker, in points
const HOVER_SLOP: f32 = 2.0;

/// One well on the map
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// All wells of one basin, drawn in one color
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapSeries {
    pub basin: String,
    pub color_index: usize,
    pub points: Vec<MapPoint>,
}

/// Group the given rows into per-basin series. Colors follow the basin's
/// first appearance in the whole working set so they stay put while filtering.
pub(crate) fn map_series(set: &WorkingSet, indices: &[usize]) -> Vec<MapSeries> {
    let all_basins = set.distinct(COL_BASIN);
    let mut series: Vec<MapSeries> = Vec::new();

    for &i in indices {
        let Some(row) = set.rows.get(i) else {
            continue;
        };
        let basin = set.text(row, COL_BASIN);
        let depth = row.depth.map(format_number).unwrap_or_default();
        let point = MapPoint {
            lat: row.lat,
            lon: row.lon,
            label: format!(
                "{}\n{}: {}\n{}: {}",
                set.text(row, COL_WELL_NAME),
                COL_DEPTH,
                depth,
                COL_FORMATION,
                set.text(row, COL_FORMATION)
            ),
        };

        match series.iter_mut().find(|s| s.basin == basin) {
            Some(s) => s.points.push(point),
            None => series.push(MapSeries {
                basin: basin.to_string(),
                color_index: all_basins.iter().position(|b| b == basin).unwrap_or(0),
                points: vec![point],
            }),
        }
    }

    series
}

// ============================================================================
// WEB MERCATOR
// ============================================================================

/// World pixel position of a coordinate at `zoom`
pub(crate) fn project(lon: f64, lat: f64, zoom: f64) -> [f64; 2] {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (lon + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    [x, y]
}

/// Inverse of [`project`], returns (lon, lat)
pub(crate) fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lon = x / scale * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / scale)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Center and zoom of the map widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MapView {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
}

impl MapView {
    /// Centered on the mean position of the wells at the default zoom
    pub fn centered_on(series: &[MapSeries]) -> Self {
        let points: Vec<&MapPoint> = series.iter().flat_map(|s| &s.points).collect();
        if points.is_empty() {
            return Self { lon: 0.0, lat: 0.0, zoom: 2.0 };
        }
        let n = points.len() as f64;
        Self {
            lon: points.iter().map(|p| p.lon).sum::<f64>() / n,
            lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
            zoom: DEFAULT_MAP_ZOOM,
        }
    }

    pub fn to_screen(&self, lon: f64, lat: f64, rect: egui::Rect) -> egui::Pos2 {
        let c = project(self.lon, self.lat, self.zoom);
        let p = project(lon, lat, self.zoom);
        rect.center() + egui::vec2((p[0] - c[0]) as f32, (p[1] - c[1]) as f32)
    }

    pub fn from_screen(&self, pos: egui::Pos2, rect: egui::Rect) -> (f64, f64) {
        let c = project(self.lon, self.lat, self.zoom);
        let offset = pos - rect.center();
        unproject(c[0] + offset.x as f64, c[1] + offset.y as f64, self.zoom)
    }

    fn recenter(&mut self, lon: f64, lat: f64) {
        self.lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
        self.lat = lat.clamp(-MAX_LAT, MAX_LAT);
    }

    /// Move the map with the pointer
    pub fn pan(&mut self, delta: egui::Vec2) {
        let c = project(self.lon, self.lat, self.zoom);
        let (lon, lat) = unproject(c[0] - delta.x as f64, c[1] - delta.y as f64, self.zoom);
        self.recenter(lon, lat);
    }

    /// Change zoom by `steps` levels keeping the coordinate under `anchor` in place
    pub fn zoom_at(&mut self, steps: f64, anchor: egui::Pos2, rect: egui::Rect) {
        let (lon, lat) = self.from_screen(anchor, rect);
        self.zoom = (self.zoom + steps).clamp(MIN_ZOOM, MAX_ZOOM);
        let a = project(lon, lat, self.zoom);
        let offset = anchor - rect.center();
        let (lon, lat) = unproject(a[0] - offset.x as f64, a[1] - offset.y as f64, self.zoom);
        self.recenter(lon, lat);
    }

    /// Tiles covering `rect` and where each one lands on screen. Fractional
    /// zoom scales the nearest integer level.
    pub fn visible_tiles(&self, rect: egui::Rect) -> Vec<(TileId, egui::Rect)> {
        let tile_zoom = self.zoom.round().clamp(0.0, MAX_ZOOM) as u8;
        let scale = 2f64.powf(self.zoom - tile_zoom as f64);
        let tile_px = (TILE_SIZE * scale) as f32;
        let c = project(self.lon, self.lat, tile_zoom as f64);
        let half_w = rect.width() as f64 / 2.0 / scale;
        let half_h = rect.height() as f64 / 2.0 / scale;

        let x0 = ((c[0] - half_w) / TILE_SIZE).floor() as i64;
        let x1 = ((c[0] + half_w) / TILE_SIZE).ceil() as i64 - 1;
        let y0 = ((c[1] - half_h) / TILE_SIZE).floor() as i64;
        let y1 = ((c[1] + half_h) / TILE_SIZE).ceil() as i64 - 1;

        let mut tiles = Vec::new();
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let Some(id) = TileId::wrapped(tile_zoom, tx, ty) else {
                    continue;
                };
                let min = rect.center()
                    + egui::vec2(
                        ((tx as f64 * TILE_SIZE - c[0]) * scale) as f32,
                        ((ty as f64 * TILE_SIZE - c[1]) * scale) as f32,
                    );
                tiles.push((id, egui::Rect::from_min_size(min, egui::vec2(tile_px, tile_px))));
            }
        }
        tiles
    }
}

/// Index of the marker under `pointer`, nearest first. Markers further than
/// their radius away are never picked.
pub(crate) fn marker_at(markers: &[egui::Pos2], pointer: egui::Pos2, radius: f32) -> Option<usize> {
    markers
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(pointer)))
        .filter(|(_, d)| *d <= radius + HOVER_SLOP)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

impl App {
    pub(crate) fn render_map_tab(&mut self, ui: &mut egui::Ui) {
        let series = map_series(&self.working, &self.filtered_indices);
        let mut view = *self.map_view.get_or_insert_with(|| MapView::centered_on(&series));

        ui.horizontal(|ui| {
            components::subheading(ui, "Well Locations on Map");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(theme::button(format!("{}  Reset view", egui_phosphor::regular::CROSSHAIR)))
                    .clicked()
                {
                    view = MapView::centered_on(&series);
                    self.tiles.retry_failed();
                }
                ui.add(egui::Slider::new(&mut self.marker_radius, 2.0..=10.0).text("Marker size"));
            });
        });

        let size = egui::vec2(ui.available_width(), theme::MAP_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, theme::MAP_BACKGROUND);

        // Interaction first so this frame draws the updated view
        if response.dragged() {
            view.pan(response.drag_delta());
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
        if let Some(hover_pos) = response.hover_pos() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                view.zoom_at(scroll as f64 * 0.005, hover_pos, rect);
            }
        }
        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                view.zoom_at(1.0, pos, rect);
            }
        }

        // Basemap
        let ctx = ui.ctx().clone();
        for (id, tile_rect) in view.visible_tiles(rect) {
            if let Some(texture) = self.tiles.texture(&ctx, id) {
                painter.image(
                    texture.id(),
                    tile_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        }

        // Markers
        let radius = self.marker_radius;
        let outline = egui::Stroke::new(theme::STROKE_DEFAULT, egui::Color32::from_black_alpha(160));
        let mut screen = Vec::new();
        let mut labels = Vec::new();
        for s in &series {
            let color = theme::basin_color(s.color_index);
            for p in &s.points {
                let pos = view.to_screen(p.lon, p.lat, rect);
                painter.circle(pos, radius, color, outline);
                screen.push(pos);
                labels.push(p.label.as_str());
            }
        }

        self.render_map_legend(&painter, rect, &series);
        painter.text(
            rect.right_bottom() - egui::vec2(6.0, 4.0),
            egui::Align2::RIGHT_BOTTOM,
            TILE_ATTRIBUTION,
            egui::FontId::proportional(theme::FONT_SMALL),
            egui::Color32::from_gray(60),
        );

        if let Some(pointer) = response.hover_pos() {
            if let Some(i) = marker_at(&screen, pointer, radius) {
                let label = labels[i];
                response.on_hover_ui_at_pointer(|ui| {
                    let mut lines = label.lines();
                    if let Some(name) = lines.next() {
                        ui.label(egui::RichText::new(name).strong());
                    }
                    for line in lines {
                        ui.label(line);
                    }
                });
            }
        }

        self.map_view = Some(view);
    }

    fn render_map_legend(&self, painter: &egui::Painter, rect: egui::Rect, series: &[MapSeries]) {
        if series.is_empty() {
            return;
        }
        let row_h = 18.0;
        let origin = rect.left_top() + egui::vec2(10.0, 10.0);
        let legend = egui::Rect::from_min_size(
            origin,
            egui::vec2(180.0, row_h * (series.len() as f32 + 1.0) + 8.0),
        );
        painter.rect_filled(legend, theme::RADIUS_DEFAULT, egui::Color32::from_black_alpha(190));
        painter.text(
            origin + egui::vec2(8.0, 4.0 + row_h / 2.0),
            egui::Align2::LEFT_CENTER,
            COL_BASIN,
            egui::FontId::proportional(theme::FONT_LABEL),
            theme::TEXT_MUTED,
        );
        for (i, s) in series.iter().enumerate() {
            let y = origin.y + 4.0 + row_h * (i as f32 + 1.5);
            painter.circle_filled(egui::pos2(origin.x + 14.0, y), 5.0, theme::basin_color(s.color_index));
            painter.text(
                egui::pos2(origin.x + 26.0, y),
                egui::Align2::LEFT_CENTER,
                value_label(&s.basin),
                egui::FontId::proportional(theme::FONT_LABEL),
                theme::TEXT_PRIMARY,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::parse_csv;

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(512.0, 512.0))
    }

    #[test]
    fn test_single_well_lands_on_its_coordinates() {
        let content = "Well Name,Basin,Depth (m),Geological Formation,Coordinate X,Coordinate Y\nW-1,Alpha,120,Sand,12.34,56.78\n";
        let set = WorkingSet::from_table(parse_csv(content.as_bytes(), true).unwrap());

        let series = map_series(&set, &[0]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].basin, "Alpha");
        assert_eq!(series[0].points.len(), 1);
        let point = &series[0].points[0];
        assert_eq!((point.lat, point.lon), (12.34, 56.78));
        assert!(point.label.starts_with("W-1\n"));
        assert!(point.label.contains("Depth (m): 120.0"));
        assert!(point.label.contains("Geological Formation: Sand"));

        // The view opens on the well
        let view = MapView::centered_on(&series);
        assert_eq!((view.lat, view.lon, view.zoom), (12.34, 56.78, DEFAULT_MAP_ZOOM));
        assert_eq!(view.to_screen(56.78, 12.34, rect()), rect().center());
    }

    #[test]
    fn test_series_colors_stable_under_filtering() {
        let set = WorkingSet::from_table(parse_csv(SAMPLE.as_bytes(), true).unwrap());
        let all = map_series(&set, &[0, 1, 2]);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].points.len(), 2);

        // Beta alone keeps its color slot
        let beta = map_series(&set, &[1]);
        assert_eq!(beta[0].basin, "Beta");
        assert_eq!(beta[0].color_index, 1);
    }

    #[test]
    fn test_projection() {
        assert_eq!(project(0.0, 0.0, 0.0), [128.0, 128.0]);
        let [x, y] = project(44.01, 36.19, 10.0);
        let (lon, lat) = unproject(x, y, 10.0);
        assert!((lon - 44.01).abs() < 1e-9);
        assert!((lat - 36.19).abs() < 1e-9);
    }

    #[test]
    fn test_visible_tiles_cover_view() {
        let view = MapView { lon: 0.0, lat: 0.0, zoom: 1.0 };
        let tiles = view.visible_tiles(rect());
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|(id, r)| id.z == 1 && r.width() == 256.0));
        assert_eq!(tiles[0].1.min, egui::pos2(0.0, 0.0));
    }

    #[test]
    fn test_zoom_keeps_anchor_in_place() {
        let mut view = MapView { lon: 44.0, lat: 36.0, zoom: 10.0 };
        let anchor = egui::pos2(400.0, 100.0);
        let before = view.from_screen(anchor, rect());

        view.zoom_at(1.5, anchor, rect());
        let after = view.from_screen(anchor, rect());
        assert_eq!(view.zoom, 11.5);
        assert!((before.0 - after.0).abs() < 1e-6);
        assert!((before.1 - after.1).abs() < 1e-6);

        view.zoom_at(100.0, anchor, rect());
        assert_eq!(view.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_pan_moves_center_against_drag() {
        let mut view = MapView { lon: 44.0, lat: 36.0, zoom: 10.0 };
        view.pan(egui::vec2(100.0, 0.0));
        assert!(view.lon < 44.0);
        assert!((view.lat - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_hover_only_picks_markers_under_pointer() {
        let markers = vec![egui::pos2(100.0, 100.0), egui::pos2(104.0, 100.0), egui::pos2(300.0, 300.0)];
        assert_eq!(marker_at(&markers, egui::pos2(103.0, 100.0), 4.0), Some(1));
        assert_eq!(marker_at(&markers, egui::pos2(301.0, 299.0), 4.0), Some(2));
        // Empty map space shows no well, however close the nearest one is
        assert_eq!(marker_at(&markers, egui::pos2(200.0, 200.0), 4.0), None);
        assert_eq!(marker_at(&markers, egui::pos2(100.0, 110.0), 4.0), None);
        assert_eq!(marker_at(&[], egui::pos2(0.0, 0.0), 4.0), None);
    }
}
