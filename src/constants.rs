//! Application constants and column names

pub const APP_NAME: &str = "Well Data Viewer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backing file used when settings do not name one
pub const DEFAULT_DATA_FILE: &str = "Wells detailed data.csv";

// Map tiles
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_USER_AGENT: &str = concat!("well-data-viewer/", env!("CARGO_PKG_VERSION"));
pub const TILE_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";
/// Zoom level the map opens at
pub const DEFAULT_MAP_ZOOM: f64 = 10.0;

pub const COL_WELL_NAME: &str = "Well Name";
pub const COL_SUB_DISTRICT: &str = "sub district";
pub const COL_BASIN: &str = "Basin";
pub const COL_DEPTH: &str = "Depth (m)";
pub const COL_FORMATION: &str = "Geological Formation";
pub const COL_UTM_X: &str = "GPS Coor. (UTM) X";
pub const COL_UTM_Y: &str = "GPS Coor. (UTM) Y";
pub const COL_ELEVATION: &str = "Elevation (Meter)";
pub const COL_COORD_X: &str = "Coordinate X";
pub const COL_COORD_Y: &str = "Coordinate Y";

/// Names given to the coordinate columns after coercion
pub const COL_LAT: &str = "lat";
pub const COL_LON: &str = "lon";

/// Columns an Add Well upload must carry, in the order manual entries are written
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_WELL_NAME,
    COL_SUB_DISTRICT,
    COL_BASIN,
    COL_DEPTH,
    COL_FORMATION,
    COL_UTM_X,
    COL_UTM_Y,
    COL_ELEVATION,
    COL_COORD_X,
    COL_COORD_Y,
];

/// Label shown for empty filter values
pub const BLANK_LABEL: &str = "(blank)";
