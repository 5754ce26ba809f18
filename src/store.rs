//! CSV storage for well records
//! Reads the backing file, cleans up headers, coerces numeric columns and
//! writes rows back (append or full overwrite).

use crate::constants::*;
use crate::utils::format_number;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum StoreError {
    NotFound(PathBuf),
    Io(io::Error),
    /// No header row to parse
    Empty,
    Csv(csv::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(path) => write!(f, "CSV file not found: {}", path.display()),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Empty => write!(f, "No columns to parse from file"),
            StoreError::Csv(e) => write!(f, "CSV parse error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Header row plus string cells as read from a CSV file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows the permissive reader dropped
    pub skipped: usize,
}

impl Table {
    pub fn blank_row(&self) -> Vec<String> {
        vec![String::new(); self.headers.len()]
    }
}

/// Trim a header and flatten embedded line breaks
pub fn normalize_header(name: &str) -> String {
    name.trim().replace('\n', " ").replace('\r', "")
}

/// Parse a cell as a finite number. Anything else counts as missing.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse CSV content, skipping rows that have more fields than the header or
/// that the reader rejects. Short rows are padded with empty cells. The reader
/// itself drops blank lines; a quoted empty field (`""`) is a real row.
pub fn parse_csv<R: Read>(input: R, normalize_headers: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| {
            if normalize_headers {
                normalize_header(h)
            } else {
                h.to_string()
            }
        })
        .collect();

    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(StoreError::Empty);
    }

    let mut rows = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable row");
                skipped += 1;
                continue;
            }
        };

        if record.len() > headers.len() {
            debug!(
                line = record.position().map(|p| p.line()).unwrap_or(0),
                fields = record.len(),
                expected = headers.len(),
                "Skipping row with too many fields"
            );
            skipped += 1;
            continue;
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    if skipped > 0 {
        warn!(skipped, kept = rows.len(), "Malformed rows skipped while parsing");
    }

    Ok(Table { headers, rows, skipped })
}

/// Read a CSV file from disk
pub fn load_table(path: &Path, normalize_headers: bool) -> Result<Table> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let table = parse_csv(file, normalize_headers)?;
    debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.headers.len(),
        skipped = table.skipped,
        "CSV loaded"
    );
    Ok(table)
}

// ============================================================================
// WORKING SET
// ============================================================================

/// A coordinate-valid well
#[derive(Debug, Clone, PartialEq)]
pub struct WellRow {
    pub cells: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    pub depth: Option<f64>,
}

/// Rows usable for filtering, mapping and table display
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    pub headers: Vec<String>,
    pub rows: Vec<WellRow>,
    /// Rows in the file before coordinate filtering
    pub source_rows: usize,
}

impl WorkingSet {
    /// Coerce depth and coordinates, rename coordinates to lat/lon and drop
    /// rows without both coordinates.
    pub fn from_table(table: Table) -> Self {
        let Table { mut headers, mut rows, .. } = table;
        let source_rows = rows.len();

        let (lat_idx, lat) = coerce_column(&mut headers, &mut rows, COL_COORD_X);
        let (lon_idx, lon) = coerce_column(&mut headers, &mut rows, COL_COORD_Y);
        let (_, depth) = coerce_column(&mut headers, &mut rows, COL_DEPTH);
        headers[lat_idx] = COL_LAT.to_string();
        headers[lon_idx] = COL_LON.to_string();

        let rows: Vec<WellRow> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, cells)| {
                Some(WellRow {
                    cells,
                    lat: lat[i]?,
                    lon: lon[i]?,
                    depth: depth[i],
                })
            })
            .collect();

        let dropped = source_rows - rows.len();
        if dropped > 0 {
            warn!(dropped, "Rows without numeric coordinates excluded");
        }

        Self { headers, rows, source_rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell text for a named column, empty when the column is absent
    pub fn text<'a>(&self, row: &'a WellRow, column: &str) -> &'a str {
        self.column_index(column)
            .and_then(|i| row.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Distinct values of a column in first-seen order
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut values = Vec::new();
        for row in &self.rows {
            let value = self.text(row, column);
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }
        values
    }
}

/// Rewrite a column as numbers, adding it (all missing) when absent.
/// Returns the column index and the parsed values.
fn coerce_column(
    headers: &mut Vec<String>,
    rows: &mut [Vec<String>],
    name: &str,
) -> (usize, Vec<Option<f64>>) {
    let idx = match headers.iter().position(|h| h == name) {
        Some(idx) => idx,
        None => {
            debug!(column = name, "Column absent, treating as missing");
            headers.push(name.to_string());
            for row in rows.iter_mut() {
                row.push(String::new());
            }
            headers.len() - 1
        }
    };

    let values = rows
        .iter_mut()
        .map(|row| {
            let value = parse_number(&row[idx]);
            row[idx] = value.map(format_number).unwrap_or_default();
            value
        })
        .collect();

    (idx, values)
}

/// Load the backing file and project it to the working set
pub fn load_working_set(path: &Path) -> Result<WorkingSet> {
    let table = load_table(path, true)?;
    let set = WorkingSet::from_table(table);
    info!(
        path = %path.display(),
        rows = set.source_rows,
        usable = set.rows.len(),
        "Well data loaded"
    );
    Ok(set)
}

/// Columns from `REQUIRED_COLUMNS` that `headers` lacks (exact match)
pub fn missing_columns(headers: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect()
}

// ============================================================================
// WRITES
// ============================================================================

fn encode(header: Option<&[String]>, rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}

fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Append rows (no header) to the end of the file
pub fn append_rows(path: &Path, rows: &[Vec<String>]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut bytes = encode(None, rows)?;
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?;

    if ends_without_newline(&mut file)? {
        bytes.insert(0, b'\n');
    }
    file.write_all(&bytes)?;

    info!(path = %path.display(), rows = rows.len(), "Rows appended");
    Ok(rows.len())
}

/// Replace the whole file with the header and rows of `table`
pub fn overwrite(path: &Path, table: &Table) -> Result<()> {
    let bytes = encode(Some(&table.headers), &table.rows)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), rows = table.rows.len(), "File overwritten");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Well Name,sub district,Basin,Depth (m),Geological Formation,GPS Coor. (UTM) X,GPS Coor. (UTM) Y,Elevation (Meter),Coordinate X,Coordinate Y
W-1,North,Alpha,120,Sand,1,2,300,12.34,56.78
W-2,South,Beta,abc,Clay,3,4,310,13.5,57.1
W-3,South,Alpha,90,Sand,5,6,320,n/a,57.2
";

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_header_variants() {
        for raw in ["Basin", "  Basin", "Basin \n", "\r\nBasin\t"] {
            assert_eq!(normalize_header(raw), "Basin");
        }
        assert_eq!(normalize_header(" Depth\n(m) "), "Depth (m)");
        assert_eq!(normalize_header("Elevation\r\n(Meter)"), "Elevation (Meter)");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_skips_long_rows_and_pads_short_ones() {
        let content = "a,b,c\n1,2,3\n4,5,6,7\n8,9\n\n10,11,12\n";
        let table = parse_csv(content.as_bytes(), true).unwrap();

        assert_eq!(table.headers, row(&["a", "b", "c"]));
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], row(&["8", "9", ""]));
        assert_eq!(table.skipped, 1);
    }

    #[test]
    fn test_quoted_empty_row_survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "names.csv", "Well Name\nW-1\n\"\"\n\nW-2\n");

        let table = load_table(&path, true).unwrap();
        assert_eq!(table.rows, vec![row(&["W-1"]), row(&[""]), row(&["W-2"])]);

        overwrite(&path, &table).unwrap();
        let reloaded = load_table(&path, true).unwrap();
        assert_eq!(reloaded.rows, table.rows);
    }

    #[test]
    fn test_parse_normalizes_quoted_headers_only_when_asked() {
        let content = "\"Well\nName\", Basin \nW-1,Alpha\n";

        let normalized = parse_csv(content.as_bytes(), true).unwrap();
        assert_eq!(normalized.headers, row(&["Well Name", "Basin"]));

        let raw = parse_csv(content.as_bytes(), false).unwrap();
        assert_eq!(raw.headers, row(&["Well\nName", " Basin "]));
    }

    #[test]
    fn test_parse_empty_input_is_an_error() {
        assert!(matches!(parse_csv("".as_bytes(), true), Err(StoreError::Empty)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_working_set(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_working_set_drops_rows_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", SAMPLE);

        let set = load_working_set(&path).unwrap();
        assert_eq!(set.source_rows, 3);
        assert_eq!(set.rows.len(), 2);
        assert!(set.column_index(COL_LAT).is_some());
        assert!(set.column_index(COL_LON).is_some());
        assert!(set.column_index(COL_COORD_X).is_none());

        // The excluded row is still on disk
        let table = load_table(&path, true).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2][0], "W-3");
    }

    #[test]
    fn test_working_set_coerces_depth() {
        let set = WorkingSet::from_table(parse_csv(SAMPLE.as_bytes(), true).unwrap());

        assert_eq!(set.rows[0].depth, Some(120.0));
        assert_eq!(set.text(&set.rows[0], COL_DEPTH), "120.0");
        assert_eq!(set.rows[1].depth, None);
        assert_eq!(set.text(&set.rows[1], COL_DEPTH), "");
    }

    #[test]
    fn test_single_row_coordinates() {
        let set = WorkingSet::from_table(parse_csv(SAMPLE.as_bytes(), true).unwrap());
        let first = &set.rows[0];
        assert_eq!((first.lat, first.lon), (12.34, 56.78));
        assert_eq!(set.text(first, COL_BASIN), "Alpha");
    }

    #[test]
    fn test_missing_coordinate_column_empties_working_set() {
        let content = "Well Name,Basin,Coordinate Y\nW-1,Alpha,5\n";
        let set = WorkingSet::from_table(parse_csv(content.as_bytes(), true).unwrap());

        assert_eq!(set.source_rows, 1);
        assert!(set.rows.is_empty());
        assert!(set.column_index(COL_LAT).is_some());
        assert!(set.column_index(COL_DEPTH).is_some());
    }

    #[test]
    fn test_distinct_keeps_first_seen_order() {
        let content = "Basin,Coordinate X,Coordinate Y\nB,1,1\nA,1,1\nB,1,1\n,1,1\n";
        let set = WorkingSet::from_table(parse_csv(content.as_bytes(), true).unwrap());
        assert_eq!(set.distinct(COL_BASIN), row(&["B", "A", ""]));
        assert_eq!(set.distinct("sub district"), row(&[""]));
    }

    #[test]
    fn test_missing_columns_lists_every_absent_name() {
        let headers = row(&["Well Name", "Basin", "Coordinate X"]);
        let missing = missing_columns(&headers);
        assert_eq!(missing.len(), 7);
        assert!(missing.contains(&"sub district"));
        assert!(missing.contains(&"Coordinate Y"));
        assert!(!missing.contains(&"Basin"));

        let all: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(missing_columns(&all).is_empty());
    }

    #[test]
    fn test_append_adds_exactly_n_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", SAMPLE);
        let before = load_table(&path, true).unwrap();

        let new_rows = vec![
            row(&["W-4", "East", "Gamma", "10", "Lime", "0", "0", "0", "1", "2"]),
            row(&["W, 5", "East", "Gamma", "", "", "", "", "", "3", "4"]),
        ];
        assert_eq!(append_rows(&path, &new_rows).unwrap(), 2);

        let after = load_table(&path, true).unwrap();
        assert_eq!(after.rows.len(), before.rows.len() + 2);
        assert_eq!(&after.rows[..before.rows.len()], &before.rows[..]);
        assert_eq!(after.rows[4][0], "W, 5");
    }

    #[test]
    fn test_append_to_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", "a,b\n1,2");

        append_rows(&path, &[row(&["3", "4"])]).unwrap();

        let table = load_table(&path, true).unwrap();
        assert_eq!(table.rows, vec![row(&["1", "2"]), row(&["3", "4"])]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn test_append_nothing_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", SAMPLE);
        assert_eq!(append_rows(&path, &[]).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_overwrite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", SAMPLE);

        let loaded = load_table(&path, true).unwrap();
        overwrite(&path, &loaded).unwrap();
        let reloaded = load_table(&path, true).unwrap();

        assert_eq!(reloaded.headers, loaded.headers);
        assert_eq!(reloaded.rows, loaded.rows);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "wells.csv", SAMPLE);

        let mut table = load_table(&path, true).unwrap();
        table.rows.truncate(1);
        table.rows[0][0] = "Renamed".to_string();
        overwrite(&path, &table).unwrap();

        let reloaded = load_table(&path, true).unwrap();
        assert_eq!(reloaded.rows.len(), 1);
        assert_eq!(reloaded.rows[0][0], "Renamed");
    }
}
