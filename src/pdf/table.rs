//! Table detection and labeled tables
//!
//! Detection works on positioned characters: characters are grouped into
//! lines, lines are split into cells at wide horizontal gaps, and runs of
//! consecutive lines with the same cell count become tables.

use super::types::Rect;
use serde::Serialize;
use serde_json::{Map, Value};

/// Settings for text-geometry table detection
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    /// Maximum vertical distance between character tops on the same line
    pub y_tolerance: f32,
    /// Minimum horizontal gap that separates two cells
    pub cell_gap: f32,
    /// Minimum number of rows (header included) for a table
    pub min_rows: usize,
    /// Minimum number of columns for a table
    pub min_columns: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            y_tolerance: 3.0,
            cell_gap: 8.0,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

/// Character with its bounds, as read from a page's text layer
#[derive(Debug, Clone)]
pub struct CharBox {
    pub char: char,
    /// X coordinate (left)
    pub x: f32,
    /// Y coordinate (top)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Table found by a backend: raw cell text, no header interpretation yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGrid {
    pub bbox: Option<Rect>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Cells of one line with the line's extent
struct LineCells {
    cells: Vec<String>,
    top: f32,
    bottom: f32,
    min_x: f32,
    max_x: f32,
}

/// Detect tables in a page's characters
pub fn detect_tables(chars: Vec<CharBox>, settings: &TableSettings) -> Vec<TableGrid> {
    let lines = group_into_lines(chars, settings.y_tolerance);
    let lines: Vec<LineCells> = lines
        .into_iter()
        .map(|line| split_cells(line, settings.cell_gap))
        .collect();

    let mut tables = Vec::new();
    let mut start = 0;
    while start < lines.len() {
        let width = lines[start].cells.len();
        let mut end = start + 1;
        while end < lines.len() && lines[end].cells.len() == width {
            end += 1;
        }

        let run = &lines[start..end];
        if width >= settings.min_columns.max(1) && run.len() >= settings.min_rows {
            tables.push(grid_from_run(run));
        }
        start = end;
    }

    tables
}

/// Group characters into lines, top to bottom, each line sorted left to right
fn group_into_lines(mut chars: Vec<CharBox>, y_tolerance: f32) -> Vec<Vec<CharBox>> {
    // Y descending (top to bottom in PDF coordinates), then X ascending
    chars.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<CharBox>> = Vec::new();
    let mut current: Vec<CharBox> = Vec::new();
    let mut current_y: Option<f32> = None;

    for c in chars {
        match current_y {
            Some(y) if (y - c.y).abs() <= y_tolerance => current.push(c),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current_y = Some(c.y);
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    lines
}

fn split_cells(line: Vec<CharBox>, cell_gap: f32) -> LineCells {
    let top = line.iter().map(|c| c.y).fold(f32::MIN, f32::max);
    let bottom = line.iter().map(|c| c.y - c.height).fold(f32::MAX, f32::min);
    let min_x = line.iter().map(|c| c.x).fold(f32::MAX, f32::min);
    let max_x = line.iter().map(|c| c.x + c.width).fold(f32::MIN, f32::max);

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut prev_right: Option<f32> = None;

    for c in line {
        if let Some(right) = prev_right {
            if c.x - right > cell_gap {
                cells.push(cell.trim().to_string());
                cell.clear();
            }
        }
        // whitespace glyphs widen gaps but never start a cell
        if !c.char.is_whitespace() {
            prev_right = Some(c.x + c.width);
        }
        cell.push(c.char);
    }
    cells.push(cell.trim().to_string());
    cells.retain(|c| !c.is_empty());

    LineCells {
        cells,
        top,
        bottom,
        min_x,
        max_x,
    }
}

fn grid_from_run(run: &[LineCells]) -> TableGrid {
    let left = run.iter().map(|l| l.min_x).fold(f32::MAX, f32::min);
    let right = run.iter().map(|l| l.max_x).fold(f32::MIN, f32::max);
    let top = run.iter().map(|l| l.top).fold(f32::MIN, f32::max);
    let bottom = run.iter().map(|l| l.bottom).fold(f32::MAX, f32::min);

    TableGrid {
        bbox: Some(Rect::new(left, top, right, bottom)),
        rows: run
            .iter()
            .map(|line| line.cells.iter().map(|c| Some(c.clone())).collect())
            .collect(),
    }
}

/// Table with named columns.
///
/// The first row of the detected grid is the header. Data rows always have
/// exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// Page number (1-indexed)
    pub page: u32,
    /// Table index on the page
    pub index: u32,
    pub bbox: Option<Rect>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn from_grid(page: u32, index: u32, grid: TableGrid) -> Self {
        let mut rows = grid.rows.into_iter();
        let header = rows.next().unwrap_or_default();
        let width = rows
            .as_slice()
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let columns = column_names(&header, width);
        let rows = rows
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Self {
            page,
            index,
            bbox: grid.bbox,
            columns,
            rows,
        }
    }

    /// (rows, columns), header excluded
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| {
                        let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Header cells to unique column names: blanks become `Col{i}`, repeats get a
/// `-{n}` suffix.
fn column_names(header: &[Option<String>], width: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(width);
    for i in 0..width {
        let base = match header.get(i).and_then(|c| c.as_deref()).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Col{}", i),
        };

        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{}-{}", base, n);
            n += 1;
        }
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Lay out `text` as 5pt-wide glyphs starting at `x` on the line with top `y`
    fn word(text: &str, x: f32, y: f32) -> Vec<CharBox> {
        text.chars()
            .enumerate()
            .map(|(i, c)| CharBox {
                char: c,
                x: x + i as f32 * 5.0,
                y,
                width: 5.0,
                height: 10.0,
            })
            .collect()
    }

    fn row(cells: &[&str], y: f32) -> Vec<CharBox> {
        cells
            .iter()
            .enumerate()
            .flat_map(|(i, cell)| word(cell, 50.0 + i as f32 * 100.0, y))
            .collect()
    }

    #[test]
    fn test_detects_single_table() {
        let mut chars = row(&["Name", "Qty"], 700.0);
        chars.extend(row(&["Apple", "3"], 688.0));
        chars.extend(row(&["Pear", "12"], 676.0));

        let tables = detect_tables(chars, &TableSettings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec![Some("Name".to_string()), Some("Qty".to_string())],
                vec![Some("Apple".to_string()), Some("3".to_string())],
                vec![Some("Pear".to_string()), Some("12".to_string())],
            ]
        );
        let bbox = tables[0].bbox.unwrap();
        assert_eq!((bbox.left, bbox.top, bbox.bottom), (50.0, 700.0, 666.0));
    }

    #[test]
    fn test_prose_lines_are_not_tables() {
        let mut chars = word("A paragraph of prose", 50.0, 700.0);
        chars.extend(word("continues on the next line", 50.0, 688.0));

        assert!(detect_tables(chars, &TableSettings::default()).is_empty());
    }

    #[test]
    fn test_tables_split_by_column_count_in_order() {
        let mut chars = row(&["a", "b"], 700.0);
        chars.extend(row(&["1", "2"], 688.0));
        chars.extend(word("Interlude", 50.0, 660.0));
        chars.extend(row(&["x", "y", "z"], 640.0));
        chars.extend(row(&["7", "8", "9"], 628.0));

        let tables = detect_tables(chars, &TableSettings::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows[0].len(), 2);
        assert_eq!(tables[1].rows[0].len(), 3);
    }

    #[test]
    fn test_min_rows_setting() {
        let chars = row(&["only", "header"], 700.0);
        let settings = TableSettings {
            min_rows: 1,
            ..Default::default()
        };
        assert_eq!(detect_tables(chars.clone(), &settings).len(), 1);
        assert!(detect_tables(chars, &TableSettings::default()).is_empty());
    }

    #[test]
    fn test_table_from_grid_labels_columns() {
        let grid = TableGrid {
            bbox: None,
            rows: vec![
                vec![Some("id".to_string()), None, Some("id".to_string())],
                vec![Some("1".to_string()), Some("x".to_string())],
            ],
        };

        let table = Table::from_grid(2, 0, grid);
        assert_eq!(table.columns, vec!["id", "Col1", "id-1"]);
        assert_eq!(table.shape(), (1, 3));
        assert_eq!(table.cell(0, "Col1"), Some("x"));
        assert_eq!(table.cell(0, "id-1"), None);
        assert_eq!(table.column("id"), Some(vec![Some("1")]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_table_records() {
        let grid = TableGrid {
            bbox: None,
            rows: vec![
                vec![Some("k".to_string()), Some("v".to_string())],
                vec![Some("a".to_string()), None],
            ],
        };
        let records = Table::from_grid(1, 0, grid).to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["k"], Value::String("a".to_string()));
        assert_eq!(records[0]["v"], Value::Null);
    }

    #[test]
    fn test_empty_grid() {
        let table = Table::from_grid(1, 0, TableGrid::default());
        assert!(table.columns.is_empty());
        assert!(table.is_empty());
    }
}
