/// A single cell value. Formula cells hold the expression verbatim; the
/// workbook writer hands them to the spreadsheet's own evaluation engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Formula(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Int(v) => v.to_string().len(),
            Cell::Formula(f) => f.chars().count(),
        }
    }
}

/// An in-memory worksheet: a fixed header row plus appended data rows.
/// Columns are addressed by header text so upstream reordering cannot break
/// consumers that read the finished table.
#[derive(Clone, Debug)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Sheet {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn append(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Data cells of the column whose header matches exactly, top to bottom.
    pub fn column(&self, header: &str) -> Option<Vec<&Cell>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }

    /// Display width per column: longest rendered value, padded by 3 when the
    /// longest value is short so narrow columns stay readable.
    pub fn column_widths(&self) -> Vec<f64> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let mut max_len = h.chars().count();
                for row in &self.rows {
                    if let Some(c) = row.get(i) && c.display_len() > max_len {
                        max_len = c.display_len();
                    }
                }
                if max_len < 10 { (max_len + 3) as f64 } else { max_len as f64 }
            })
            .collect()
    }
}
