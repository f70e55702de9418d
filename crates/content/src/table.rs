//! Parsing and indexing of the reply table.
//!
//! The table has one header row naming the columns `name`, `action` and
//! `message1`..`message5`, in any order. Spreadsheet workbooks are read
//! from their first worksheet; `.csv` files are read as UTF-8.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {
    calamine::{Data, Reader, open_workbook_auto},
    tracing::debug,
};

use crate::{
    entry::{ReplyEntry, SLOT_COUNT, normalize_cell},
    error::{Error, Result},
};

/// Columns every table must carry.
pub const REQUIRED_COLUMNS: [&str; 2 + SLOT_COUNT] = [
    "name", "action", "message1", "message2", "message3", "message4", "message5",
];

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Parsed, immutable reply table.
#[derive(Debug, Clone, Default)]
pub struct ContentTable {
    entries: Vec<ReplyEntry>,
    /// action → name → index of the first row with that pair.
    index: HashMap<String, HashMap<String, usize>>,
    source: Option<PathBuf>,
}

impl ContentTable {
    /// Parse the table at `path`, picking the reader from the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let sheet = if extension == "csv" {
            read_csv(path)?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            read_workbook(path)?
        } else {
            return Err(Error::data_source(
                path,
                format!("unsupported table format \".{extension}\""),
            ));
        };

        let mut table = Self::from_sheet(path, sheet)?;
        table.source = Some(path.to_path_buf());
        Ok(table)
    }

    /// Build a table from in-memory entries, keeping their order.
    pub fn from_entries(entries: impl IntoIterator<Item = ReplyEntry>) -> Self {
        let entries: Vec<ReplyEntry> = entries.into_iter().collect();
        let mut index: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            index
                .entry(entry.action.clone())
                .or_default()
                .entry(entry.name.clone())
                .or_insert(i);
        }
        Self {
            entries,
            index,
            source: None,
        }
    }

    fn from_sheet(path: &Path, sheet: RawSheet) -> Result<Self> {
        let columns = Columns::locate(path, &sheet.headers)?;
        let mut entries = Vec::with_capacity(sheet.rows.len());

        for (i, row) in sheet.rows.into_iter().enumerate() {
            // Header is row 1.
            let row_number = i + 2;
            let cell = |col: usize| normalize_cell(row.get(col).cloned().flatten());
            let (Some(name), Some(action)) = (cell(columns.name), cell(columns.action)) else {
                debug!(row = row_number, "skipping row without name or action");
                continue;
            };
            let mut entry = ReplyEntry::new(name, action);
            entry.row = row_number;
            for (slot, col) in entry.messages.iter_mut().zip(columns.messages) {
                *slot = cell(col);
            }
            entries.push(entry);
        }

        Ok(Self::from_entries(entries))
    }

    /// File the table was parsed from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Every entry in table order.
    pub fn load_all(&self) -> &[ReplyEntry] {
        &self.entries
    }

    /// Entries whose action equals `action`, in table order.
    pub fn find_by_action(&self, action: &str) -> Vec<&ReplyEntry> {
        self.entries.iter().filter(|e| e.action == action).collect()
    }

    /// The first entry matching both keys.
    pub fn find_one(&self, name: &str, action: &str) -> Option<&ReplyEntry> {
        let i = *self.index.get(action)?.get(name)?;
        self.entries.get(i)
    }

    /// Names of the entries tagged `action`, in table order.
    pub fn names(&self, action: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, action, row)` of every row shadowed by an earlier row with
    /// the same keys.
    pub fn duplicates(&self) -> Vec<(&str, &str, usize)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                self.index
                    .get(&e.action)
                    .and_then(|names| names.get(&e.name))
                    .is_some_and(|first| first != i)
            })
            .map(|(_, e)| (e.name.as_str(), e.action.as_str(), e.row))
            .collect()
    }
}

// ── Raw readers ─────────────────────────────────────────────────────────────

/// Header plus data rows as optional strings.
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

struct Columns {
    name: usize,
    action: usize,
    messages: [usize; SLOT_COUNT],
}

impl Columns {
    fn locate(path: &Path, headers: &[String]) -> Result<Self> {
        let position = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| position(col).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::data_source(
                path,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        let [name, action, m1, m2, m3, m4, m5] =
            REQUIRED_COLUMNS.map(|col| position(col).unwrap_or_default());
        Ok(Self {
            name,
            action,
            messages: [m1, m2, m3, m4, m5],
        })
    }
}

fn read_workbook(path: &Path) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::data_source(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::data_source(path, "workbook has no worksheets"))?
        .map_err(|e| Error::data_source(path, e))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| Error::data_source(path, "worksheet is empty"))?
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawSheet { headers, rows })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn read_csv(path: &Path) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::data_source(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::data_source(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::data_source(path, e))?;
        rows.push(record.iter().map(|s| Some(s.to_string())).collect());
    }

    Ok(RawSheet { headers, rows })
}
