// Document model: table body elements, rows keyed by identity, cells keyed by column

use std::collections::HashMap;
use std::time::Instant;

/// The fixed column schema every row carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Cpu,
    Mem,
    MemPerc,
    Net,
    Block,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Name,
        Column::Cpu,
        Column::Mem,
        Column::MemPerc,
        Column::Net,
        Column::Block,
    ];

    /// Cell class used for (row, column) lookups.
    pub fn class(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Cpu => "cpu",
            Column::Mem => "mem",
            Column::MemPerc => "memperc",
            Column::Net => "net",
            Column::Block => "block",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        Column::ALL.into_iter().find(|c| c.class() == class)
    }

    /// Header text, as `docker stats` labels the same columns.
    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "NAME",
            Column::Cpu => "CPU %",
            Column::Mem => "MEM USAGE / LIMIT",
            Column::MemPerc => "MEM %",
            Column::Net => "NET I/O",
            Column::Block => "BLOCK I/O",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub column: Column,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Row {
    id: String,
    cells: Vec<Cell>,
    last_seen: Instant,
    stale: bool,
}

impl Row {
    /// A row with one empty cell per column, in schema order.
    pub fn new(id: impl Into<String>, now: Instant) -> Self {
        let cells = Column::ALL
            .into_iter()
            .map(|column| Cell {
                column,
                text: String::new(),
            })
            .collect();
        Self {
            id: id.into(),
            cells,
            last_seen: now,
            stale: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, column: Column) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.text.as_str())
    }

    pub fn cell_mut(&mut self, column: Column) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.column == column)
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_seen = now;
        self.stale = false;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }
}

/// A table body element: rows in append order plus an identity index.
#[derive(Debug, Clone)]
pub struct TableBody {
    id: String,
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl TableBody {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    pub fn row_mut(&mut self, id: &str) -> Option<&mut Row> {
        let i = *self.index.get(id)?;
        self.rows.get_mut(i)
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    /// Append a row at the end. Returns `false` (and keeps the existing row) if a row
    /// with the same id is already present.
    pub fn append_row(&mut self, row: Row) -> bool {
        if self.index.contains_key(row.id()) {
            return false;
        }
        self.index.insert(row.id.clone(), self.rows.len());
        self.rows.push(row);
        true
    }

    /// Cell text by (row id, column).
    pub fn cell(&self, row_id: &str, column: Column) -> Option<&str> {
        self.row(row_id)?.cell(column)
    }

    /// Cell text by (row id, cell class), e.g. `("web", "memperc")`.
    pub fn query(&self, row_id: &str, class: &str) -> Option<&str> {
        self.cell(row_id, Column::from_class(class)?)
    }

    /// Overwrite one cell. Returns `false` if the row does not exist.
    pub fn set_cell(&mut self, row_id: &str, column: Column, text: String) -> bool {
        match self.row_mut(row_id).and_then(|r| r.cell_mut(column)) {
            Some(cell) => {
                cell.text = text;
                true
            }
            None => false,
        }
    }
}

/// Elements addressable by id; stands in for the page the table lives on.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: HashMap<String, TableBody>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document already holding an empty table body with the given id.
    pub fn with_table_body(id: &str) -> Self {
        let mut doc = Self::new();
        doc.insert_table_body(TableBody::new(id));
        doc
    }

    pub fn insert_table_body(&mut self, body: TableBody) {
        self.elements.insert(body.id().to_string(), body);
    }

    pub fn table_body(&self, id: &str) -> Option<&TableBody> {
        self.elements.get(id)
    }

    pub fn table_body_mut(&mut self, id: &str) -> Option<&mut TableBody> {
        self.elements.get_mut(id)
    }
}
