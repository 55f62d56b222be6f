//! Buffered rows, result sets and the cursor over them.

use crate::value::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    /// Logical type labels, e.g. `"number(11)"`
    types: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create column info from names and matching type labels.
    pub fn new(names: Vec<String>, types: Vec<String>) -> Self {
        debug_assert_eq!(names.len(), types.len());
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            types,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }
}

/// A single buffered row.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// One result of a (possibly multi-statement) query, fully buffered.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Arc<ColumnInfo>,
    pub rows: Vec<Row>,
    pub affected_rows: u64,
}

impl ResultSet {
    /// Result of a statement that produced no columns (INSERT, UPDATE, ...).
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            columns: Arc::new(ColumnInfo::default()),
            rows: Vec::new(),
            affected_rows,
        }
    }

    /// Statements that return rows always describe at least one column.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// Failure reported by a later statement of a multi-statement query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredError {
    pub code: i64,
    pub message: String,
}

/// Outcome of advancing a [`RowCursor`] to the next result set.
#[derive(Debug, Clone, PartialEq)]
pub enum NextSet {
    /// The new current set has rows to fetch
    Rows,
    /// The next statement produced no result set
    NoRows { affected_rows: u64 },
    /// The next statement failed
    Failed(DeferredError),
    /// No further results
    Exhausted,
}

/// Cursor over buffered result sets.
///
/// The first set is current on creation. `next_set` drops it and moves on;
/// a deferred error is reported once every buffered set has been consumed.
#[derive(Debug, Clone)]
pub struct RowCursor {
    current: ResultSet,
    position: usize,
    remaining: VecDeque<ResultSet>,
    deferred: Option<DeferredError>,
}

impl RowCursor {
    pub fn new(first: ResultSet) -> Self {
        Self {
            current: first,
            position: 0,
            remaining: VecDeque::new(),
            deferred: None,
        }
    }

    /// Build a cursor from sets in server order. `sets` must not be empty.
    pub fn from_sets(sets: Vec<ResultSet>, deferred: Option<DeferredError>) -> Option<Self> {
        let mut remaining: VecDeque<ResultSet> = sets.into();
        let current = remaining.pop_front()?;
        Some(Self {
            current,
            position: 0,
            remaining,
            deferred,
        })
    }

    pub fn columns(&self) -> &Arc<ColumnInfo> {
        &self.current.columns
    }

    /// Rows in the current set.
    pub fn row_count(&self) -> usize {
        self.current.rows.len()
    }

    /// Return the row at the current position and advance past it.
    pub fn next_row(&mut self) -> Option<&Row> {
        let row = self.current.rows.get(self.position)?;
        self.position += 1;
        Some(row)
    }

    /// Move to a 0-based row offset. Offsets past the end exhaust the set.
    pub fn seek(&mut self, offset: usize) {
        self.position = offset.min(self.current.rows.len());
    }

    pub fn has_next_set(&self) -> bool {
        !self.remaining.is_empty() || self.deferred.is_some()
    }

    pub fn next_set(&mut self) -> NextSet {
        if let Some(set) = self.remaining.pop_front() {
            self.current = set;
            self.position = 0;
            if self.current.has_columns() {
                NextSet::Rows
            } else {
                NextSet::NoRows {
                    affected_rows: self.current.affected_rows,
                }
            }
        } else if let Some(err) = self.deferred.take() {
            self.current = ResultSet::default();
            self.position = 0;
            NextSet::Failed(err)
        } else {
            NextSet::Exhausted
        }
    }
}
