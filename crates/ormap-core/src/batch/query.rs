use crate::types::DataRow;

/// Rows to insert into one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertBatchQuery {
    pub entity: String,
    pub rows: Vec<DataRow>,
}

impl InsertBatchQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: DataRow) -> Self {
        self.rows.push(row);
        self
    }
}

/// New values and the identifying snapshot of one updated row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateRow {
    pub values: DataRow,
    pub qualifier: DataRow,
}

/// Rows of one table updated on the same set of columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateBatchQuery {
    pub entity: String,
    pub updated_columns: Vec<String>,
    /// Columns of the WHERE clause; primary keys when empty. Optimistic
    /// lock columns go here too.
    pub qualifier_columns: Vec<String>,
    pub rows: Vec<UpdateRow>,
}

impl UpdateBatchQuery {
    pub fn new(entity: impl Into<String>, updated_columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entity: entity.into(),
            updated_columns: updated_columns.into_iter().map(Into::into).collect(),
            qualifier_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_qualifier_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.qualifier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row(mut self, values: DataRow, qualifier: DataRow) -> Self {
        self.rows.push(UpdateRow { values, qualifier });
        self
    }
}

/// Rows of one table to delete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteBatchQuery {
    pub entity: String,
    /// Columns of the WHERE clause; primary keys when empty.
    pub qualifier_columns: Vec<String>,
    pub rows: Vec<DataRow>,
}

impl DeleteBatchQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            qualifier_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_qualifier_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.qualifier_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row(mut self, row: DataRow) -> Self {
        self.rows.push(row);
        self
    }
}

/// Any batch query.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchQuery {
    Insert(InsertBatchQuery),
    Update(UpdateBatchQuery),
    Delete(DeleteBatchQuery),
}

impl BatchQuery {
    /// Table the batch writes to.
    pub fn entity(&self) -> &str {
        match self {
            BatchQuery::Insert(q) => &q.entity,
            BatchQuery::Update(q) => &q.entity,
            BatchQuery::Delete(q) => &q.entity,
        }
    }

    /// Number of rows in the batch.
    pub fn row_count(&self) -> usize {
        match self {
            BatchQuery::Insert(q) => q.rows.len(),
            BatchQuery::Update(q) => q.rows.len(),
            BatchQuery::Delete(q) => q.rows.len(),
        }
    }
}

impl From<InsertBatchQuery> for BatchQuery {
    fn from(q: InsertBatchQuery) -> Self {
        BatchQuery::Insert(q)
    }
}

impl From<UpdateBatchQuery> for BatchQuery {
    fn from(q: UpdateBatchQuery) -> Self {
        BatchQuery::Update(q)
    }
}

impl From<DeleteBatchQuery> for BatchQuery {
    fn from(q: DeleteBatchQuery) -> Self {
        BatchQuery::Delete(q)
    }
}
