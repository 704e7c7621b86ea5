use crate::types::{DataRow, ObjectId};

/// Lifecycle state of a persistent object in a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PersistenceState {
    #[default]
    Transient,
    New,
    Committed,
    Modified,
    /// Fault not yet resolved; may carry no snapshot.
    Hollow,
    Deleted,
}

/// An object taking part in a commit, as seen by the sorter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistentObject {
    pub id: ObjectId,
    pub state: PersistenceState,
    /// Current column values, keyed by column name.
    pub snapshot: DataRow,
    /// Values as last read from or written to the database.
    pub committed_snapshot: Option<DataRow>,
}

impl PersistentObject {
    pub fn new(id: ObjectId, state: PersistenceState) -> Self {
        Self {
            id,
            state,
            snapshot: DataRow::new(),
            committed_snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: DataRow) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn with_committed_snapshot(mut self, snapshot: DataRow) -> Self {
        self.committed_snapshot = Some(snapshot);
        self
    }

    /// Snapshot the object's foreign keys are read from: the committed one
    /// for deleted objects, none for hollow objects without data.
    pub fn effective_snapshot(&self) -> Option<&DataRow> {
        match self.state {
            PersistenceState::Deleted => self
                .committed_snapshot
                .as_ref()
                .or(Some(&self.snapshot).filter(|s| !s.is_empty())),
            PersistenceState::Hollow if self.snapshot.is_empty() => None,
            _ => Some(&self.snapshot),
        }
    }
}
