//! The in-memory store.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use revtrail_core::Record;
use revtrail_track::{
    DeleteOp, EntityHost, HostError, Tracker, VersionRecorded, WriteOp,
};

use crate::error::MemStoreError;
use crate::filter;

/// Record and history tables for one entity type.
///
/// Split out from [`MemStore`] so the tracker can borrow the tables as
/// its host while the store drives the pipeline.
struct Tables {
    id_field: String,
    foreign_key: String,
    records: BTreeMap<u64, Record>,
    history: Vec<Record>,
}

impl EntityHost for Tables {
    fn find_one(&self, condition: &Value) -> Result<Option<Record>, HostError> {
        Ok(self
            .records
            .values()
            .find(|record| filter::matches(record, condition))
            .cloned())
    }

    fn find_by_id(&self, id: &Value) -> Result<Option<Record>, HostError> {
        Ok(id.as_u64().and_then(|id| self.records.get(&id)).cloned())
    }

    fn append_history(&mut self, row: Record) -> Result<Record, HostError> {
        self.history.push(row.clone());
        Ok(row)
    }
}

/// In-memory store for one tracked entity type.
///
/// Owns the tracker registration, an auto-increment identifier counter,
/// the record table, and the append-only history table. Each operation
/// runs the full pre-event / commit / post-event pipeline.
pub struct MemStore {
    tracker: Tracker,
    tables: Tables,
    next_id: u64,
}

impl MemStore {
    /// Creates an empty store for a registered tracker.
    pub fn new(tracker: Tracker) -> Self {
        let tables = Tables {
            id_field: tracker.schema().entity.id_field.clone(),
            foreign_key: tracker.config().foreign_key.clone(),
            records: BTreeMap::new(),
            history: Vec::new(),
        };
        Self {
            tracker,
            tables,
            next_id: 1,
        }
    }

    /// The registered tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Creates a record, returning it and the recorded notification.
    pub fn create(
        &mut self,
        data: Record,
    ) -> Result<(Record, Option<VersionRecorded>), MemStoreError> {
        let mut op = WriteOp::create(data);
        let ctx = self.tracker.before_write(&self.tables, &mut op)?;

        let id = self.next_id;
        self.next_id += 1;
        let mut record = op.data;
        record.insert(self.tables.id_field.clone(), json!(id));
        self.tables.records.insert(id, record.clone());

        let note = self.tracker.after_write(&mut self.tables, ctx, Some(&record))?;
        Ok((record, note))
    }

    /// Applies a partial update to one record.
    pub fn update(
        &mut self,
        id: u64,
        data: Record,
    ) -> Result<(Record, Option<VersionRecorded>), MemStoreError> {
        let current = self
            .tables
            .records
            .get(&id)
            .cloned()
            .ok_or(MemStoreError::NotFound { id })?;

        let mut op = WriteOp::update(current.clone(), data);
        let ctx = self.tracker.before_write(&self.tables, &mut op)?;

        let mut record = current;
        for (name, value) in op.data {
            record.insert(name, value);
        }
        self.tables.records.insert(id, record.clone());

        let note = self.tracker.after_write(&mut self.tables, ctx, Some(&record))?;
        Ok((record, note))
    }

    /// Applies a conditional update to every matching record.
    ///
    /// The operation is not bound to one resolved instance: no history
    /// row is created, and unless the tracker is configured to resolve
    /// by condition, no version field is touched. Returns the number of
    /// matched records.
    pub fn update_where(
        &mut self,
        condition: Value,
        data: Record,
    ) -> Result<usize, MemStoreError> {
        let mut op = WriteOp::update_where(condition.clone(), data);
        let ctx = self.tracker.before_write(&self.tables, &mut op)?;

        let mut matched = 0;
        for record in self
            .tables
            .records
            .values_mut()
            .filter(|record| filter::matches(record, &condition))
        {
            for (name, value) in &op.data {
                record.insert(name.clone(), value.clone());
            }
            matched += 1;
        }

        self.tracker.after_write(&mut self.tables, ctx, None)?;
        Ok(matched)
    }

    /// Deletes one record, recording a terminal history row.
    pub fn delete(&mut self, id: u64) -> Result<Option<VersionRecorded>, MemStoreError> {
        let instance = self
            .tables
            .records
            .get(&id)
            .cloned()
            .ok_or(MemStoreError::NotFound { id })?;

        let op = DeleteOp::of_instance(instance);
        let ctx = self.tracker.before_delete(&self.tables, &op)?;

        self.tables.records.remove(&id);

        Ok(self.tracker.after_delete(&mut self.tables, ctx)?)
    }

    /// Deletes every record matching a condition.
    ///
    /// A condition carrying the identifier field resolves that single
    /// record and records its terminal history row; any other condition
    /// deletes silently, which is a hard boundary of the mechanism's
    /// coverage. Returns the number of deleted records and the
    /// notification, if any.
    pub fn delete_where(
        &mut self,
        condition: Value,
    ) -> Result<(usize, Option<VersionRecorded>), MemStoreError> {
        let op = DeleteOp::by_condition(condition.clone());
        let ctx = self.tracker.before_delete(&self.tables, &op)?;

        let ids: Vec<u64> = self
            .tables
            .records
            .iter()
            .filter(|(_, record)| filter::matches(record, &condition))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.tables.records.remove(id);
        }

        let note = self.tracker.after_delete(&mut self.tables, ctx)?;
        Ok((ids.len(), note))
    }

    /// Looks up a record by identifier.
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.tables.records.get(&id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.tables.records.len()
    }

    /// Whether the record table is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.records.is_empty()
    }

    /// All history rows in append order.
    pub fn history(&self) -> &[Record] {
        &self.tables.history
    }

    /// History rows for one record, via the relation's foreign key.
    pub fn history_of(&self, id: u64) -> Vec<&Record> {
        let id = json!(id);
        self.tables
            .history
            .iter()
            .filter(|row| row.get(&self.tables.foreign_key) == Some(&id))
            .collect()
    }
}
