//! The lifecycle coordinator.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use revtrail_core::{
    fingerprint, next_version, EntitySchema, Record, TrackConfig, TrackedSchema,
};

use crate::context::{DeleteContext, WriteContext};
use crate::errors::TrackError;
use crate::host::EntityHost;
use crate::notify::VersionRecorded;
use crate::op::{Action, DeleteOp, WriteOp};

/// Change tracker for one registered entity type.
///
/// Owns the resolved configuration and the fixed schema set.
/// Registration happens exactly once per entity type and is neither
/// repeatable nor reversible within a running process.
///
/// Each operation runs a short sequential pipeline:
/// `idle -> resolving -> evaluating -> (dirty | clean) -> committed`.
/// The tracker holds no internal locks and performs no cross-operation
/// synchronization; two operations racing on the same record identity
/// can both compute the next version from the same stale prior and
/// write history rows carrying identical version strings. Atomicity of
/// version allocation is delegated to the persistence layer.
#[derive(Debug)]
pub struct Tracker {
    cfg: TrackConfig,
    schema: TrackedSchema,
}

impl Tracker {
    /// Registers change tracking for an entity type.
    ///
    /// Resolves the boot options against the base schema and builds the
    /// augmented entity schema, the history schema, and the relation
    /// pair.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Config`] or [`TrackError::Schema`] when
    /// the options or the resulting schemas are invalid; registration
    /// aborts and nothing is recorded.
    pub fn register(base: &EntitySchema, options: &Value) -> Result<Self, TrackError> {
        let cfg = TrackConfig::resolve(options, base)?;
        let schema = TrackedSchema::build(base, &cfg)?;
        Ok(Self { cfg, schema })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &TrackConfig {
        &self.cfg
    }

    /// The fixed schema set produced at registration.
    pub fn schema(&self) -> &TrackedSchema {
        &self.schema
    }

    /// Pre-write: resolve, evaluate dirtiness, assign the next version.
    ///
    /// Resolution order: explicit instance, host-supplied current state,
    /// then (only when `resolve_by_condition` is configured) a lookup by
    /// the operation's match condition. An update that resolves nothing
    /// is a no-op for this mechanism and yields a clean context.
    ///
    /// Tracked values are the prior state merged with the incoming data,
    /// incoming values winning. When fingerprinting is enabled and the
    /// new fingerprint equals the resolved instance's stored one, the
    /// context is clean and the version field is not touched. Otherwise
    /// the new fingerprint (if enabled) and the next version are written
    /// into `op.data` for the host to persist.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Persistence`] when the resolution lookup
    /// fails, and version/fingerprint computation errors.
    pub fn before_write<H: EntityHost>(
        &self,
        host: &H,
        op: &mut WriteOp,
    ) -> Result<WriteContext, TrackError> {
        // resolving
        let resolved: Option<Record> = if let Some(instance) = &op.instance {
            Some(instance.clone())
        } else if let Some(current) = &op.current {
            Some(current.clone())
        } else if self.cfg.resolve_by_condition {
            match &op.condition {
                Some(condition) => {
                    host.find_one(condition)
                        .map_err(|source| TrackError::Persistence {
                            op: "find_one",
                            source,
                        })?
                }
                None => None,
            }
        } else {
            None
        };

        if resolved.is_none() && !op.is_new {
            return Ok(WriteContext::clean(op.is_new));
        }

        // evaluating
        let values = self.tracked_values(resolved.as_ref(), &op.data);
        let mut dirty = true;
        if let Some(fp_field) = &self.cfg.fingerprint_field {
            let fp = fingerprint(&values, self.cfg.fingerprint_width)?;
            let stored = resolved
                .as_ref()
                .and_then(|r| r.get(fp_field))
                .and_then(Value::as_str);
            dirty = stored != Some(fp.as_str());
            if dirty {
                op.data.insert(fp_field.clone(), Value::String(fp));
            }
        }

        if !dirty {
            return Ok(WriteContext::clean(op.is_new));
        }

        let prior = resolved
            .as_ref()
            .and_then(|r| r.get(&self.cfg.version_field))
            .and_then(Value::as_str);
        let version = next_version(prior, op.is_new, self.cfg.version_width)?;
        op.data
            .insert(self.cfg.version_field.clone(), Value::String(version));
        Ok(WriteContext::dirty(op.is_new))
    }

    /// Post-write: append the history row for a committed dirty write.
    ///
    /// Runs only when the context is dirty and the host committed to
    /// exactly one instance; bulk/conditional writes pass `None` for
    /// `committed` and are deliberately excluded from history. The host
    /// must not call this when the underlying write failed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Persistence`] when the history append
    /// fails; the primary record has already advanced at that point and
    /// the pair is non-transactional by contract.
    pub fn after_write<H: EntityHost>(
        &self,
        host: &mut H,
        ctx: WriteContext,
        committed: Option<&Record>,
    ) -> Result<Option<VersionRecorded>, TrackError> {
        let committed = match (ctx.dirty, committed) {
            (true, Some(record)) => record,
            _ => return Ok(None),
        };

        let action = if ctx.is_new {
            Action::Create
        } else {
            Action::Update
        };
        let mut row = self.history_payload(committed, action);
        row.insert(
            self.cfg.version_field.clone(),
            committed
                .get(&self.cfg.version_field)
                .cloned()
                .unwrap_or(Value::Null),
        );
        if let Some(fp_field) = &self.cfg.fingerprint_field {
            row.insert(
                fp_field.clone(),
                committed.get(fp_field).cloned().unwrap_or(Value::Null),
            );
        }
        row.insert(
            self.cfg.foreign_key.clone(),
            committed
                .get(&self.schema.entity.id_field)
                .cloned()
                .unwrap_or(Value::Null),
        );

        let stored = host
            .append_history(row)
            .map_err(|source| TrackError::Persistence {
                op: "append_history",
                source,
            })?;
        Ok(Some(VersionRecorded {
            history_row: stored,
            instance: committed.clone(),
        }))
    }

    /// Pre-delete: resolve the instance and stash the history payload.
    ///
    /// Resolution: the explicit instance, else a lookup by the
    /// identifier extracted from the delete condition. Unresolvable
    /// deletes (bulk conditions without an identifier) yield an inert
    /// context and are a hard boundary of this mechanism's coverage.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Persistence`] when the identifier lookup
    /// fails, and fingerprint computation errors.
    pub fn before_delete<H: EntityHost>(
        &self,
        host: &H,
        op: &DeleteOp,
    ) -> Result<DeleteContext, TrackError> {
        let resolved: Option<Record> = if let Some(instance) = &op.instance {
            Some(instance.clone())
        } else if let Some(condition) = &op.condition {
            match condition.get(&self.schema.entity.id_field) {
                Some(id) => host
                    .find_by_id(id)
                    .map_err(|source| TrackError::Persistence {
                        op: "find_by_id",
                        source,
                    })?,
                None => None,
            }
        } else {
            None
        };
        let Some(instance) = resolved else {
            return Ok(DeleteContext::inert());
        };

        let values = self.tracked_values(Some(&instance), &Record::new());
        let mut payload = self.history_payload(&instance, Action::Delete);
        if let Some(fp_field) = &self.cfg.fingerprint_field {
            let fp = fingerprint(&values, self.cfg.fingerprint_width)?;
            payload.insert(fp_field.clone(), Value::String(fp));
        }
        payload.insert(
            self.cfg.foreign_key.clone(),
            instance
                .get(&self.schema.entity.id_field)
                .cloned()
                .unwrap_or(Value::Null),
        );

        let prior_version = instance
            .get(&self.cfg.version_field)
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(DeleteContext {
            payload: Some(payload),
            instance: Some(instance),
            prior_version,
        })
    }

    /// Post-delete: append the terminal history row.
    ///
    /// Runs only when the pre step stashed a payload. The terminal
    /// version is computed from the stashed prior version. The host must
    /// not call this when the underlying delete failed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Persistence`] when the history append
    /// fails.
    pub fn after_delete<H: EntityHost>(
        &self,
        host: &mut H,
        ctx: DeleteContext,
    ) -> Result<Option<VersionRecorded>, TrackError> {
        let (Some(mut payload), Some(instance)) = (ctx.payload, ctx.instance) else {
            return Ok(None);
        };

        let terminal = next_version(
            ctx.prior_version.as_deref(),
            false,
            self.cfg.version_width,
        )?;
        payload.insert(self.cfg.version_field.clone(), Value::String(terminal));

        let stored = host
            .append_history(payload)
            .map_err(|source| TrackError::Persistence {
                op: "append_history",
                source,
            })?;
        Ok(Some(VersionRecorded {
            history_row: stored,
            instance,
        }))
    }

    /// Tracked field values: prior state merged with incoming data,
    /// incoming values winning, missing fields null.
    fn tracked_values(&self, prior: Option<&Record>, data: &Record) -> Record {
        let mut values = Record::new();
        for name in &self.cfg.tracked_fields {
            let value = match data.get(name) {
                Some(v) => v.clone(),
                None => prior
                    .and_then(|r| r.get(name))
                    .cloned()
                    .unwrap_or(Value::Null),
            };
            values.insert(name.clone(), value);
        }
        values
    }

    /// Common history-row fields: tracked values copied from the source
    /// record, the action label, and the timestamp when enabled.
    fn history_payload(&self, source: &Record, action: Action) -> Record {
        let mut row = Record::new();
        for name in &self.cfg.tracked_fields {
            row.insert(
                name.clone(),
                source.get(name).cloned().unwrap_or(Value::Null),
            );
        }
        if let Some(action_field) = &self.cfg.action_field {
            row.insert(
                action_field.clone(),
                Value::String(action.as_str().to_owned()),
            );
        }
        if let Some(ts_field) = &self.cfg.timestamp_field {
            row.insert(
                ts_field.clone(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        row
    }
}
