//! Entity, history, and relation schema building.
//!
//! Schema building is a one-time, explicit step executed at
//! registration, before any instance exists. It produces a fixed
//! [`TrackedSchema`]: the base entity schema augmented with the
//! version (and optional fingerprint) field, the history entity schema
//! copied from the tracked field set, and the relation pair between
//! them. The step is neither repeatable nor reversible within a
//! running process.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrackConfig;

/// Pattern for entity, field, and relation names.
const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Errors raised while building schemas at registration time.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// An entity, field, or relation name does not match
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid {kind} name: {name:?}")]
    InvalidName {
        /// What the name was for ("entity", "field", ...).
        kind: &'static str,
        /// The offending name.
        name: String,
    },
    /// A configured tracked field is not defined on the entity schema.
    #[error("tracked field {0:?} is not defined on the entity schema")]
    UnknownField(String),
    /// A field to be added collides with an existing field.
    #[error("field {0:?} is already defined on the schema")]
    FieldCollision(String),
}

/// Primitive type tag of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean.
    Boolean,
    /// Date/time value.
    Date,
    /// Arbitrary JSON value.
    Json,
}

/// A persisted field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Primitive type tag.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Optional fixed width for string fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl FieldDef {
    /// Creates a field definition without a width.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            length: None,
        }
    }

    /// Creates a fixed-width field definition.
    pub fn with_length(name: impl Into<String>, ty: FieldType, length: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            length: Some(length),
        }
    }
}

/// An entity type's schema: name, identifier field, and ordered fields.
///
/// The identifier field is implicit and need not appear in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity type name.
    pub name: String,
    /// Identifier field name.
    pub id_field: String,
    /// Ordered non-identifier field definitions.
    pub fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Creates a validated entity schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidName`] for malformed entity or
    /// field names and [`SchemaError::FieldCollision`] for duplicate
    /// field names.
    pub fn new(
        name: impl Into<String>,
        id_field: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let id_field = id_field.into();
        validate_name("entity", &name)?;
        validate_name("field", &id_field)?;
        let mut schema = Self {
            name,
            id_field,
            fields: Vec::with_capacity(fields.len()),
        };
        for field in fields {
            schema.add_field(field)?;
        }
        Ok(schema)
    }

    /// Looks up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns whether a field is defined on this schema.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterates over the non-identifier field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Adds a field, rejecting malformed names and collisions with
    /// existing fields or the identifier.
    pub fn add_field(&mut self, field: FieldDef) -> Result<(), SchemaError> {
        validate_name("field", &field.name)?;
        if field.name == self.id_field || self.has_field(&field.name) {
            return Err(SchemaError::FieldCollision(field.name));
        }
        self.fields.push(field);
        Ok(())
    }
}

/// Relation direction between entity and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// One-to-many: entity to history rows.
    HasMany,
    /// Many-to-one: history row to its entity.
    BelongsTo,
}

/// A declared relation over the history foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name on the source entity.
    pub name: String,
    /// Relation direction.
    pub kind: RelationKind,
    /// Source entity type name.
    pub source: String,
    /// Target entity type name.
    pub target: String,
    /// Foreign key field on the history entity.
    pub foreign_key: String,
}

/// Fixed schema set produced by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSchema {
    /// Base entity schema augmented with version and fingerprint fields.
    pub entity: EntitySchema,
    /// History entity schema.
    pub history: EntitySchema,
    /// Entity-to-history relation (one-to-many).
    pub history_relation: RelationDef,
    /// History-to-entity back reference (many-to-one).
    pub parent_relation: RelationDef,
}

impl TrackedSchema {
    /// Builds the tracked schema set from a base entity schema and a
    /// resolved configuration.
    ///
    /// The entity schema gains the version field and, when enabled, the
    /// fingerprint field. The history schema copies the tracked field
    /// definitions and adds the foreign key, the version field, and
    /// whichever of fingerprint/action/timestamp fields are enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownField`] when a configured tracked
    /// field is absent from the base schema and
    /// [`SchemaError::FieldCollision`] when a core-owned field name
    /// collides with an existing field.
    pub fn build(base: &EntitySchema, cfg: &TrackConfig) -> Result<Self, SchemaError> {
        for name in &cfg.tracked_fields {
            if !base.has_field(name) {
                return Err(SchemaError::UnknownField(name.clone()));
            }
        }

        let mut entity = base.clone();
        entity.add_field(FieldDef::with_length(
            cfg.version_field.clone(),
            FieldType::String,
            cfg.version_width,
        ))?;
        if let Some(name) = &cfg.fingerprint_field {
            entity.add_field(FieldDef::with_length(
                name.clone(),
                FieldType::String,
                cfg.fingerprint_width,
            ))?;
        }

        let mut history_fields: Vec<FieldDef> = cfg
            .tracked_fields
            .iter()
            .filter_map(|name| base.field(name).cloned())
            .collect();
        history_fields.push(FieldDef::new(cfg.foreign_key.clone(), foreign_key_type(base)));
        history_fields.push(FieldDef::with_length(
            cfg.version_field.clone(),
            FieldType::String,
            cfg.version_width,
        ));
        if let Some(name) = &cfg.fingerprint_field {
            history_fields.push(FieldDef::with_length(
                name.clone(),
                FieldType::String,
                cfg.fingerprint_width,
            ));
        }
        if let Some(name) = &cfg.action_field {
            history_fields.push(FieldDef::new(name.clone(), FieldType::String));
        }
        if let Some(name) = &cfg.timestamp_field {
            history_fields.push(FieldDef::new(name.clone(), FieldType::Date));
        }
        let history_id = history_id_field(&history_fields);
        let history = EntitySchema::new(cfg.history_entity.clone(), history_id, history_fields)?;

        let history_relation = RelationDef {
            name: cfg.relation_name.clone(),
            kind: RelationKind::HasMany,
            source: entity.name.clone(),
            target: history.name.clone(),
            foreign_key: cfg.foreign_key.clone(),
        };
        let parent_relation = RelationDef {
            name: cfg.back_reference.clone(),
            kind: RelationKind::BelongsTo,
            source: history.name.clone(),
            target: entity.name.clone(),
            foreign_key: cfg.foreign_key.clone(),
        };

        Ok(TrackedSchema {
            entity,
            history,
            history_relation,
            parent_relation,
        })
    }
}

/// History identifier name: `id`, prefixed with underscores until it
/// clears every copied field (a tracked field may itself be named `id`
/// when the entity uses a different identifier).
fn history_id_field(fields: &[FieldDef]) -> String {
    let mut name = String::from("id");
    while fields.iter().any(|f| f.name == name) {
        name.insert(0, '_');
    }
    name
}

/// Foreign key type: mirrors the base identifier's declared type when
/// present, defaulting to integer identifiers.
fn foreign_key_type(base: &EntitySchema) -> FieldType {
    base.field(&base.id_field).map(|f| f.ty).unwrap_or(FieldType::Integer)
}

fn validate_name(kind: &'static str, name: &str) -> Result<(), SchemaError> {
    let re = Regex::new(NAME_PATTERN).expect("invalid regex");
    if !re.is_match(name) {
        return Err(SchemaError::InvalidName {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}
