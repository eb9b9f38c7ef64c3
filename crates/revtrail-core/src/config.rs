//! Configuration resolution from partial boot options.
//!
//! Options arrive as a JSON object (any subset of recognized keys) and
//! are validated against the base entity schema into an immutable
//! [`TrackConfig`]. Each invalid option maps to one distinct
//! [`ConfigError`] variant; resolution has no side effects beyond the
//! error.

use serde_json::Value;
use thiserror::Error;

use crate::schema::EntitySchema;

/// Default version field name on the entity and history schemas.
pub const DEFAULT_VERSION_FIELD: &str = "_version";
/// Default fingerprint field name.
pub const DEFAULT_FINGERPRINT_FIELD: &str = "_hash";
/// Default action label field name on the history schema.
pub const DEFAULT_ACTION_FIELD: &str = "_action";
/// Default timestamp field name on the history schema.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "_update";
/// Default foreign key field name on the history schema.
pub const DEFAULT_FOREIGN_KEY: &str = "_recordId";
/// Default entity-to-history relation name.
pub const DEFAULT_RELATION_NAME: &str = "history";
/// Default history-to-entity back reference name.
pub const DEFAULT_BACK_REFERENCE: &str = "_record";
/// Default version field width in digits.
pub const DEFAULT_VERSION_WIDTH: usize = 5;
/// Default fingerprint field width in characters.
pub const DEFAULT_FINGERPRINT_WIDTH: usize = 10;

/// Errors raised while resolving boot options, one kind per option.
///
/// Raised synchronously at registration time and never recovered;
/// registration aborts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Options were not a JSON object.
    #[error("options must be a JSON object")]
    OptionsNotAnObject,
    /// `tracked_fields` was neither the wildcard nor a list of strings.
    #[error("tracked_fields must be \"*\" or an array of field names")]
    TrackedFieldsNotAList,
    /// The tracked field set was empty after wildcard expansion and
    /// identifier exclusion.
    #[error("tracked_fields must name at least one non-identifier field")]
    TrackedFieldsEmpty,
    /// `history_entity` was present but not a string.
    #[error("history_entity must be a string")]
    HistoryEntityNotAString,
    /// `relation_name` was present but not a string.
    #[error("relation_name must be a string")]
    RelationNameNotAString,
    /// `back_reference` was present but not a string.
    #[error("back_reference must be a string")]
    BackReferenceNotAString,
    /// `foreign_key` was present but not a string.
    #[error("foreign_key must be a string")]
    ForeignKeyNotAString,
    /// `version_field` was present but not a string.
    #[error("version_field must be a string")]
    VersionFieldNotAString,
    /// `version_width` was present but not a non-negative integer.
    #[error("version_width must be a non-negative integer")]
    VersionWidthNotAnInteger,
    /// `fingerprint_field` was present but neither a string nor `false`.
    #[error("fingerprint_field must be a string or false")]
    FingerprintFieldNotAString,
    /// `fingerprint_width` was present but not a non-negative integer.
    #[error("fingerprint_width must be a non-negative integer")]
    FingerprintWidthNotAnInteger,
    /// `action_field` was present but neither a string nor `false`.
    #[error("action_field must be a string or false")]
    ActionFieldNotAString,
    /// `timestamp_field` was present but neither a string nor `false`.
    #[error("timestamp_field must be a string or false")]
    TimestampFieldNotAString,
    /// `resolve_by_condition` was present but not a boolean.
    #[error("resolve_by_condition must be a boolean")]
    ResolveByConditionNotABool,
}

/// Fully resolved change-tracking configuration.
///
/// One instance per tracked entity type, created once at registration
/// and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackConfig {
    /// Ordered tracked field names; never contains the identifier field.
    pub tracked_fields: Vec<String>,
    /// Name of the history entity type.
    pub history_entity: String,
    /// Entity-to-history relation name.
    pub relation_name: String,
    /// History-to-entity back reference name.
    pub back_reference: String,
    /// Foreign key field on the history entity.
    pub foreign_key: String,
    /// Version field name on entity and history.
    pub version_field: String,
    /// Version field width in digits (formatting floor, not a cap).
    pub version_width: usize,
    /// Fingerprint field name, or `None` when fingerprinting is disabled.
    pub fingerprint_field: Option<String>,
    /// Fingerprint width in characters; meaningful only when enabled.
    pub fingerprint_width: usize,
    /// Action label field on the history entity, or `None` when disabled.
    pub action_field: Option<String>,
    /// Timestamp field on the history entity, or `None` when disabled.
    pub timestamp_field: Option<String>,
    /// Whether pre-write may resolve an instance by the operation's
    /// match condition.
    pub resolve_by_condition: bool,
}

impl TrackConfig {
    /// Resolves partial boot options against a base entity schema.
    ///
    /// Absent keys take their defaults; `tracked_fields` defaults to the
    /// wildcard and is expanded eagerly into an explicit ordered list.
    /// The identifier field is excluded from the tracked set, for
    /// explicit lists too.
    ///
    /// # Errors
    ///
    /// Returns one distinct [`ConfigError`] variant per invalid option.
    pub fn resolve(options: &Value, schema: &EntitySchema) -> Result<Self, ConfigError> {
        let map = options
            .as_object()
            .ok_or(ConfigError::OptionsNotAnObject)?;

        let tracked_fields = resolve_tracked_fields(map.get("tracked_fields"), schema)?;

        let default_history = format!("{}_history", schema.name);
        Ok(TrackConfig {
            tracked_fields,
            history_entity: name_option(
                map.get("history_entity"),
                &default_history,
                ConfigError::HistoryEntityNotAString,
            )?,
            relation_name: name_option(
                map.get("relation_name"),
                DEFAULT_RELATION_NAME,
                ConfigError::RelationNameNotAString,
            )?,
            back_reference: name_option(
                map.get("back_reference"),
                DEFAULT_BACK_REFERENCE,
                ConfigError::BackReferenceNotAString,
            )?,
            foreign_key: name_option(
                map.get("foreign_key"),
                DEFAULT_FOREIGN_KEY,
                ConfigError::ForeignKeyNotAString,
            )?,
            version_field: name_option(
                map.get("version_field"),
                DEFAULT_VERSION_FIELD,
                ConfigError::VersionFieldNotAString,
            )?,
            version_width: width_option(
                map.get("version_width"),
                DEFAULT_VERSION_WIDTH,
                ConfigError::VersionWidthNotAnInteger,
            )?,
            fingerprint_field: disableable_option(
                map.get("fingerprint_field"),
                DEFAULT_FINGERPRINT_FIELD,
                ConfigError::FingerprintFieldNotAString,
            )?,
            fingerprint_width: width_option(
                map.get("fingerprint_width"),
                DEFAULT_FINGERPRINT_WIDTH,
                ConfigError::FingerprintWidthNotAnInteger,
            )?,
            action_field: disableable_option(
                map.get("action_field"),
                DEFAULT_ACTION_FIELD,
                ConfigError::ActionFieldNotAString,
            )?,
            timestamp_field: disableable_option(
                map.get("timestamp_field"),
                DEFAULT_TIMESTAMP_FIELD,
                ConfigError::TimestampFieldNotAString,
            )?,
            resolve_by_condition: bool_option(
                map.get("resolve_by_condition"),
                false,
                ConfigError::ResolveByConditionNotABool,
            )?,
        })
    }

    /// Returns whether fingerprint-based dirty detection is enabled.
    pub fn fingerprinting(&self) -> bool {
        self.fingerprint_field.is_some()
    }
}

/// Expands `tracked_fields` into an explicit ordered list.
fn resolve_tracked_fields(
    value: Option<&Value>,
    schema: &EntitySchema,
) -> Result<Vec<String>, ConfigError> {
    let names: Vec<String> = match value {
        None => schema.field_names().map(str::to_owned).collect(),
        Some(Value::String(s)) if s == "*" => {
            schema.field_names().map(str::to_owned).collect()
        }
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or(ConfigError::TrackedFieldsNotAList)
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(ConfigError::TrackedFieldsNotAList),
    };

    let names: Vec<String> = names
        .into_iter()
        .filter(|name| *name != schema.id_field)
        .collect();
    if names.is_empty() {
        return Err(ConfigError::TrackedFieldsEmpty);
    }
    Ok(names)
}

fn name_option(
    value: Option<&Value>,
    default: &str,
    err: ConfigError,
) -> Result<String, ConfigError> {
    match value {
        None => Ok(default.to_owned()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(err),
    }
}

/// Name-valued option that may be explicitly disabled with `false`.
fn disableable_option(
    value: Option<&Value>,
    default: &str,
    err: ConfigError,
) -> Result<Option<String>, ConfigError> {
    match value {
        None => Ok(Some(default.to_owned())),
        Some(Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(err),
    }
}

fn width_option(
    value: Option<&Value>,
    default: usize,
    err: ConfigError,
) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.as_u64().map(|w| w as usize).ok_or(err),
    }
}

fn bool_option(
    value: Option<&Value>,
    default: bool,
    err: ConfigError,
) -> Result<bool, ConfigError> {
    match value {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(err),
    }
}
