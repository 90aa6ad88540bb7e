use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// A resource type is not declared in the schema
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(CompactString),

    /// A path segment does not name a relationship on the current resource type
    #[error("unknown relationship '{relationship}' on '{resource_type}'")]
    UnknownRelationship {
        resource_type: CompactString,
        relationship: CompactString,
    },

    /// The final path segment names neither an attribute nor a relationship
    #[error("unknown field '{field}' on '{resource_type}'")]
    UnknownField {
        resource_type: CompactString,
        field: CompactString,
    },

    /// A `#type` discriminator was used on a non-polymorphic relationship, or
    /// names a type the relationship cannot reach
    #[error("invalid type discriminator '#{target}' on relationship '{relationship}'")]
    InvalidTypeDiscriminator {
        relationship: CompactString,
        target: CompactString,
    },

    /// Two distinct joins were assigned the same alias by the executor
    #[error(
        "alias '{alias}' claimed by '{incoming}' is already held by '{existing}'. Possible relation reordering"
    )]
    AliasCollision {
        alias: CompactString,
        existing: CompactString,
        incoming: CompactString,
    },

    /// The same path key was registered twice
    #[error("join details for path '{0}' already set")]
    DuplicatePathKey(CompactString),

    /// No alias is recorded for the requested path key
    #[error("no alias recorded for path '{0}'")]
    AliasNotFound(CompactString),

    /// The executor skipped a join while strict joins are enabled
    #[error("no join added for path '{0}'")]
    JoinNotAdded(CompactString),

    /// Cache stamps were requested for a resource without a cache field
    #[error("resource '{0}' has no cache field")]
    MissingCacheField(CompactString),

    /// A row cell could not be used as a primary key
    #[error("invalid primary key value: {0}")]
    InvalidKey(String),

    /// The declared schema is inconsistent
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The relational executor failed to apply a join. Returned by
    /// [`SqlExecutor`](crate::sql::SqlExecutor) when asked to join the base
    /// table, and the variant other `RelationalExecutor` implementations
    /// should report their own failures with
    #[error("Execution error: {0}")]
    Execution(String),

    /// Reading rows from storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl PlanError {
    /// Returns true for failures caused by caller-supplied paths rather than
    /// by the planner or the storage layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlanError::UnknownResourceType(_)
                | PlanError::UnknownRelationship { .. }
                | PlanError::UnknownField { .. }
                | PlanError::InvalidTypeDiscriminator { .. }
        )
    }
}

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlanError>;
