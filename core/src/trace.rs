//! Tracing utilities for join planning and fragment resolution.
//!
//! Enable the `tracing` feature to emit spans and events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event for a built join tree.
///
/// ```ignore
/// joinery_trace_plan!("posts", tree.node_count());
/// ```
#[macro_export]
macro_rules! joinery_trace_plan {
    ($resource_type:expr, $nodes:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(resource_type = %$resource_type, nodes = $nodes, "joinery.plan");
    };
}

/// Emit a debug-level event for a join the executor materialized.
#[macro_export]
macro_rules! joinery_trace_join {
    ($path_key:expr, $alias:expr, $join_type:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(path = %$path_key, alias = %$alias, join = ?$join_type, "joinery.join");
    };
}

/// Emit a warning for a join the executor declined to add.
#[macro_export]
macro_rules! joinery_warn_no_join {
    ($path_key:expr, $reason:literal) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(path = %$path_key, reason = $reason, "joinery.no_join_added");
    };
}

/// Emit a debug-level event with the fragment SQL text and parameter count.
///
/// ```ignore
/// joinery_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! joinery_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(sql = %$sql, params = $param_count, "joinery.query");
    };
}

/// Emit an info-level event with the number of fragments a resolution produced.
#[macro_export]
macro_rules! joinery_trace_fragments {
    ($resource_type:expr, $count:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!(resource_type = %$resource_type, fragments = $count, "joinery.fragments");
    };
}
