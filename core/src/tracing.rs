//! Tracing utilities for statement execution and persistence-context events.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The feature is checked in the crate that invokes the
//! macro, so callers need their own `tracing` feature and dependency.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// quarry_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! quarry_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(sql = %$sql, params = $param_count, "quarry.query");
    };
}

/// Emit a trace-level event for persistence-context lifecycle
/// (persist, flush, clear, identity-map hits, fetch-join attachment, loads).
///
/// ```ignore
/// quarry_trace_context!("persist", table = "member", id = 3);
/// quarry_trace_context!("clear");
/// ```
#[macro_export]
macro_rules! quarry_trace_context {
    ($event:literal $(, $key:ident = $value:expr)* $(,)?) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(event = $event $(, $key = %$value)*, "quarry.context");
    };
}

/// Emit a warn-level event for context operations that drop caller state.
///
/// ```ignore
/// quarry_warn_context!("clear", discarded = pending.len());
/// ```
#[macro_export]
macro_rules! quarry_warn_context {
    ($event:literal $(, $key:ident = $value:expr)* $(,)?) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(event = $event $(, $key = %$value)*, "quarry.context");
    };
}
