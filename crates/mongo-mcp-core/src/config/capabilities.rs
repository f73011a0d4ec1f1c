//! Capability gates evaluated once at startup.

use serde::{Deserialize, Serialize};

/// Startup-time switches deciding which classes of operations are exposed.
///
/// These are not per-request permissions: an operation gated off here is
/// never registered, so it cannot be discovered or invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Hide every mutating operation.
    #[serde(default)]
    pub read_only: bool,

    /// Expose the aggregation pipeline operation.
    #[serde(default)]
    pub allow_aggregates: bool,
}

impl Capabilities {
    pub fn new(read_only: bool, allow_aggregates: bool) -> Self {
        Self {
            read_only,
            allow_aggregates,
        }
    }
}

/// Interpret a boolean setting given as text.
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive.
/// Only `"true"` and `"1"` are truthy; anything else, including unrecognised
/// text, is false.
pub fn parse_flag(raw: &str) -> bool {
    let value = raw.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}
