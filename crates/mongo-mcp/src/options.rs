//! Optional operation arguments and their defaults.
//!
//! Optional inputs arrive as `Option<T>` and are turned into concrete
//! settings exactly once, here, before the backend is called. Zero and
//! negative values for `skip`, `limit` and `batch_size` are treated the same
//! as an absent value.

/// Page size used when `limit` is absent or not positive.
pub const DEFAULT_LIMIT: u64 = 10;

/// Offset used when `skip` is absent or not positive.
pub const DEFAULT_SKIP: u64 = 0;

/// Concrete skip/limit window for `find` and `count_documents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub skip: u64,
    pub limit: u64,
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageBounds {
    /// Substitute defaults for absent or non-positive values.
    pub fn resolve(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            skip: positive(skip).unwrap_or(DEFAULT_SKIP),
            limit: positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Whether documents beyond this page exist.
    ///
    /// `total` is the full match count for the filter, independent of the
    /// window.
    pub fn has_more(&self, returned: usize, total: u64) -> bool {
        (returned as u64).saturating_add(self.skip) < total
    }
}

/// Concrete settings for an aggregation call.
///
/// `None` leaves the backend's own default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSettings {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<u32>,
}

impl AggregateSettings {
    /// `allow_disk_use` is only set when explicitly true; `batch_size` only
    /// when present and positive.
    pub fn resolve(allow_disk_use: Option<bool>, batch_size: Option<i32>) -> Self {
        Self {
            allow_disk_use: allow_disk_use.filter(|allow| *allow),
            batch_size: batch_size
                .filter(|size| *size > 0)
                .and_then(|size| u32::try_from(size).ok()),
        }
    }
}

/// Upsert is off unless the caller asked for it.
pub fn resolve_upsert(requested: Option<bool>) -> bool {
    requested.unwrap_or(false)
}

fn positive(value: Option<i64>) -> Option<u64> {
    value
        .filter(|n| *n > 0)
        .and_then(|n| u64::try_from(n).ok())
}
