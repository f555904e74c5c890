//! Offset/limit pagination shared by the vehicle and request-log listings.

use serde::{Deserialize, Serialize};

/// Hard ceiling for any page size.
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_VEHICLE_LIMIT: u32 = 10;
pub const DEFAULT_REQUEST_LOG_LIMIT: u32 = 20;

/// A normalized page request; construction never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetRequest {
    offset: u64,
    limit: u32,
}

impl OffsetRequest {
    /// Non-positive limits fall back to `default_limit`, large ones clamp to
    /// [`MAX_PAGE_LIMIT`], and negative offsets become zero.
    pub fn new(offset: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let default_limit = default_limit.clamp(1, MAX_PAGE_LIMIT);
        let limit = match limit {
            Some(value) if value > 0 => {
                u32::try_from(value.min(i64::from(MAX_PAGE_LIMIT))).unwrap_or(MAX_PAGE_LIMIT)
            }
            _ => default_limit,
        };
        let offset = offset
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);

        Self { offset, limit }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// One page of records plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetPage<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T> OffsetPage<T> {
    pub fn new(records: Vec<T>, total: u64) -> Self {
        Self { records, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_non_positive_limit_uses_default() {
        assert_eq!(OffsetRequest::new(None, None, 10).limit(), 10);
        assert_eq!(OffsetRequest::new(None, Some(0), 10).limit(), 10);
        assert_eq!(OffsetRequest::new(None, Some(-5), 20).limit(), 20);
    }

    #[test]
    fn oversized_limit_is_clamped() {
        assert_eq!(OffsetRequest::new(None, Some(500), 10).limit(), 100);
        assert_eq!(OffsetRequest::new(None, Some(i64::MAX), 10).limit(), 100);
        assert_eq!(OffsetRequest::new(None, Some(100), 10).limit(), 100);
        assert_eq!(OffsetRequest::new(None, Some(1), 10).limit(), 1);
    }

    #[test]
    fn negative_offset_becomes_zero() {
        assert_eq!(OffsetRequest::new(Some(-3), None, 10).offset(), 0);
        assert_eq!(OffsetRequest::new(Some(40), None, 10).offset(), 40);
    }
}
