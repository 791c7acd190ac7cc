//! Shared query parameter types for API handlers.

use fleetdocs_core::document::SubjectKind;
use fleetdocs_core::expiry::DocumentState;
use serde::Deserialize;

/// Default row limit for dashboard-style listings.
pub const DEFAULT_LIMIT: i64 = 10;
/// Upper bound for any requested limit.
pub const MAX_LIMIT: i64 = 100;
/// Default look-ahead for upcoming expirations, in days.
pub const DEFAULT_UPCOMING_DAYS: i64 = 30;

/// Clamp a requested limit into `1..=MAX_LIMIT`, defaulting to [`DEFAULT_LIMIT`].
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// `?limit=` for "recent" listings.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// `?days=&limit=` for upcoming expirations.
#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

/// `?subject_kind=&state=` for document listings.
#[derive(Debug, Deserialize)]
pub struct DocumentListParams {
    pub subject_kind: Option<SubjectKind>,
    pub state: Option<DocumentState>,
}

/// `?subject_kind=` filter.
#[derive(Debug, Deserialize)]
pub struct SubjectKindParams {
    pub subject_kind: Option<SubjectKind>,
}

/// Query parameters for document type listings.
#[derive(Debug, Deserialize)]
pub struct DocumentTypeListParams {
    pub subject_kind: Option<SubjectKind>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(25)), 25);
    }
}
