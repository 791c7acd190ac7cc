/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (issue / expiry) carry no time-of-day and no zone.
pub type CalendarDate = chrono::NaiveDate;
