/// All record primary keys are 64-bit integers assigned by the persistence
/// layer.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A suspicion score in `[0.0, 1.0]`; 0 = fully credible, 1 = fully
/// suspicious.
pub type Score = f64;
