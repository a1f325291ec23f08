use chrono::{DateTime, Utc};
use status_core::TIMESTAMP_FIELD;

use crate::error::PersistenceError;

/// Range operator for a timestamp predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Evaluate `lhs <op> rhs`.
    pub fn matches(self, lhs: &DateTime<Utc>, rhs: &DateTime<Utc>) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// `{field: {op: value}}` predicate used by [`RecordStore::delete_many`](crate::RecordStore::delete_many).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub field: String,
    pub op: Comparison,
    pub value: DateTime<Utc>,
}

impl RecordFilter {
    /// Predicate on the record timestamp.
    pub fn timestamp(op: Comparison, value: DateTime<Utc>) -> Self {
        Self {
            field: TIMESTAMP_FIELD.to_string(),
            op,
            value,
        }
    }

    /// Records strictly older than `cutoff`.
    pub fn older_than(cutoff: DateTime<Utc>) -> Self {
        Self::timestamp(Comparison::Lt, cutoff)
    }

    /// Stores only index the record timestamp; other fields are rejected.
    pub(crate) fn ensure_timestamp_field(&self) -> Result<(), PersistenceError> {
        if self.field == TIMESTAMP_FIELD {
            Ok(())
        } else {
            Err(PersistenceError::UnsupportedFilter(self.field.clone()))
        }
    }

    pub fn matches(&self, ts: &DateTime<Utc>) -> bool {
        self.op.matches(ts, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn older_than_is_strict() {
        let filter = RecordFilter::older_than(at(100));
        assert!(filter.matches(&at(99)));
        assert!(!filter.matches(&at(100)));
        assert!(!filter.matches(&at(101)));
    }

    #[test]
    fn inclusive_operators() {
        assert!(RecordFilter::timestamp(Comparison::Lte, at(100)).matches(&at(100)));
        assert!(RecordFilter::timestamp(Comparison::Gte, at(100)).matches(&at(100)));
        assert!(!RecordFilter::timestamp(Comparison::Gt, at(100)).matches(&at(100)));
    }

    #[test]
    fn only_the_timestamp_field_is_supported() {
        assert!(RecordFilter::older_than(at(0)).ensure_timestamp_field().is_ok());

        let mut filter = RecordFilter::older_than(at(0));
        filter.field = "host".into();
        assert!(matches!(
            filter.ensure_timestamp_field(),
            Err(PersistenceError::UnsupportedFilter(f)) if f == "host"
        ));
    }
}
