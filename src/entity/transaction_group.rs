use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionGroupType {
    Pending,
    Processed,
}

/// Display bucket of transactions. Built fresh on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionGroup {
    pub group_type: TransactionGroupType,
    pub date: Option<NaiveDate>,
    pub transactions: Vec<Transaction>,
}

impl TransactionGroup {
    pub fn new(group_type: TransactionGroupType, date: Option<NaiveDate>) -> Self {
        Self {
            group_type,
            date,
            transactions: Vec::new(),
        }
    }
}

/// Calendar day of the timestamp in the local timezone.
pub fn date_for_grouping(date: DateTime<Utc>) -> NaiveDate {
    date.with_timezone(&Local).date_naive()
}

/// Sentinel date of the bucket holding everything older than today.
pub fn distant_past() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}
