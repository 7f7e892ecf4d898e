//! Stable ordering of records by rank metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Record;

/// Requested order for the final record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Keep the feed's own order.
    #[default]
    AsListed,
    Ascending,
    Descending,
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AsListed => write!(f, "listed"),
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for RankOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listed" | "feed" => Ok(Self::AsListed),
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown order: {other}")),
        }
    }
}

/// Sort by `rank_metric`. Equal metrics keep their input order in both
/// directions.
pub fn rank(mut records: Vec<Record>, order: RankOrder) -> Vec<Record> {
    match order {
        RankOrder::AsListed => {}
        RankOrder::Ascending => records.sort_by(|a, b| a.rank_metric().cmp(&b.rank_metric())),
        // Not a reversed ascending sort: that would flip ties.
        RankOrder::Descending => records.sort_by(|a, b| b.rank_metric().cmp(&a.rank_metric())),
    }
    records
}
