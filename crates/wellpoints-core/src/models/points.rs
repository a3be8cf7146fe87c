use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum TransactionKind {
    Earn,
    Redeem,
}

/// A single points ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Points moved; redemptions are reported as positive amounts
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
}

impl Transaction {
    /// Amount with sign applied (redemptions negative)
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Earn => self.amount.saturating_abs(),
            TransactionKind::Redeem => self.amount.saturating_abs().saturating_neg(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Earn,
    Redeem,
}

impl TransactionFilter {
    pub fn matches(self, kind: TransactionKind) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Earn => kind == TransactionKind::Earn,
            TransactionFilter::Redeem => kind == TransactionKind::Redeem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind '{0}', expected all, earn or redeem")]
pub struct ParseFilterError(String);

/// Parses user input ("all", "earn", "redeem")
impl FromStr for TransactionFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(TransactionFilter::All),
            "earn" | "earned" => Ok(TransactionFilter::Earn),
            "redeem" | "redeemed" => Ok(TransactionFilter::Redeem),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}

/// Filtered view of the ledger over an inclusive date range, newest first
#[derive(Debug, Clone)]
pub struct PointsStatement<'a> {
    pub entries: Vec<&'a Transaction>,
}

impl<'a> PointsStatement<'a> {
    pub fn build(
        transactions: &'a [Transaction],
        filter: TransactionFilter,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        let mut entries: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| filter.matches(t.kind))
            .filter(|t| from.map_or(true, |from| t.date >= from))
            .filter(|t| to.map_or(true, |to| t.date <= to))
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Self { entries }
    }

    pub fn total_earned(&self) -> i64 {
        self.entries
            .iter()
            .filter(|t| t.kind == TransactionKind::Earn)
            .fold(0i64, |total, t| total.saturating_add(t.amount.saturating_abs()))
    }

    pub fn total_redeemed(&self) -> i64 {
        self.entries
            .iter()
            .filter(|t| t.kind == TransactionKind::Redeem)
            .fold(0i64, |total, t| total.saturating_add(t.amount.saturating_abs()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
