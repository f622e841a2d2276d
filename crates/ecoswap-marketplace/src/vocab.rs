//! Fixed value sets the server stores as database enums.
//!
//! Values are matched exactly (case and spacing included); anything else is
//! rejected before a request is sent.

use crate::error::MarketplaceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn invalid(field: &'static str, value: &str, expected: &[&str]) -> MarketplaceError {
    MarketplaceError::InvalidValue {
        field,
        value: value.to_string(),
        expected: expected.join(", "),
    }
}

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Men,
    Women,
    Kids,
    Unisex,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Men, Self::Women, Self::Kids, Self::Unisex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
            Self::Kids => "Kids",
            Self::Unisex => "Unisex",
        }
    }
}

impl FromStr for Category {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid("category", s, &Self::ALL.map(|c| c.as_str())))
    }
}

/// Physical condition of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCondition {
    New,
    #[serde(rename = "Gently Used")]
    GentlyUsed,
    Worn,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 3] = [Self::New, Self::GentlyUsed, Self::Worn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::GentlyUsed => "Gently Used",
            Self::Worn => "Worn",
        }
    }
}

impl FromStr for ItemCondition {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid("item condition", s, &Self::ALL.map(|c| c.as_str())))
    }
}

/// Listing status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Listed for both exchange and donation
    All,
    Available,
    Exchange,
    Donated,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [Self::All, Self::Available, Self::Exchange, Self::Donated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Available => "Available",
            Self::Exchange => "Exchange",
            Self::Donated => "Donated",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid("item status", s, &Self::ALL.map(|c| c.as_str())))
    }
}

/// State of an exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ExchangeStatus {
    pub const ALL: [ExchangeStatus; 3] = [Self::Pending, Self::Accepted, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }

    /// Whether the exchange can still be accepted or rejected.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl FromStr for ExchangeStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid("exchange status", s, &Self::ALL.map(|c| c.as_str())))
    }
}

/// Direction of an eco-point transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Earn,
    Spend,
}

impl TransactionType {
    pub const ALL: [TransactionType; 2] = [Self::Earn, Self::Spend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earn => "Earn",
            Self::Spend => "Spend",
        }
    }

    /// Signed effect of `points` on a balance.
    pub fn apply(&self, points: i64) -> i64 {
        match self {
            Self::Earn => points,
            Self::Spend => -points,
        }
    }
}

impl FromStr for TransactionType {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| invalid("transaction type", s, &Self::ALL.map(|c| c.as_str())))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
