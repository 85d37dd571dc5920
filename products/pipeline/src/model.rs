use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(StageId);
string_id!(DealId);
string_id!(ContactId);

impl StageId {
    pub(crate) fn generate() -> Self {
        Self(format!("stage-{}", Uuid::new_v4()))
    }
}

impl DealId {
    pub(crate) fn generate() -> Self {
        Self(format!("deal-{}", Uuid::new_v4()))
    }
}

/// Color class assigned to stages created at runtime.
pub const DEFAULT_STAGE_COLOR: &str = "bg-gray-500";

/// Contact snapshot copied onto a deal when it is created. Never synchronised
/// with any contact record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    pub value: f64,
    /// Name of the owning stage. Always equal to that stage's `name`.
    pub stage: String,
    pub probability: u8,
    pub contact: Contact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Deal {
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub deals: Vec<Deal>,
}

impl Stage {
    pub fn new(id: StageId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            deals: Vec::new(),
        }
    }

    pub fn deal_count(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Sum of the deal values in this column.
    pub fn total_value(&self) -> f64 {
        self.deals.iter().map(|deal| deal.value).sum()
    }

    pub fn weighted_value(&self) -> f64 {
        self.deals.iter().map(Deal::weighted_value).sum()
    }

    pub fn deal(&self, id: &DealId) -> Option<&Deal> {
        self.deals.iter().find(|deal| &deal.id == id)
    }

    pub(crate) fn position_of(&self, id: &DealId) -> Option<usize> {
        self.deals.iter().position(|deal| &deal.id == id)
    }
}

/// Input for creating a deal inside a stage. Stage name and probability are
/// filled in by the board.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub title: String,
    pub value: f64,
    pub contact: Contact,
    pub due_date: Option<NaiveDate>,
    pub created_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl NewDeal {
    pub fn new(title: impl Into<String>, value: f64, contact: Contact) -> Self {
        Self {
            title: title.into(),
            value,
            contact,
            due_date: None,
            created_date: None,
            description: None,
        }
    }
}

/// Largest value a single deal may carry. Keeps board totals finite.
pub const MAX_DEAL_VALUE: f64 = 1.0e15;

pub(crate) fn valid_value(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_DEAL_VALUE).contains(&value)
}
