use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type ParticipantId = String;
pub type RecordId = String;
pub type TagId = String;

/// Per-participant numbers attached to a record (weights or custom shares).
pub type ShareMap = BTreeMap<ParticipantId, f64>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// A reusable expense label. Only ever supplies a default amount.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseTag {
    pub id: TagId,
    pub name: String,
    pub default_amount: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A shared cost split among the participants.
    #[default]
    Expense,
    /// A direct payment from the payer to the single listed participant.
    Settlement,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ExpenseLabel {
    Tag(TagId),
    Custom(String),
}

impl ExpenseLabel {
    pub fn is_blank(&self) -> bool {
        match self {
            ExpenseLabel::Tag(id) => id.trim().is_empty(),
            ExpenseLabel::Custom(name) => name.trim().is_empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    #[default]
    Equal,
    Weighted,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseRecord {
    pub id: RecordId,
    #[serde(default)]
    pub kind: RecordKind,
    pub label: ExpenseLabel,
    pub amount: f64,
    pub payer: ParticipantId,
    pub split_method: SplitMethod,
    pub participants: Vec<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<ShareMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_shares: Option<ShareMap>,
    pub date: NaiveDate,
}

/// One team as the store keeps it: roster, tags and every record.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub tags: Vec<ExpenseTag>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
}
