//! In-progress edits of an expense record.
//!
//! [`ExpenseDraft`] is a value: every method consumes the draft and returns
//! the changed one. The weight and custom-share maps are shared between
//! clones and copied only when one of them is changed, so a draft handed to
//! someone else never sees later edits.
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::schemas::{
    ExpenseLabel, ExpenseRecord, ExpenseTag, ParticipantId, RecordId, RecordKind, ShareMap,
    SplitMethod,
};
use crate::validation::validate_record;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseDraft {
    id: RecordId,
    kind: RecordKind,
    label: Option<ExpenseLabel>,
    amount: Option<f64>,
    payer: Option<ParticipantId>,
    split_method: SplitMethod,
    participants: Vec<ParticipantId>,
    weights: Arc<ShareMap>,
    custom_shares: Arc<ShareMap>,
    date: Option<NaiveDate>,
}

impl ExpenseDraft {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Starts a draft labelled with `tag` and pre-filled with its amount.
    pub fn from_tag(id: impl Into<RecordId>, tag: &ExpenseTag) -> Self {
        Self::new(id)
            .label(ExpenseLabel::Tag(tag.id.clone()))
            .amount(tag.default_amount)
    }

    /// Starts a draft from a stored record, for editing.
    pub fn from_record(record: &ExpenseRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind,
            label: Some(record.label.clone()),
            amount: Some(record.amount),
            payer: Some(record.payer.clone()),
            split_method: record.split_method,
            participants: record.participants.clone(),
            weights: Arc::new(record.weights.clone().unwrap_or_default()),
            custom_shares: Arc::new(record.custom_shares.clone().unwrap_or_default()),
            date: Some(record.date),
        }
    }

    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn label(mut self, label: ExpenseLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn payer(mut self, payer: impl Into<ParticipantId>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn split_method(mut self, split_method: SplitMethod) -> Self {
        self.split_method = split_method;
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_participant(mut self, participant: impl Into<ParticipantId>) -> Self {
        let participant = participant.into();
        if !self.participants.contains(&participant) {
            self.participants.push(participant);
        }
        self
    }

    /// Removes the participant along with their weight and custom share.
    pub fn without_participant(mut self, participant: &str) -> Self {
        self.participants.retain(|p| p != participant);
        if self.weights.contains_key(participant) {
            Arc::make_mut(&mut self.weights).remove(participant);
        }
        if self.custom_shares.contains_key(participant) {
            Arc::make_mut(&mut self.custom_shares).remove(participant);
        }
        self
    }

    pub fn weight(mut self, participant: impl Into<ParticipantId>, weight: f64) -> Self {
        Arc::make_mut(&mut self.weights).insert(participant.into(), weight);
        self
    }

    pub fn custom_share(mut self, participant: impl Into<ParticipantId>, share: f64) -> Self {
        Arc::make_mut(&mut self.custom_shares).insert(participant.into(), share);
        self
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn weights(&self) -> &ShareMap {
        &self.weights
    }

    pub fn custom_shares(&self) -> &ShareMap {
        &self.custom_shares
    }

    /// Produces the record, keeping only the map the split method uses.
    ///
    /// A draft without a date is dated today.
    pub fn build(self) -> Result<ExpenseRecord, ValidationError> {
        let payer = self
            .payer
            .ok_or_else(|| ValidationError::MissingPayer(self.id.clone()))?;
        let label = self
            .label
            .ok_or_else(|| ValidationError::MissingLabel(self.id.clone()))?;
        let amount = self.amount.ok_or_else(|| ValidationError::InvalidAmount {
            record: self.id.clone(),
            amount: 0.0,
        })?;

        let (weights, custom_shares) = match self.split_method {
            SplitMethod::Equal => (None, None),
            SplitMethod::Weighted => (Some(Arc::unwrap_or_clone(self.weights)), None),
            SplitMethod::Custom => (None, Some(Arc::unwrap_or_clone(self.custom_shares))),
        };

        let record = ExpenseRecord {
            id: self.id,
            kind: self.kind,
            label,
            amount,
            payer,
            split_method: self.split_method,
            participants: self.participants,
            weights,
            custom_shares,
            date: self
                .date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        };
        validate_record(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
    }

    fn base() -> ExpenseDraft {
        ExpenseDraft::new("e1")
            .label(ExpenseLabel::Custom("Referee".to_string()))
            .amount(80.0)
            .payer("a")
            .date(date())
            .with_participant("a")
            .with_participant("b")
    }

    #[test]
    fn builds_equal_record() {
        let record = base().build().unwrap();

        assert_eq!(record.split_method, SplitMethod::Equal);
        assert_eq!(record.participants, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(record.weights, None);
        assert_eq!(record.date, date());
    }

    #[test]
    fn tag_supplies_label_and_default_amount() {
        let tag = ExpenseTag {
            id: "balls".to_string(),
            name: "Balls".to_string(),
            default_amount: 24.0,
        };

        let record = ExpenseDraft::from_tag("e2", &tag)
            .payer("a")
            .with_participant("b")
            .date(date())
            .build()
            .unwrap();

        assert_eq!(record.label, ExpenseLabel::Tag("balls".to_string()));
        assert_eq!(record.amount, 24.0);
    }

    #[test]
    fn clones_do_not_see_later_edits() {
        let draft = base().split_method(SplitMethod::Weighted).weight("a", 1.0);
        let snapshot = draft.clone();

        let edited = draft.weight("b", 3.0).without_participant("a");

        assert_eq!(snapshot.weights().len(), 1);
        assert_eq!(snapshot.participants().len(), 2);
        assert_eq!(edited.weights().len(), 1);
        assert_eq!(edited.weights().get("b"), Some(&3.0));
        assert_eq!(edited.participants(), &["b".to_string()]);
    }

    #[test]
    fn removing_participant_drops_their_share() {
        let record = base()
            .split_method(SplitMethod::Custom)
            .custom_share("a", 30.0)
            .custom_share("b", 50.0)
            .without_participant("b")
            .build()
            .unwrap();

        assert_eq!(
            record.custom_shares,
            Some(ShareMap::from([("a".to_string(), 30.0)]))
        );
    }

    #[test]
    fn unused_map_is_left_out() {
        let record = base()
            .custom_share("a", 30.0)
            .split_method(SplitMethod::Weighted)
            .weight("a", 2.0)
            .build()
            .unwrap();

        assert_eq!(record.custom_shares, None);
        assert_eq!(
            record.weights,
            Some(ShareMap::from([("a".to_string(), 2.0)]))
        );
    }

    #[test]
    fn adding_a_participant_twice_keeps_one_entry() {
        let draft = base().with_participant("a");

        assert_eq!(draft.participants().len(), 2);
    }

    #[test]
    fn incomplete_draft_reports_what_is_missing() {
        assert_eq!(
            ExpenseDraft::new("e9").amount(5.0).build(),
            Err(ValidationError::MissingPayer("e9".to_string()))
        );
        assert_eq!(
            ExpenseDraft::new("e9").payer("a").amount(5.0).build(),
            Err(ValidationError::MissingLabel("e9".to_string()))
        );
        assert_eq!(
            ExpenseDraft::new("e9")
                .payer("a")
                .label(ExpenseLabel::Custom("Kit".to_string()))
                .amount(5.0)
                .build(),
            Err(ValidationError::NoParticipants("e9".to_string()))
        );
    }

    #[test]
    fn editing_a_record_round_trips_its_fields() {
        let record = base().build().unwrap();

        let rebuilt = ExpenseDraft::from_record(&record).build().unwrap();

        assert_eq!(rebuilt, record);
    }
}
