use std::collections::BTreeMap;

use crate::error::SplitError;
use crate::schemas::{ExpenseRecord, Group, Participant, ParticipantId};
use crate::split;
use crate::validation::{validate_membership, validate_record, validate_roster};

/// Net position per participant: positive means the group owes them.
pub type Balance = BTreeMap<ParticipantId, f64>;

/// Folds every record into one balance per roster participant.
///
/// The payer is credited the full amount and each participant is debited
/// their share. Settlement records go through the same path: crediting the
/// payer and debiting the single receiver is exactly a direct payment.
/// Nothing is returned unless every record is valid.
pub fn aggregate(
    records: &[ExpenseRecord],
    participants: &[Participant],
) -> Result<Balance, SplitError> {
    validate_roster(participants)?;

    let mut balance: Balance = participants
        .iter()
        .map(|participant| (participant.id.clone(), 0.0))
        .collect();

    for record in records {
        validate_record(record)?;
        validate_membership(record, |id| balance.contains_key(id))?;
        let shares = split::compute_validated(record)?;

        *balance.entry(record.payer.clone()).or_default() += record.amount;
        for (participant, share) in shares {
            *balance.entry(participant).or_default() -= share;
        }
        if !touched(record).all(|id| balance.get(id).is_some_and(|v| v.is_finite())) {
            return Err(SplitError::Overflow(record.id.clone()));
        }
    }

    tracing::debug!(
        "aggregated {} records into {} balances",
        records.len(),
        balance.len()
    );
    Ok(balance)
}

fn touched(record: &ExpenseRecord) -> impl Iterator<Item = &str> {
    std::iter::once(record.payer.as_str()).chain(record.participants.iter().map(String::as_str))
}

pub fn compute_balance_from_group(group: &Group) -> Result<Balance, SplitError> {
    aggregate(&group.expenses, &group.participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::schemas::{ExpenseLabel, RecordKind, ShareMap, SplitMethod};
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    #[fixture]
    fn roster() -> Vec<Participant> {
        [("a", "Ann"), ("b", "Ben"), ("c", "Cal")]
            .into_iter()
            .map(|(id, name)| Participant {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn equal(id: &str, amount: f64, payer: &str, participants: &[&str]) -> ExpenseRecord {
        ExpenseRecord {
            id: id.to_string(),
            kind: RecordKind::Expense,
            label: ExpenseLabel::Custom("Court".to_string()),
            amount,
            payer: payer.to_string(),
            split_method: SplitMethod::Equal,
            participants: participants.iter().map(|p| p.to_string()).collect(),
            weights: None,
            custom_shares: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
        }
    }

    fn assert_balance(balance: &Balance, expected: &[(&str, f64)]) {
        assert_eq!(balance.len(), expected.len());
        for (id, value) in expected {
            assert!(
                (balance[*id] - value).abs() < 1e-9,
                "{id}: {} != {value}",
                balance[*id]
            );
        }
    }

    #[rstest]
    fn empty_record_set_yields_zero_for_everyone(roster: Vec<Participant>) {
        let balance = aggregate(&[], &roster).unwrap();

        assert_balance(&balance, &[("a", 0.0), ("b", 0.0), ("c", 0.0)]);
    }

    #[rstest]
    fn equal_split_credits_payer(roster: Vec<Participant>) {
        let records = [equal("e1", 90.0, "a", &["a", "b", "c"])];

        let balance = aggregate(&records, &roster).unwrap();

        assert_balance(&balance, &[("a", 60.0), ("b", -30.0), ("c", -30.0)]);
    }

    #[rstest]
    fn payer_outside_participants_is_credited_in_full(roster: Vec<Participant>) {
        let records = [equal("e1", 40.0, "c", &["a", "b"])];

        let balance = aggregate(&records, &roster).unwrap();

        assert_balance(&balance, &[("a", -20.0), ("b", -20.0), ("c", 40.0)]);
    }

    #[rstest]
    fn single_participant_record_moves_money_between_two(roster: Vec<Participant>) {
        let records = [
            equal("e1", 30.0, "a", &["b"]),
            equal("e2", 30.0, "b", &["a"]),
        ];

        let balance = aggregate(&records, &roster).unwrap();

        assert_balance(&balance, &[("a", 0.0), ("b", 0.0), ("c", 0.0)]);
    }

    #[rstest]
    fn settlement_kind_behaves_like_single_participant_expense(roster: Vec<Participant>) {
        let as_expense = [equal("e1", 12.0, "b", &["a"])];
        let mut settlement = equal("e1", 12.0, "b", &["a"]);
        settlement.kind = RecordKind::Settlement;

        assert_eq!(
            aggregate(&as_expense, &roster).unwrap(),
            aggregate(&[settlement], &roster).unwrap()
        );
    }

    #[rstest]
    fn mixed_methods_conserve_money(roster: Vec<Participant>) {
        let mut weighted = equal("e2", 100.0, "b", &["a", "b", "c"]);
        weighted.split_method = SplitMethod::Weighted;
        weighted.weights = Some(ShareMap::from([
            ("a".to_string(), 2.0),
            ("b".to_string(), 1.0),
            ("c".to_string(), 4.0),
        ]));
        let mut custom = equal("e3", 33.0, "c", &["a", "b"]);
        custom.split_method = SplitMethod::Custom;
        custom.custom_shares = Some(ShareMap::from([
            ("a".to_string(), 11.0),
            ("b".to_string(), 22.0),
        ]));
        let records = [equal("e1", 10.0, "a", &["a", "b", "c"]), weighted, custom];

        let balance = aggregate(&records, &roster).unwrap();

        let total: f64 = balance.values().sum();
        assert!(total.abs() < 1e-6);
    }

    #[rstest]
    fn unknown_participant_fails_closed(roster: Vec<Participant>) {
        let records = [
            equal("e1", 10.0, "a", &["a", "b"]),
            equal("e2", 10.0, "a", &["a", "zed"]),
        ];

        assert_eq!(
            aggregate(&records, &roster),
            Err(SplitError::Invalid(ValidationError::UnknownParticipant {
                record: "e2".to_string(),
                participant: "zed".to_string(),
            }))
        );
    }

    #[rstest]
    fn zero_weight_is_reported_as_computation_error(roster: Vec<Participant>) {
        let mut weighted = equal("e1", 10.0, "a", &["a", "b"]);
        weighted.split_method = SplitMethod::Weighted;
        weighted.weights = Some(ShareMap::from([("a".to_string(), 0.0)]));

        assert_eq!(
            aggregate(&[weighted], &roster),
            Err(SplitError::ZeroTotalWeight("e1".to_string()))
        );
    }

    #[rstest]
    fn balance_overflow_fails_closed(roster: Vec<Participant>) {
        let records = [
            equal("e1", f64::MAX, "a", &["b"]),
            equal("e2", f64::MAX, "a", &["c"]),
        ];

        assert_eq!(
            aggregate(&records, &roster),
            Err(SplitError::Overflow("e2".to_string()))
        );
    }

    #[rstest]
    fn huge_weights_never_yield_nan_balances(roster: Vec<Participant>) {
        let mut weighted = equal("e1", 100.0, "a", &["a", "b"]);
        weighted.split_method = SplitMethod::Weighted;
        weighted.weights = Some(ShareMap::from([
            ("a".to_string(), 1e308),
            ("b".to_string(), 1e308),
        ]));

        assert_eq!(
            aggregate(&[weighted], &roster),
            Err(SplitError::Overflow("e1".to_string()))
        );
    }

    #[rstest]
    fn group_balance_uses_its_roster(roster: Vec<Participant>) {
        let group = Group {
            id: "g1".to_string(),
            name: "Thursday squad".to_string(),
            participants: roster,
            tags: vec![],
            expenses: vec![equal("e1", 9.0, "b", &["a", "b", "c"])],
        };

        let balance = compute_balance_from_group(&group).unwrap();

        assert_balance(&balance, &[("a", -3.0), ("b", 6.0), ("c", -3.0)]);
    }
}
