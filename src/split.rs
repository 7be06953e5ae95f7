use std::collections::BTreeMap;

use crate::error::{SplitError, ValidationError};
use crate::schemas::{ExpenseRecord, ParticipantId, SplitMethod};
use crate::validation::validate_record;

/// What each participant owes for a single record.
pub type Shares = BTreeMap<ParticipantId, f64>;

/// Relative tolerance used when comparing a sum of shares with the amount.
pub const SHARE_TOLERANCE: f64 = 1e-6;

/// Splits `record.amount` among its participants.
///
/// Equal and weighted splits always sum to the amount. Custom shares are
/// returned as given, with participants missing from the map owing `0`.
pub fn compute(record: &ExpenseRecord) -> Result<Shares, SplitError> {
    validate_record(record)?;
    compute_validated(record)
}

pub(crate) fn compute_validated(record: &ExpenseRecord) -> Result<Shares, SplitError> {
    match record.split_method {
        SplitMethod::Equal => Ok(equal_shares(record)),
        SplitMethod::Weighted => weighted_shares(record),
        SplitMethod::Custom => custom_shares(record),
    }
}

fn equal_shares(record: &ExpenseRecord) -> Shares {
    let amount_per_participant = record.amount / record.participants.len() as f64;
    record
        .participants
        .iter()
        .map(|participant| (participant.clone(), amount_per_participant))
        .collect()
}

fn weighted_shares(record: &ExpenseRecord) -> Result<Shares, SplitError> {
    let weights = record
        .weights
        .as_ref()
        .ok_or_else(|| ValidationError::MissingWeights(record.id.clone()))?;

    let weight_of = |participant: &ParticipantId| weights.get(participant).copied().unwrap_or(0.0);
    let total_weight: f64 = record.participants.iter().map(weight_of).sum();
    if !total_weight.is_finite() {
        return Err(SplitError::Overflow(record.id.clone()));
    }
    if total_weight <= 0.0 {
        return Err(SplitError::ZeroTotalWeight(record.id.clone()));
    }

    Ok(record
        .participants
        .iter()
        .map(|participant| {
            let share = record.amount * (weight_of(participant) / total_weight);
            (participant.clone(), share)
        })
        .collect())
}

fn custom_shares(record: &ExpenseRecord) -> Result<Shares, SplitError> {
    let custom = record
        .custom_shares
        .as_ref()
        .ok_or_else(|| ValidationError::MissingCustomShares(record.id.clone()))?;

    let shares: Shares = record
        .participants
        .iter()
        .map(|participant| {
            let share = custom.get(participant).copied().unwrap_or(0.0);
            (participant.clone(), share)
        })
        .collect();

    let total: f64 = shares.values().sum();
    if !total.is_finite() {
        return Err(SplitError::Overflow(record.id.clone()));
    }
    // Accepted as-is: a mismatch only shows up in the logs.
    if (total - record.amount).abs() > SHARE_TOLERANCE * record.amount {
        tracing::warn!(
            "custom shares of expense {} sum to {total}, expected {}",
            record.id,
            record.amount
        );
    }

    Ok(shares)
}
