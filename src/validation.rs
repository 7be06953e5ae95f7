//! Checks run on records and rosters before anything is computed.
use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::schemas::{
    ExpenseLabel, ExpenseRecord, ExpenseTag, Group, Participant, RecordKind, ShareMap,
    SplitMethod,
};

/// Checks a record on its own, without looking at any roster.
pub fn validate_record(record: &ExpenseRecord) -> Result<(), ValidationError> {
    let id = &record.id;

    if record.payer.trim().is_empty() {
        return Err(ValidationError::MissingPayer(id.clone()));
    }
    if !(record.amount.is_finite() && record.amount > 0.0) {
        return Err(ValidationError::InvalidAmount {
            record: id.clone(),
            amount: record.amount,
        });
    }
    if record.label.is_blank() {
        return Err(ValidationError::MissingLabel(id.clone()));
    }
    if record.participants.is_empty() {
        return Err(ValidationError::NoParticipants(id.clone()));
    }

    let mut seen = BTreeSet::new();
    for participant in &record.participants {
        if participant.trim().is_empty() {
            return Err(ValidationError::EmptyParticipantId);
        }
        if !seen.insert(participant.as_str()) {
            return Err(ValidationError::DuplicateParticipant {
                record: id.clone(),
                participant: participant.clone(),
            });
        }
    }

    match record.split_method {
        SplitMethod::Equal => {}
        SplitMethod::Weighted => {
            let weights = record
                .weights
                .as_ref()
                .ok_or_else(|| ValidationError::MissingWeights(id.clone()))?;
            validate_weights(record, weights, &seen)?;
        }
        SplitMethod::Custom => {
            let shares = record
                .custom_shares
                .as_ref()
                .ok_or_else(|| ValidationError::MissingCustomShares(id.clone()))?;
            for (participant, &share) in shares {
                if !(share.is_finite() && share >= 0.0) {
                    return Err(ValidationError::InvalidCustomShare {
                        record: id.clone(),
                        participant: participant.clone(),
                        share,
                    });
                }
            }
        }
    }

    if record.kind == RecordKind::Settlement {
        let single_receiver = match record.participants.as_slice() {
            [receiver] => receiver != &record.payer,
            _ => false,
        };
        if record.split_method != SplitMethod::Equal || !single_receiver {
            return Err(ValidationError::MalformedSettlement(id.clone()));
        }
    }

    Ok(())
}

fn validate_weights(
    record: &ExpenseRecord,
    weights: &ShareMap,
    participants: &BTreeSet<&str>,
) -> Result<(), ValidationError> {
    for (participant, &weight) in weights {
        if !participants.contains(participant.as_str()) {
            return Err(ValidationError::WeightOutsideParticipants {
                record: record.id.clone(),
                participant: participant.clone(),
            });
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ValidationError::InvalidWeight {
                record: record.id.clone(),
                participant: participant.clone(),
                weight,
            });
        }
    }
    Ok(())
}

pub fn validate_roster(participants: &[Participant]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for participant in participants {
        if participant.id.trim().is_empty() {
            return Err(ValidationError::EmptyParticipantId);
        }
        if !seen.insert(participant.id.as_str()) {
            return Err(ValidationError::DuplicateRosterEntry(participant.id.clone()));
        }
    }
    Ok(())
}

/// Every id the record touches (payer and participants) must be on the roster.
pub fn validate_membership(
    record: &ExpenseRecord,
    roster: impl Fn(&str) -> bool,
) -> Result<(), ValidationError> {
    std::iter::once(&record.payer)
        .chain(record.participants.iter())
        .find(|id| !roster(id.as_str()))
        .map_or(Ok(()), |unknown| {
            Err(ValidationError::UnknownParticipant {
                record: record.id.clone(),
                participant: unknown.clone(),
            })
        })
}

pub fn validate_tag(record: &ExpenseRecord, tags: &[ExpenseTag]) -> Result<(), ValidationError> {
    match &record.label {
        ExpenseLabel::Tag(tag) if !tags.iter().any(|t| &t.id == tag) => {
            Err(ValidationError::UnknownTag {
                record: record.id.clone(),
                tag: tag.clone(),
            })
        }
        _ => Ok(()),
    }
}

pub fn validate_expense_tag(tag: &ExpenseTag) -> Result<(), ValidationError> {
    if !(tag.default_amount.is_finite() && tag.default_amount >= 0.0) {
        return Err(ValidationError::InvalidTagAmount {
            tag: tag.id.clone(),
            amount: tag.default_amount,
        });
    }
    Ok(())
}

/// Full check of a record that is about to be stored in `group`.
pub fn validate_against_group(
    record: &ExpenseRecord,
    group: &Group,
) -> Result<(), ValidationError> {
    validate_record(record)?;
    validate_membership(record, |id| group.participants.iter().any(|p| p.id == id))?;
    validate_tag(record, &group.tags)
}
