//! Errors raised while validating records, splitting them, or talking to the
//! store.
//!
//! - [`ValidationError`] is raised before any computation starts.
//! - [`SplitError`] adds the computation failures on top of validation.
//! - [`StoreError`] comes from the persistence layer and is passed through.
use thiserror::Error;

use crate::schemas::{ParticipantId, RecordId, TagId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expense \"{0}\" has no payer")]
    MissingPayer(RecordId),
    #[error("expense \"{0}\" has no participants")]
    NoParticipants(RecordId),
    #[error("expense \"{record}\" lists \"{participant}\" more than once")]
    DuplicateParticipant {
        record: RecordId,
        participant: ParticipantId,
    },
    #[error("expense \"{record}\" has an invalid amount: {amount}")]
    InvalidAmount { record: RecordId, amount: f64 },
    #[error("expense \"{0}\" has no label")]
    MissingLabel(RecordId),
    #[error("expense \"{0}\" is split by weight but has no weights")]
    MissingWeights(RecordId),
    #[error("expense \"{0}\" has a custom split but no custom shares")]
    MissingCustomShares(RecordId),
    #[error("expense \"{record}\" weighs \"{participant}\" who is not a participant")]
    WeightOutsideParticipants {
        record: RecordId,
        participant: ParticipantId,
    },
    #[error("expense \"{record}\" has an invalid weight for \"{participant}\": {weight}")]
    InvalidWeight {
        record: RecordId,
        participant: ParticipantId,
        weight: f64,
    },
    #[error("expense \"{record}\" has an invalid share for \"{participant}\": {share}")]
    InvalidCustomShare {
        record: RecordId,
        participant: ParticipantId,
        share: f64,
    },
    #[error("settlement \"{0}\" must be an equal split paid to a single other participant")]
    MalformedSettlement(RecordId),
    #[error("expense \"{record}\" references unknown participant \"{participant}\"")]
    UnknownParticipant {
        record: RecordId,
        participant: ParticipantId,
    },
    #[error("expense \"{record}\" references unknown tag \"{tag}\"")]
    UnknownTag { record: RecordId, tag: TagId },
    #[error("participant \"{0}\" appears more than once in the roster")]
    DuplicateRosterEntry(ParticipantId),
    #[error("participant id must not be empty")]
    EmptyParticipantId,
    #[error("tag \"{tag}\" has an invalid default amount: {amount}")]
    InvalidTagAmount { tag: TagId, amount: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("expense \"{0}\" has a total weight of zero")]
    ZeroTotalWeight(RecordId),
    #[error("expense \"{0}\" adds up to more than can be represented")]
    Overflow(RecordId),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Serialization(#[from] bson::ser::Error),
}
