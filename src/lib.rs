//! Expense splitting and debt settlement for a team roster.
//!
//! Records flow one way: [`split::compute`] splits a single record,
//! [`balance::aggregate`] folds every record into per-participant balances
//! and [`exchange::plan`] turns those balances into suggested payments.
//! [`store`] and [`routes`] expose the engine over HTTP on top of MongoDB.
pub mod balance;
pub mod draft;
pub mod error;
pub mod exchange;
pub mod fingerprint;
pub mod routes;
pub mod schemas;
pub mod settings;
pub mod split;
pub mod store;
pub mod validation;

pub use balance::{aggregate, Balance};
pub use draft::ExpenseDraft;
pub use error::{SplitError, StoreError, ValidationError};
pub use exchange::{plan, settlement_to_expense_record, Exchange, EPSILON};
pub use schemas::{
    ExpenseLabel, ExpenseRecord, ExpenseTag, Group, Participant, ParticipantId, RecordKind,
    ShareMap, SplitMethod,
};
