use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::balance::{compute_balance_from_group, Balance};
use crate::error::SplitError;
use crate::schemas::{
    ExpenseLabel, ExpenseRecord, Group, ParticipantId, RecordId, RecordKind, SplitMethod,
};

/// Balances closer to zero than this are considered settled.
pub const EPSILON: f64 = 0.01;

/// A suggested payment: `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Exchange {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
}

#[derive(Clone, Debug)]
struct PersonalBalance {
    id: ParticipantId,
    remaining: f64,
}

// Stable sort, biggest first. Equal amounts keep the ascending id order the
// balance map iterates in.
fn sort_descending(balances: &mut [PersonalBalance]) {
    balances.sort_by(|a, b| b.remaining.total_cmp(&a.remaining));
}

/// Greedily pairs the biggest debtor with the biggest creditor until one side
/// runs out. Produces at most `creditors + debtors - 1` exchanges.
pub fn plan(balances: &Balance) -> Vec<Exchange> {
    // Divide people into debtors and creditors
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();
    for (id, &balance) in balances {
        if balance > EPSILON {
            creditors.push(PersonalBalance {
                id: id.clone(),
                remaining: balance,
            });
        } else if balance < -EPSILON {
            debtors.push(PersonalBalance {
                id: id.clone(),
                remaining: -balance,
            });
        }
    }
    sort_descending(&mut creditors);
    sort_descending(&mut debtors);

    let mut exchanges = Vec::new();
    let (mut c, mut d) = (0, 0);
    while c < creditors.len() && d < debtors.len() {
        let creditor = &mut creditors[c];
        let debtor = &mut debtors[d];

        let amount = creditor.remaining.min(debtor.remaining);
        exchanges.push(Exchange {
            from: debtor.id.clone(),
            to: creditor.id.clone(),
            amount,
        });
        creditor.remaining -= amount;
        debtor.remaining -= amount;

        if debtor.remaining < EPSILON {
            d += 1;
        }
        if creditor.remaining < EPSILON {
            c += 1;
        }
    }

    tracing::debug!(
        "planned {} exchanges for {} creditors and {} debtors",
        exchanges.len(),
        creditors.len(),
        debtors.len()
    );
    exchanges
}

/// Returns the balances as they would be once every exchange has been paid.
pub fn apply(balances: &Balance, exchanges: &[Exchange]) -> Balance {
    let mut settled = balances.clone();
    for exchange in exchanges {
        *settled.entry(exchange.from.clone()).or_insert(0.0) += exchange.amount;
        *settled.entry(exchange.to.clone()).or_insert(0.0) -= exchange.amount;
    }
    settled
}

pub fn get_exchanges_from_group(group: &Group) -> Result<Vec<Exchange>, SplitError> {
    let balance = compute_balance_from_group(group)?;
    Ok(plan(&balance))
}

/// Turns an exchange into the record that marks it as paid.
///
/// The record credits `from` and debits `to` by the same amount, so once it
/// is stored the recomputed balances no longer suggest this exchange.
pub fn settlement_to_expense_record(
    exchange: &Exchange,
    id: impl Into<RecordId>,
    date: NaiveDate,
) -> ExpenseRecord {
    ExpenseRecord {
        id: id.into(),
        kind: RecordKind::Settlement,
        label: ExpenseLabel::Custom(format!("{} paid {}", exchange.from, exchange.to)),
        amount: exchange.amount,
        payer: exchange.from.clone(),
        split_method: SplitMethod::Equal,
        participants: vec![exchange.to.clone()],
        weights: None,
        custom_shares: None,
        date,
    }
}
