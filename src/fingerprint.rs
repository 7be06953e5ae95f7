use sha2::{Digest, Sha256};

use crate::schemas::{ExpenseRecord, Participant};

/// Hex SHA-256 over the full serialized roster and records.
///
/// Any edit to any field changes the key, so it is safe to cache balances
/// and settlements under it.
pub fn content_key(
    participants: &[Participant],
    records: &[ExpenseRecord],
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(participants)?);
    hasher.update(serde_json::to_vec(records)?);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{ExpenseLabel, RecordKind, SplitMethod};
    use chrono::NaiveDate;

    fn fixtures() -> (Vec<Participant>, Vec<ExpenseRecord>) {
        let participants = vec![
            Participant {
                id: "a".to_string(),
                name: "Ann".to_string(),
            },
            Participant {
                id: "b".to_string(),
                name: "Ben".to_string(),
            },
        ];
        let records = vec![ExpenseRecord {
            id: "e1".to_string(),
            kind: RecordKind::Expense,
            label: ExpenseLabel::Custom("Nets".to_string()),
            amount: 18.0,
            payer: "a".to_string(),
            split_method: SplitMethod::Equal,
            participants: vec!["a".to_string(), "b".to_string()],
            weights: None,
            custom_shares: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }];
        (participants, records)
    }

    #[test]
    fn same_content_same_key() {
        let (participants, records) = fixtures();

        let key = content_key(&participants, &records).unwrap();

        assert_eq!(key.len(), 64);
        assert_eq!(key, content_key(&participants, &records.clone()).unwrap());
    }

    #[test]
    fn edit_that_keeps_the_size_changes_the_key() {
        let (participants, mut records) = fixtures();
        let before = content_key(&participants, &records).unwrap();

        records[0].amount = 19.0;

        assert_ne!(before, content_key(&participants, &records).unwrap());
    }
}
