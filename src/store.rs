//! MongoDB-backed storage of groups. One document per group holds its roster,
//! tags and records. Errors are returned as they come from the driver.
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::error::StoreError;
use crate::schemas::{ExpenseRecord, ExpenseTag, Group, Participant};

const COLLECTION: &str = "Groups";

#[derive(Clone)]
pub struct GroupStore {
    groups: Collection<Group>,
}

impl GroupStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(&client, database))
    }

    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            groups: client.database(database).collection::<Group>(COLLECTION),
        }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let cursor = self.groups.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_group(&self, id: &str) -> Result<Group, StoreError> {
        self.groups
            .find_one(doc! { "id": id }, None)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("group {id}")))
    }

    pub async fn create_group(&self, id: &str, name: &str) -> Result<Group, StoreError> {
        if self.groups.find_one(doc! { "id": id }, None).await?.is_some() {
            return Err(StoreError::ExistingKey(format!("group {id}")));
        }
        let group = Group {
            id: id.to_string(),
            name: name.to_string(),
            participants: vec![],
            tags: vec![],
            expenses: vec![],
        };
        self.groups.insert_one(&group, None).await?;
        Ok(group)
    }

    pub async fn add_participant(
        &self,
        group_id: &str,
        participant: &Participant,
    ) -> Result<(), StoreError> {
        let participant = bson::to_bson(participant)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id },
                doc! { "$push": { "participants": participant } },
                None,
            )
            .await?;
        matched(result.matched_count, || format!("group {group_id}"))
    }

    pub async fn add_tag(&self, group_id: &str, tag: &ExpenseTag) -> Result<(), StoreError> {
        let tag = bson::to_bson(tag)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id },
                doc! { "$push": { "tags": tag } },
                None,
            )
            .await?;
        matched(result.matched_count, || format!("group {group_id}"))
    }

    pub async fn add_expense(
        &self,
        group_id: &str,
        expense: &ExpenseRecord,
    ) -> Result<(), StoreError> {
        let expense = bson::to_bson(expense)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id },
                doc! { "$push": { "expenses": expense } },
                None,
            )
            .await?;
        matched(result.matched_count, || format!("group {group_id}"))
    }

    /// Swaps the stored record with the same id for `expense`.
    pub async fn replace_expense(
        &self,
        group_id: &str,
        expense: &ExpenseRecord,
    ) -> Result<(), StoreError> {
        let expense_id = expense.id.as_str();
        let replacement = bson::to_bson(expense)?;
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id, "expenses.id": expense_id },
                doc! { "$set": { "expenses.$": replacement } },
                None,
            )
            .await?;
        matched(result.matched_count, || format!("expense {expense_id}"))
    }

    pub async fn delete_expense(&self, group_id: &str, expense_id: &str) -> Result<(), StoreError> {
        let result = self
            .groups
            .update_one(
                doc! { "id": group_id, "expenses.id": expense_id },
                doc! { "$pull": { "expenses": { "id": expense_id } } },
                None,
            )
            .await?;
        matched(result.matched_count, || format!("expense {expense_id}"))
    }
}

fn matched(count: u64, what: impl FnOnce() -> String) -> Result<(), StoreError> {
    if count == 0 {
        Err(StoreError::NotFound(what()))
    } else {
        Ok(())
    }
}
