//! User Repository

use futures::TryStreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::domain::User;
use crate::error::Result;

/// Projection of a user down to display fields, used when resolving
/// registration and creator references for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count = self
            .collection
            .count_documents(doc! { "email": email })
            .await?;
        Ok(count > 0)
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &user.id }, user)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Resolve display fields for a set of user IDs.
    pub async fn find_summaries(&self, ids: &[String]) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .clone_with_type::<UserSummary>()
            .find(doc! { "_id": { "$in": ids } })
            .projection(doc! { "name": 1, "email": 1, "phone": 1, "profileImage": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Idempotent set-insert into `registeredEvents`.
    pub async fn add_registered_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "registeredEvents": event_id } },
            )
            .await?;
        Ok(())
    }

    /// Idempotent set-insert into `favoriteEvents`.
    pub async fn add_favorite(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "favoriteEvents": event_id } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Idempotent set-removal from `favoriteEvents`.
    pub async fn remove_favorite(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$pull": { "favoriteEvents": event_id } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
