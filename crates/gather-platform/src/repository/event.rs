//! Event Repository
//!
//! Document access for the event catalog, plus the aggregation behind
//! the admin registrations report.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
    Collection, Database,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Event;
use crate::error::Result;

/// One row of the flattened registrations report:
/// a single (event, registered user) pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReportRow {
    pub event_id: String,
    pub event_title: String,
    pub event_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_image: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    pub registration_date: String,
    pub event_creator: String,
}

/// Collection counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_events: u64,
    pub upcoming_events: u64,
    pub past_events: u64,
}

pub struct EventRepository {
    collection: Collection<Event>,
}

impl EventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("events"),
        }
    }

    pub async fn insert(&self, event: &Event) -> Result<()> {
        self.collection.insert_one(event).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// All events, date ascending.
    pub async fn find_all_by_date(&self) -> Result<Vec<Event>> {
        let options = FindOptions::builder().sort(doc! { "date": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_creator(&self, creator_id: &str) -> Result<Vec<Event>> {
        let options = FindOptions::builder().sort(doc! { "date": 1 }).build();
        let cursor = self
            .collection
            .find(doc! { "creator": creator_id })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, event: &Event) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &event.id }, event)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Pull a user out of every event's registration list.
    ///
    /// Two passes because entries exist in two shapes: the structured
    /// pair and the legacy bare reference.
    pub async fn pull_user_registrations(&self, user_id: &str) -> Result<()> {
        for (filter, update) in Self::registration_pull_ops(user_id) {
            self.collection.update_many(filter, update).await?;
        }
        Ok(())
    }

    /// The (filter, `$pull`) pairs covering both stored entry shapes.
    fn registration_pull_ops(user_id: &str) -> [(Document, Document); 2] {
        [
            (
                doc! { "registeredUsers.user": user_id },
                doc! { "$pull": { "registeredUsers": { "user": user_id } } },
            ),
            (
                doc! { "registeredUsers": user_id },
                doc! { "$pull": { "registeredUsers": user_id } },
            ),
        ]
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn dashboard_stats(&self, total_users: u64, now: DateTime<Utc>) -> Result<DashboardStats> {
        let now_bson = bson::DateTime::from_chrono(now);
        let total_events = self.count().await?;
        let upcoming_events = self
            .collection
            .count_documents(doc! { "date": { "$gt": now_bson } })
            .await?;
        let past_events = self
            .collection
            .count_documents(doc! { "date": { "$lte": now_bson } })
            .await?;
        Ok(DashboardStats {
            total_users,
            total_events,
            upcoming_events,
            past_events,
        })
    }

    /// Flattened registrations report: unwind each event's registration
    /// list and join user and creator display fields from the users
    /// collection. Rows whose user reference does not resolve (dangling
    /// or legacy-malformed entries) are dropped.
    pub async fn registrations_report(&self) -> Result<Vec<RegistrationReportRow>> {
        let pipeline = vec![
            doc! { "$unwind": "$registeredUsers" },
            doc! { "$lookup": {
                "from": "users",
                "localField": "registeredUsers.user",
                "foreignField": "_id",
                "as": "userInfo",
            } },
            doc! { "$lookup": {
                "from": "users",
                "localField": "creator",
                "foreignField": "_id",
                "as": "creatorInfo",
            } },
            doc! { "$project": {
                "eventId": "$_id",
                "eventTitle": "$title",
                "eventDate": "$date",
                "eventImage": "$image",
                "registrationDate": "$registeredUsers.registrationDate",
                "user": { "$arrayElemAt": ["$userInfo", 0] },
                "creator": { "$arrayElemAt": ["$creatorInfo", 0] },
            } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            if let Some(row) = Self::report_row(&document) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn report_row(document: &Document) -> Option<RegistrationReportRow> {
        let user = document.get_document("user").ok()?;
        let user_id = user.get_str("_id").ok()?.to_string();

        let creator_name = document
            .get_document("creator")
            .ok()
            .and_then(|c| c.get_str("name").ok())
            .unwrap_or("Unknown")
            .to_string();

        Some(RegistrationReportRow {
            event_id: document.get_str("eventId").ok()?.to_string(),
            event_title: document.get_str("eventTitle").ok()?.to_string(),
            event_date: document
                .get_datetime("eventDate")
                .map(|d| d.to_chrono().to_rfc3339())
                .ok()?,
            event_image: document.get_str("eventImage").ok().map(str::to_string),
            user_id,
            user_name: user.get_str("name").unwrap_or("Unknown User").to_string(),
            user_email: user.get_str("email").unwrap_or("").to_string(),
            user_image: user.get_str("profileImage").ok().map(str::to_string),
            registration_date: document
                .get_datetime("registrationDate")
                .map(|d| d.to_chrono().to_rfc3339())
                .ok()?,
            event_creator: creator_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistrationEntry;
    use mongodb::bson::{self, Bson};

    // Deleting a user must clear them from every event's registration
    // list. The two update passes have to line up with the two stored
    // entry shapes, or one form survives the cascade.
    #[test]
    fn pull_ops_cover_both_entry_shapes() {
        let user_id = "0123456789ABC";
        let [(pair_filter, pair_update), (legacy_filter, legacy_update)] =
            EventRepository::registration_pull_ops(user_id);

        // Structured pair: serializes as a subdocument with a `user`
        // key, matched by the dotted filter and embedded-doc pull.
        let pair = bson::to_bson(&RegistrationEntry::registration(user_id, chrono::Utc::now()))
            .unwrap();
        let pair_doc = pair.as_document().expect("pair entry serializes as a document");
        assert_eq!(pair_doc.get_str("user").unwrap(), user_id);
        assert_eq!(pair_filter, doc! { "registeredUsers.user": user_id });
        assert_eq!(
            pair_update,
            doc! { "$pull": { "registeredUsers": { "user": user_id } } }
        );

        // Legacy entry: serializes as a bare string, matched by the
        // scalar filter and scalar pull.
        let legacy = bson::to_bson(&RegistrationEntry::LegacyRef(user_id.to_string())).unwrap();
        assert_eq!(legacy, Bson::String(user_id.to_string()));
        assert_eq!(legacy_filter, doc! { "registeredUsers": user_id });
        assert_eq!(legacy_update, doc! { "$pull": { "registeredUsers": user_id } });
    }

    #[test]
    fn pull_ops_are_scoped_to_the_user() {
        let [(pair_filter, _), (legacy_filter, _)] =
            EventRepository::registration_pull_ops("userA");
        assert_eq!(pair_filter.get_str("registeredUsers.user").unwrap(), "userA");
        assert_eq!(legacy_filter.get_str("registeredUsers").unwrap(), "userA");
    }
}
