//! Startup Index Creation

use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};
use tracing::info;

use crate::domain::{Event, User};
use crate::error::Result;

/// Create the indexes the platform relies on. Safe to call on every
/// startup; MongoDB treats matching definitions as a no-op.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let users = db.collection::<User>("users");
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    let events = db.collection::<Event>("events");
    events
        .create_index(IndexModel::builder().keys(doc! { "date": 1 }).build())
        .await?;
    events
        .create_index(IndexModel::builder().keys(doc! { "creator": 1 }).build())
        .await?;

    info!("Indexes ensured");
    Ok(())
}
