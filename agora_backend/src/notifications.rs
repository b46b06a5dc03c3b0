//! Notification fan-out and read-state.
//!
//! Notifications are written in the same transaction as the event that
//! caused them. Read-state only moves forward: `mark_read` flips unread rows
//! and never touches rows that are already read.

use crate::database::models::NotificationRecord;
use crate::database::repositories::{NotificationRepository, SqliteRepositories};
use crate::database::Database;
use crate::error::ServiceError;
use crate::target::{NotificationKind, TargetKind, TargetRef};
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;
pub const MAX_NOTIFICATION_LIMIT: usize = 200;

/// Something another actor did to content owned by `recipient_id`.
#[derive(Debug, Clone)]
pub struct FanOutEvent<'a> {
    pub kind: NotificationKind,
    pub actor_id: &'a str,
    pub recipient_id: &'a str,
    pub target: &'a TargetRef,
    pub post_id: &'a str,
}

/// Records the notification for `event`. Acting on your own content is not
/// news, so self-directed events produce nothing.
pub(crate) fn fan_out(
    repos: &SqliteRepositories<'_>,
    event: FanOutEvent<'_>,
) -> Result<Option<NotificationItem>> {
    if event.actor_id == event.recipient_id {
        tracing::debug!(
            actor_id = %event.actor_id,
            kind = event.kind.as_str(),
            "skipping self-directed notification"
        );
        return Ok(None);
    }
    let record = NotificationRecord {
        id: Uuid::new_v4().to_string(),
        kind: event.kind.as_str().to_string(),
        actor_id: event.actor_id.to_string(),
        recipient_id: event.recipient_id.to_string(),
        target_type: event.target.kind.as_str().to_string(),
        target_id: event.target.id.clone(),
        post_id: event.post_id.to_string(),
        is_read: false,
        created_at: now_utc_iso(),
    };
    repos.notifications().create(&record)?;
    tracing::debug!(
        notification_id = %record.id,
        recipient_id = %record.recipient_id,
        kind = %record.kind,
        "notification recorded"
    );
    NotificationItem::from_record(record).map(Some)
}

#[derive(Clone)]
pub struct NotificationService {
    database: Database,
}

impl NotificationService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list(&self, recipient_id: &str, limit: Option<usize>) -> Result<Vec<NotificationItem>> {
        let limit = limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, MAX_NOTIFICATION_LIMIT);
        let records = self.database.with_repositories(|repos| {
            repos.notifications().list_for_recipient(recipient_id, limit)
        })?;
        records.into_iter().map(NotificationItem::from_record).collect()
    }

    /// Marks the given notifications as read for `recipient_id`. Ids that
    /// belong to someone else, do not exist, or are already read are left
    /// alone, so repeating the call is harmless.
    pub fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize> {
        if recipient_id.trim().is_empty() {
            return Err(ServiceError::invalid("recipient_id may not be empty").into());
        }
        let updated = self
            .database
            .with_repositories(|repos| repos.notifications().mark_read(recipient_id, ids))?;
        tracing::info!(
            recipient_id = %recipient_id,
            requested = ids.len(),
            updated,
            "notifications marked read"
        );
        Ok(updated)
    }

    pub fn unread_count(&self, recipient_id: &str) -> Result<usize> {
        self.database
            .with_repositories(|repos| repos.notifications().count_unread(recipient_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub actor_id: String,
    pub recipient_id: String,
    pub target: TargetRef,
    pub post_id: String,
    pub is_read: bool,
    pub created_at: String,
}

impl NotificationItem {
    fn from_record(record: NotificationRecord) -> Result<Self> {
        let kind = record
            .kind
            .parse::<NotificationKind>()
            .with_context(|| format!("notification {} has unknown kind", record.id))?;
        let target_kind = record
            .target_type
            .parse::<TargetKind>()
            .with_context(|| format!("notification {} has unknown target type", record.id))?;
        Ok(Self {
            id: record.id,
            kind,
            actor_id: record.actor_id,
            recipient_id: record.recipient_id,
            target: TargetRef::new(record.target_id, target_kind),
            post_id: record.post_id,
            is_read: record.is_read,
            created_at: record.created_at,
        })
    }
}
