mod comments;
mod engagements;
mod notifications;
mod posts;
mod replies;

use super::models::{
    CommentRecord, EngagementRecord, NotificationRecord, PostRecord, ReplyRecord,
    TargetCounters, TargetOwnership,
};
use crate::target::{EngagementKind, TargetKind, TargetRef};
use anyhow::Result;
use rusqlite::Connection;

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn update_content(&self, record: &PostRecord) -> Result<()>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn increment_views(&self, id: &str) -> Result<()>;
    fn adjust_comment_count(&self, id: &str, delta: i64) -> Result<()>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<CommentRecord>>;
    fn find_by_key(
        &self,
        post_id: &str,
        author_id: &str,
        comment_key: &str,
    ) -> Result<Option<CommentRecord>>;
    /// Comments of a post in insertion order.
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait ReplyRepository {
    fn create(&self, record: &ReplyRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ReplyRecord>>;
    /// Replies of every comment on a post in insertion order.
    fn list_for_post(&self, post_id: &str) -> Result<Vec<ReplyRecord>>;
    fn ids_for_comment(&self, comment_id: &str) -> Result<Vec<String>>;
}

pub trait EngagementRepository {
    fn exists(&self, target: &TargetRef, actor_id: &str, kind: EngagementKind) -> Result<bool>;
    fn insert(&self, record: &EngagementRecord) -> Result<()>;
    /// Returns whether a row was removed.
    fn remove(&self, target: &TargetRef, actor_id: &str, kind: EngagementKind) -> Result<bool>;
    /// Every engagement the actor holds on the post or anything under it.
    fn list_for_actor_in_post(&self, actor_id: &str, post_id: &str)
        -> Result<Vec<EngagementRecord>>;
    fn delete_for_targets(&self, kind: TargetKind, target_ids: &[String]) -> Result<()>;
    /// Looks the target up in the table named by its kind.
    fn resolve(&self, target: &TargetRef) -> Result<Option<TargetOwnership>>;
    fn counters(&self, target: &TargetRef) -> Result<TargetCounters>;
    /// Adds `delta` to the counter, never letting it drop below zero.
    fn adjust_counter(&self, target: &TargetRef, kind: EngagementKind, delta: i64) -> Result<()>;
}

pub trait NotificationRepository {
    fn create(&self, record: &NotificationRecord) -> Result<()>;
    /// Newest first.
    fn list_for_recipient(&self, recipient_id: &str, limit: usize)
        -> Result<Vec<NotificationRecord>>;
    /// Flips only unread rows owned by the recipient; returns how many changed.
    fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize>;
    fn count_unread(&self, recipient_id: &str) -> Result<usize>;
    fn delete_for_targets(&self, kind: TargetKind, target_ids: &[String]) -> Result<()>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn replies(&self) -> impl ReplyRepository + '_ {
        replies::SqliteReplyRepository { conn: self.conn }
    }

    pub fn engagements(&self) -> impl EngagementRepository + '_ {
        engagements::SqliteEngagementRepository { conn: self.conn }
    }

    pub fn notifications(&self) -> impl NotificationRepository + '_ {
        notifications::SqliteNotificationRepository { conn: self.conn }
    }
}

/// Table holding rows of the given target kind.
pub(crate) fn table_for(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Post => "posts",
        TargetKind::Comment => "comments",
        TargetKind::Reply => "replies",
    }
}

/// `?1, ?2, ...` placeholders for an `IN (...)` clause starting at `first`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}
