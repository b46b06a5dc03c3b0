use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub view_count: i64,
    pub bookmark_count: i64,
    pub repost_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    /// Client-chosen key that makes comment submission idempotent per author.
    pub comment_key: Option<String>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: String,
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub reply_to_id: Option<String>,
    pub reply_to_author_id: Option<String>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub target_type: String,
    pub target_id: String,
    pub actor_id: String,
    pub kind: String,
    pub post_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub kind: String,
    pub actor_id: String,
    pub recipient_id: String,
    pub target_type: String,
    pub target_id: String,
    pub post_id: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Counters shared by every target kind. Bookmark and repost counts are
/// only tracked on posts and read as zero elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCounters {
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub bookmark_count: i64,
    pub repost_count: i64,
}

/// Where a target lives and who owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOwnership {
    pub author_id: String,
    pub post_id: String,
}
