use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Post,
    Comment,
    Reply,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Post => "Post",
            TargetKind::Comment => "Comment",
            TargetKind::Reply => "Reply",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
}

impl TargetRef {
    pub fn post(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetKind::Post,
        }
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetKind::Comment,
        }
    }

    pub fn reply(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: TargetKind::Reply,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    Upvote,
    Downvote,
    Bookmark,
    Repost,
}

impl EngagementKind {
    pub const ALL: [EngagementKind; 4] = [
        EngagementKind::Upvote,
        EngagementKind::Downvote,
        EngagementKind::Bookmark,
        EngagementKind::Repost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Upvote => "upvote",
            EngagementKind::Downvote => "downvote",
            EngagementKind::Bookmark => "bookmark",
            EngagementKind::Repost => "repost",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Upvote,
    Downvote,
    Comment,
    Reply,
    Repost,
    Bookmark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub view_count: i64,
    pub bookmark_count: i64,
    pub repost_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyView {
    pub id: String,
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub reply_to_id: Option<String>,
    #[serde(default)]
    pub reply_to_author_id: Option<String>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    #[serde(default)]
    pub comments: Vec<CommentView>,
    #[serde(default)]
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    pub post: PostView,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreatePostRequest {
    pub author_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditPostRequest {
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub comment_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReplyRequest {
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub reply_to_id: Option<String>,
    #[serde(default)]
    pub reply_to_author_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedContent {
    pub id: String,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCounters {
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub bookmark_count: i64,
    pub repost_count: i64,
}

/// One viewer's engagement with one target. `bookmark` and `repost` are
/// only reported for posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMap {
    #[serde(default)]
    pub upvote: bool,
    #[serde(default)]
    pub downvote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repost: Option<bool>,
}

impl EngagementMap {
    pub fn is_active(&self, kind: EngagementKind) -> bool {
        match kind {
            EngagementKind::Upvote => self.upvote,
            EngagementKind::Downvote => self.downvote,
            EngagementKind::Bookmark => self.bookmark.unwrap_or(false),
            EngagementKind::Repost => self.repost.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerStateRequest {
    pub post_id: String,
    pub viewer_id: String,
    pub comment_ids: Vec<String>,
    pub reply_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerEngagementState {
    #[serde(default)]
    pub post: EngagementMap,
    #[serde(default)]
    pub comments: HashMap<String, EngagementMap>,
    #[serde(default)]
    pub replies: HashMap<String, EngagementMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEngagementRequest {
    pub actor_id: String,
    pub recipient_id: String,
    pub target: TargetRef,
    pub kind: EngagementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub target: TargetRef,
    pub kind: EngagementKind,
    pub active: bool,
    pub state: EngagementMap,
    pub counters: TargetCounters,
    pub score: i64,
    #[serde(default)]
    pub notification_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Serialize)]
pub struct MarkReadRequest<'a> {
    pub recipient_id: &'a str,
    pub ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
