//! Identifiers shared by engagements and notifications.
//!
//! Content is always addressed by a `(id, type)` pair so that a post, a
//! comment and a reply that happen to share an id can never be confused.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

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

impl FromStr for TargetKind {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Post" => Ok(TargetKind::Post),
            "Comment" => Ok(TargetKind::Comment),
            "Reply" => Ok(TargetKind::Reply),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown target type {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
}

impl TargetRef {
    pub fn new(id: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn post(id: impl Into<String>) -> Self {
        Self::new(id, TargetKind::Post)
    }

    pub fn comment(id: impl Into<String>) -> Self {
        Self::new(id, TargetKind::Comment)
    }

    pub fn reply(id: impl Into<String>) -> Self {
        Self::new(id, TargetKind::Reply)
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
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::Upvote => "upvote",
            EngagementKind::Downvote => "downvote",
            EngagementKind::Bookmark => "bookmark",
            EngagementKind::Repost => "repost",
        }
    }

    /// Bookmarks and reposts only exist on posts.
    pub fn applies_to(&self, kind: TargetKind) -> bool {
        match self {
            EngagementKind::Upvote | EngagementKind::Downvote => true,
            EngagementKind::Bookmark | EngagementKind::Repost => kind == TargetKind::Post,
        }
    }

    /// The vote that is retracted when this one is cast.
    pub fn opposing_vote(&self) -> Option<EngagementKind> {
        match self {
            EngagementKind::Upvote => Some(EngagementKind::Downvote),
            EngagementKind::Downvote => Some(EngagementKind::Upvote),
            EngagementKind::Bookmark | EngagementKind::Repost => None,
        }
    }

    /// Name of the denormalized counter column on the target row.
    pub(crate) fn counter_column(&self) -> &'static str {
        match self {
            EngagementKind::Upvote => "upvote_count",
            EngagementKind::Downvote => "downvote_count",
            EngagementKind::Bookmark => "bookmark_count",
            EngagementKind::Repost => "repost_count",
        }
    }
}

impl FromStr for EngagementKind {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "upvote" => Ok(EngagementKind::Upvote),
            "downvote" => Ok(EngagementKind::Downvote),
            "bookmark" => Ok(EngagementKind::Bookmark),
            "repost" => Ok(EngagementKind::Repost),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown engagement kind {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Upvote,
    Downvote,
    Comment,
    Reply,
    Repost,
    Bookmark,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Upvote => "upvote",
            NotificationKind::Downvote => "downvote",
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
            NotificationKind::Repost => "repost",
            NotificationKind::Bookmark => "bookmark",
        }
    }
}

impl From<EngagementKind> for NotificationKind {
    fn from(kind: EngagementKind) -> Self {
        match kind {
            EngagementKind::Upvote => NotificationKind::Upvote,
            EngagementKind::Downvote => NotificationKind::Downvote,
            EngagementKind::Bookmark => NotificationKind::Bookmark,
            EngagementKind::Repost => NotificationKind::Repost,
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "upvote" => Ok(NotificationKind::Upvote),
            "downvote" => Ok(NotificationKind::Downvote),
            "comment" => Ok(NotificationKind::Comment),
            "reply" => Ok(NotificationKind::Reply),
            "repost" => Ok(NotificationKind::Repost),
            "bookmark" => Ok(NotificationKind::Bookmark),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown notification type {other}"
            ))),
        }
    }
}
