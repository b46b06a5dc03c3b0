use crate::database::models::{CommentRecord, PostRecord, ReplyRecord};
use crate::database::repositories::{
    CommentRepository, EngagementRepository, NotificationRepository, PostRepository,
    ReplyRepository,
};
use crate::database::Database;
use crate::error::ServiceError;
use crate::notifications::{fan_out, FanOutEvent};
use crate::target::{NotificationKind, TargetKind, TargetRef};
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Posts and the comment/reply tree under them.
#[derive(Clone)]
pub struct ContentService {
    database: Database,
}

impl ContentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, input: CreatePostInput) -> Result<PostView> {
        require_text("author_id", &input.author_id)?;
        require_text("title", &input.title)?;
        require_text("body", &input.body)?;
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author_id: input.author_id,
            title: input.title,
            body: input.body,
            category: input.category,
            tags: input.tags,
            upvote_count: 0,
            downvote_count: 0,
            view_count: 0,
            bookmark_count: 0,
            repost_count: 0,
            comment_count: 0,
            created_at: now_utc_iso(),
            updated_at: None,
        };
        self.database
            .with_repositories(|repos| repos.posts().create(&record))?;
        tracing::info!(post_id = %record.id, author_id = %record.author_id, "post created");
        Ok(PostView::from_record(record))
    }

    pub fn get_post(&self, post_id: &str) -> Result<Option<PostView>> {
        let record = self.database.with_repositories(|repos| repos.posts().get(post_id))?;
        Ok(record.map(PostView::from_record))
    }

    /// Counts one page view and returns the post with the new count. Plain
    /// fetches through `get_post` leave `view_count` alone.
    pub fn view_post(&self, post_id: &str) -> Result<Option<PostView>> {
        let record = self.database.with_transaction(|repos| {
            let posts = repos.posts();
            if posts.get(post_id)?.is_none() {
                return Ok(None);
            }
            posts.increment_views(post_id)?;
            posts.get(post_id)
        })?;
        Ok(record.map(PostView::from_record))
    }

    pub fn edit_post(&self, post_id: &str, input: EditPostInput) -> Result<PostView> {
        let record = self.database.with_transaction(|repos| {
            let posts = repos.posts();
            let mut record = posts
                .get(post_id)?
                .ok_or_else(|| ServiceError::not_found(format!("post {post_id}")))?;
            if record.author_id != input.actor_id {
                return Err(
                    ServiceError::unauthorized(&input.actor_id, format!("post {post_id}")).into(),
                );
            }
            if let Some(title) = input.title {
                require_text("title", &title)?;
                record.title = title;
            }
            if let Some(body) = input.body {
                require_text("body", &body)?;
                record.body = body;
            }
            if let Some(category) = input.category {
                record.category = Some(category);
            }
            if let Some(tags) = input.tags {
                record.tags = tags;
            }
            record.updated_at = Some(now_utc_iso());
            posts.update_content(&record)?;
            Ok(record)
        })?;
        tracing::info!(post_id = %record.id, "post edited");
        Ok(PostView::from_record(record))
    }

    /// Removes a post together with its comments, replies, engagements and
    /// notifications.
    pub fn delete_post(&self, post_id: &str, actor_id: &str) -> Result<()> {
        self.database.with_transaction(|repos| {
            let posts = repos.posts();
            let record = posts
                .get(post_id)?
                .ok_or_else(|| ServiceError::not_found(format!("post {post_id}")))?;
            if record.author_id != actor_id {
                return Err(ServiceError::unauthorized(actor_id, format!("post {post_id}")).into());
            }
            posts.delete(post_id)?;
            Ok(())
        })?;
        tracing::info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    /// Flat comment and reply lists for a post, both in insertion order.
    pub fn discussion(&self, post_id: &str) -> Result<Option<Discussion>> {
        self.database.with_repositories(|repos| {
            if repos.posts().get(post_id)?.is_none() {
                return Ok(None);
            }
            let comments = repos
                .comments()
                .list_for_post(post_id)?
                .into_iter()
                .map(CommentView::from_record)
                .collect();
            let replies = repos
                .replies()
                .list_for_post(post_id)?
                .into_iter()
                .map(ReplyView::from_record)
                .collect();
            Ok(Some(Discussion { comments, replies }))
        })
    }

    /// Adds a comment and notifies the post's author. Submitting the same
    /// `comment_key` twice returns the first comment instead of a duplicate.
    pub fn create_comment(&self, input: CreateCommentInput) -> Result<CreatedContent> {
        require_text("author_id", &input.author_id)?;
        require_text("content", &input.content)?;
        let created = self.database.with_transaction(|repos| {
            let post = repos
                .posts()
                .get(&input.post_id)?
                .ok_or_else(|| ServiceError::not_found(format!("post {}", input.post_id)))?;

            if let Some(key) = input.comment_key.as_deref() {
                if let Some(existing) =
                    repos.comments().find_by_key(&post.id, &input.author_id, key)?
                {
                    return Ok(CreatedContent {
                        id: existing.id,
                        created: false,
                    });
                }
            }

            let now = now_utc_iso();
            let record = CommentRecord {
                id: Uuid::new_v4().to_string(),
                post_id: post.id.clone(),
                author_id: input.author_id.clone(),
                content: input.content.clone(),
                comment_key: input.comment_key.clone(),
                upvote_count: 0,
                downvote_count: 0,
                created_at: now,
                updated_at: None,
            };
            repos.comments().create(&record)?;
            repos.posts().adjust_comment_count(&post.id, 1)?;

            let target = TargetRef::comment(&record.id);
            fan_out(
                &repos,
                FanOutEvent {
                    kind: NotificationKind::Comment,
                    actor_id: &record.author_id,
                    recipient_id: &post.author_id,
                    target: &target,
                    post_id: &post.id,
                },
            )?;
            Ok(CreatedContent {
                id: record.id,
                created: true,
            })
        })?;
        tracing::info!(
            post_id = %input.post_id,
            comment_id = %created.id,
            created = created.created,
            "comment submitted"
        );
        Ok(created)
    }

    /// Adds a reply under a comment and notifies the comment's author.
    pub fn create_reply(&self, input: CreateReplyInput) -> Result<CreatedContent> {
        require_text("author_id", &input.author_id)?;
        require_text("content", &input.content)?;
        let created = self.database.with_transaction(|repos| {
            let comment = repos
                .comments()
                .get(&input.comment_id)?
                .ok_or_else(|| ServiceError::not_found(format!("comment {}", input.comment_id)))?;
            if comment.post_id != input.post_id {
                return Err(ServiceError::invalid(format!(
                    "comment {} does not belong to post {}",
                    comment.id, input.post_id
                ))
                .into());
            }

            let record = ReplyRecord {
                id: Uuid::new_v4().to_string(),
                comment_id: comment.id.clone(),
                post_id: comment.post_id.clone(),
                author_id: input.author_id.clone(),
                content: input.content.clone(),
                reply_to_id: input.reply_to_id.clone(),
                reply_to_author_id: input.reply_to_author_id.clone(),
                upvote_count: 0,
                downvote_count: 0,
                created_at: now_utc_iso(),
                updated_at: None,
            };
            repos.replies().create(&record)?;

            let target = TargetRef::reply(&record.id);
            fan_out(
                &repos,
                FanOutEvent {
                    kind: NotificationKind::Reply,
                    actor_id: &record.author_id,
                    recipient_id: &comment.author_id,
                    target: &target,
                    post_id: &comment.post_id,
                },
            )?;
            Ok(CreatedContent {
                id: record.id,
                created: true,
            })
        })?;
        tracing::info!(
            comment_id = %input.comment_id,
            reply_id = %created.id,
            "reply submitted"
        );
        Ok(created)
    }

    /// Removes a comment, its replies and everything that points at them.
    pub fn delete_comment(&self, comment_id: &str, actor_id: &str) -> Result<()> {
        self.database.with_transaction(|repos| {
            let comment = repos
                .comments()
                .get(comment_id)?
                .ok_or_else(|| ServiceError::not_found(format!("comment {comment_id}")))?;
            if comment.author_id != actor_id {
                return Err(
                    ServiceError::unauthorized(actor_id, format!("comment {comment_id}")).into(),
                );
            }
            let reply_ids = repos.replies().ids_for_comment(comment_id)?;
            let comment_ids = vec![comment.id.clone()];

            let engagements = repos.engagements();
            engagements.delete_for_targets(TargetKind::Reply, &reply_ids)?;
            engagements.delete_for_targets(TargetKind::Comment, &comment_ids)?;
            let notifications = repos.notifications();
            notifications.delete_for_targets(TargetKind::Reply, &reply_ids)?;
            notifications.delete_for_targets(TargetKind::Comment, &comment_ids)?;

            repos.comments().delete(comment_id)?;
            repos.posts().adjust_comment_count(&comment.post_id, -1)?;
            Ok(())
        })?;
        tracing::info!(comment_id = %comment_id, "comment deleted");
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{field} may not be empty")).into());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub author_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Author edit. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPostInput {
    pub actor_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub comment_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReplyInput {
    pub comment_id: String,
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
    /// False when an earlier submission with the same key was returned.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
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
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyView {
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
pub struct Discussion {
    pub comments: Vec<CommentView>,
    pub replies: Vec<ReplyView>,
}

impl PostView {
    fn from_record(record: PostRecord) -> Self {
        Self {
            id: record.id,
            author_id: record.author_id,
            title: record.title,
            body: record.body,
            category: record.category,
            tags: record.tags,
            upvote_count: record.upvote_count,
            downvote_count: record.downvote_count,
            view_count: record.view_count,
            bookmark_count: record.bookmark_count,
            repost_count: record.repost_count,
            comment_count: record.comment_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl CommentView {
    fn from_record(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            author_id: record.author_id,
            content: record.content,
            upvote_count: record.upvote_count,
            downvote_count: record.downvote_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl ReplyView {
    fn from_record(record: ReplyRecord) -> Self {
        Self {
            id: record.id,
            comment_id: record.comment_id,
            post_id: record.post_id,
            author_id: record.author_id,
            content: record.content,
            reply_to_id: record.reply_to_id,
            reply_to_author_id: record.reply_to_author_id,
            upvote_count: record.upvote_count,
            downvote_count: record.downvote_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
