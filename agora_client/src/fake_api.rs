//! In-memory `ContentApi` for unit tests. Mirrors the server's toggle and
//! fan-out rules closely enough for session-level assertions.

use crate::api::{ClientError, ContentApi};
use crate::models::{
    CommentView, CreateCommentRequest, CreatePostRequest, CreateReplyRequest, CreatedContent,
    Discussion, EditPostRequest, EngagementKind, EngagementMap, NotificationItem,
    NotificationKind, PostView, ReplyView, TargetCounters, TargetKind, TargetRef,
    ToggleEngagementRequest, ToggleOutcome, ViewerEngagementState, ViewerStateRequest,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

type EngagementKey = (TargetKind, String, String, EngagementKind);

#[derive(Default)]
pub(crate) struct FakeState {
    pub posts: Vec<PostView>,
    pub comments: Vec<CommentView>,
    pub replies: Vec<ReplyView>,
    pub engagements: HashSet<EngagementKey>,
    pub notifications: Vec<NotificationItem>,
    pub comment_keys: HashMap<(String, String), String>,
    /// Operation names, in call order.
    pub calls: Vec<&'static str>,
    pub mark_read_calls: Vec<Vec<String>>,
    /// Operations that should fail with a 500.
    pub failing: HashSet<&'static str>,
    /// Operations that take effect but answer with a 504.
    pub lost_responses: HashSet<&'static str>,
    next_id: usize,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn seed_post(&self, id: &str, author: &str) {
        let mut state = self.state();
        state.posts.push(PostView {
            id: id.into(),
            author_id: author.into(),
            title: "Title".into(),
            body: "Body".into(),
            category: None,
            tags: Vec::new(),
            upvote_count: 0,
            downvote_count: 0,
            view_count: 0,
            bookmark_count: 0,
            repost_count: 0,
            comment_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        });
    }

    pub fn seed_comment(&self, id: &str, post_id: &str, author: &str) {
        let mut state = self.state();
        state.comments.push(CommentView {
            id: id.into(),
            post_id: post_id.into(),
            author_id: author.into(),
            content: format!("comment {id}"),
            upvote_count: 0,
            downvote_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        });
        if let Some(post) = state.posts.iter_mut().find(|post| post.id == post_id) {
            post.comment_count += 1;
        }
    }

    pub fn seed_reply(&self, id: &str, comment_id: &str, post_id: &str, author: &str) {
        self.state().replies.push(ReplyView {
            id: id.into(),
            comment_id: comment_id.into(),
            post_id: post_id.into(),
            author_id: author.into(),
            content: format!("reply {id}"),
            reply_to_id: None,
            reply_to_author_id: None,
            upvote_count: 0,
            downvote_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        });
    }

    pub fn fail(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    pub fn lose_response(&self, operation: &'static str) {
        self.state().lost_responses.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        let mut state = self.state();
        state.failing.remove(operation);
        state.lost_responses.remove(operation);
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|call| **call == operation).count()
    }

    fn begin(&self, operation: &'static str) -> Result<MutexGuard<'_, FakeState>, ClientError> {
        let mut state = self.state();
        state.calls.push(operation);
        if state.failing.contains(operation) {
            return Err(ClientError::Status {
                status: 500,
                message: "internal server error".into(),
            });
        }
        Ok(state)
    }
}

fn not_found(what: String) -> ClientError {
    ClientError::Status {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn bad_request(message: &str) -> ClientError {
    ClientError::Status {
        status: 400,
        message: message.into(),
    }
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn author_of(&self, target: &TargetRef) -> Option<String> {
        match target.kind {
            TargetKind::Post => self
                .posts
                .iter()
                .find(|p| p.id == target.id)
                .map(|p| p.author_id.clone()),
            TargetKind::Comment => self
                .comments
                .iter()
                .find(|c| c.id == target.id)
                .map(|c| c.author_id.clone()),
            TargetKind::Reply => self
                .replies
                .iter()
                .find(|r| r.id == target.id)
                .map(|r| r.author_id.clone()),
        }
    }

    fn post_id_of(&self, target: &TargetRef) -> String {
        match target.kind {
            TargetKind::Post => target.id.clone(),
            TargetKind::Comment => self
                .comments
                .iter()
                .find(|c| c.id == target.id)
                .map(|c| c.post_id.clone())
                .unwrap_or_default(),
            TargetKind::Reply => self
                .replies
                .iter()
                .find(|r| r.id == target.id)
                .map(|r| r.post_id.clone())
                .unwrap_or_default(),
        }
    }

    fn adjust(&mut self, target: &TargetRef, kind: EngagementKind, delta: i64) {
        fn bump(counter: &mut i64, delta: i64) {
            *counter = (*counter + delta).max(0);
        }
        match target.kind {
            TargetKind::Post => {
                if let Some(post) = self.posts.iter_mut().find(|p| p.id == target.id) {
                    match kind {
                        EngagementKind::Upvote => bump(&mut post.upvote_count, delta),
                        EngagementKind::Downvote => bump(&mut post.downvote_count, delta),
                        EngagementKind::Bookmark => bump(&mut post.bookmark_count, delta),
                        EngagementKind::Repost => bump(&mut post.repost_count, delta),
                    }
                }
            }
            TargetKind::Comment => {
                if let Some(comment) = self.comments.iter_mut().find(|c| c.id == target.id) {
                    match kind {
                        EngagementKind::Upvote => bump(&mut comment.upvote_count, delta),
                        _ => bump(&mut comment.downvote_count, delta),
                    }
                }
            }
            TargetKind::Reply => {
                if let Some(reply) = self.replies.iter_mut().find(|r| r.id == target.id) {
                    match kind {
                        EngagementKind::Upvote => bump(&mut reply.upvote_count, delta),
                        _ => bump(&mut reply.downvote_count, delta),
                    }
                }
            }
        }
    }

    fn counters(&self, target: &TargetRef) -> TargetCounters {
        match target.kind {
            TargetKind::Post => self
                .posts
                .iter()
                .find(|p| p.id == target.id)
                .map(|p| TargetCounters {
                    upvote_count: p.upvote_count,
                    downvote_count: p.downvote_count,
                    bookmark_count: p.bookmark_count,
                    repost_count: p.repost_count,
                })
                .unwrap_or_default(),
            TargetKind::Comment => self
                .comments
                .iter()
                .find(|c| c.id == target.id)
                .map(|c| TargetCounters {
                    upvote_count: c.upvote_count,
                    downvote_count: c.downvote_count,
                    ..TargetCounters::default()
                })
                .unwrap_or_default(),
            TargetKind::Reply => self
                .replies
                .iter()
                .find(|r| r.id == target.id)
                .map(|r| TargetCounters {
                    upvote_count: r.upvote_count,
                    downvote_count: r.downvote_count,
                    ..TargetCounters::default()
                })
                .unwrap_or_default(),
        }
    }

    fn map_for(&self, kind: TargetKind, id: &str, viewer: &str) -> EngagementMap {
        let has = |engagement: EngagementKind| {
            self.engagements
                .contains(&(kind, id.to_string(), viewer.to_string(), engagement))
        };
        let post_only = |engagement| (kind == TargetKind::Post).then(|| has(engagement));
        EngagementMap {
            upvote: has(EngagementKind::Upvote),
            downvote: has(EngagementKind::Downvote),
            bookmark: post_only(EngagementKind::Bookmark),
            repost: post_only(EngagementKind::Repost),
        }
    }

    fn notify(
        &mut self,
        kind: NotificationKind,
        actor: &str,
        recipient: &str,
        target: TargetRef,
    ) -> Option<String> {
        if actor == recipient {
            return None;
        }
        let id = self.next_id("n");
        let post_id = self.post_id_of(&target);
        self.notifications.insert(
            0,
            NotificationItem {
                id: id.clone(),
                kind,
                actor_id: actor.into(),
                recipient_id: recipient.into(),
                target,
                post_id,
                is_read: false,
                created_at: "2024-01-01T00:00:00Z".into(),
            },
        );
        Some(id)
    }
}

#[async_trait]
impl ContentApi for FakeApi {
    async fn create_post(&self, input: &CreatePostRequest) -> Result<PostView, ClientError> {
        let id = self.begin("create_post")?.next_id("p");
        self.seed_post(&id, &input.author_id);
        self.get_post(&id).await
    }

    async fn get_post(&self, post_id: &str) -> Result<PostView, ClientError> {
        let state = self.begin("get_post")?;
        state
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .cloned()
            .ok_or_else(|| not_found(format!("post {post_id}")))
    }

    async fn record_view(&self, post_id: &str) -> Result<PostView, ClientError> {
        let mut state = self.begin("record_view")?;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == post_id)
            .ok_or_else(|| not_found(format!("post {post_id}")))?;
        post.view_count += 1;
        Ok(post.clone())
    }

    async fn edit_post(
        &self,
        post_id: &str,
        input: &EditPostRequest,
    ) -> Result<PostView, ClientError> {
        let mut state = self.begin("edit_post")?;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == post_id)
            .ok_or_else(|| not_found(format!("post {post_id}")))?;
        if post.author_id != input.actor_id {
            return Err(ClientError::Status {
                status: 403,
                message: "not the author".into(),
            });
        }
        if let Some(title) = &input.title {
            post.title = title.clone();
        }
        if let Some(body) = &input.body {
            post.body = body.clone();
        }
        Ok(post.clone())
    }

    async fn get_discussion(&self, post_id: &str) -> Result<Discussion, ClientError> {
        let state = self.begin("get_discussion")?;
        Ok(Discussion {
            comments: state.comments.iter().filter(|c| c.post_id == post_id).cloned().collect(),
            replies: state.replies.iter().filter(|r| r.post_id == post_id).cloned().collect(),
        })
    }

    async fn create_comment(
        &self,
        post_id: &str,
        input: &CreateCommentRequest,
    ) -> Result<CreatedContent, ClientError> {
        let mut state = self.begin("create_comment")?;
        let post_author = state
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.author_id.clone())
            .ok_or_else(|| not_found(format!("post {post_id}")))?;
        if let Some(key) = &input.comment_key {
            let compose = (input.author_id.clone(), key.clone());
            if let Some(existing) = state.comment_keys.get(&compose) {
                return Ok(CreatedContent {
                    id: existing.clone(),
                    created: false,
                });
            }
        }
        let id = state.next_id("c");
        if let Some(key) = &input.comment_key {
            state
                .comment_keys
                .insert((input.author_id.clone(), key.clone()), id.clone());
        }
        state.comments.push(CommentView {
            id: id.clone(),
            post_id: post_id.into(),
            author_id: input.author_id.clone(),
            content: input.content.clone(),
            upvote_count: 0,
            downvote_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        });
        if let Some(post) = state.posts.iter_mut().find(|post| post.id == post_id) {
            post.comment_count += 1;
        }
        state.notify(
            NotificationKind::Comment,
            &input.author_id,
            &post_author,
            TargetRef::comment(id.as_str()),
        );
        if state.lost_responses.contains("create_comment") {
            return Err(ClientError::Status {
                status: 504,
                message: "gateway timeout".into(),
            });
        }
        Ok(CreatedContent { id, created: true })
    }

    async fn create_reply(
        &self,
        comment_id: &str,
        input: &CreateReplyRequest,
    ) -> Result<CreatedContent, ClientError> {
        let mut state = self.begin("create_reply")?;
        let comment = state
            .comments
            .iter()
            .find(|comment| comment.id == comment_id)
            .cloned()
            .ok_or_else(|| not_found(format!("comment {comment_id}")))?;
        if comment.post_id != input.post_id {
            return Err(bad_request("comment does not belong to post"));
        }
        let id = state.next_id("r");
        state.notify(
            NotificationKind::Reply,
            &input.author_id,
            &comment.author_id,
            TargetRef::reply(id.as_str()),
        );
        state.replies.push(ReplyView {
            id: id.clone(),
            comment_id: comment_id.into(),
            post_id: comment.post_id.clone(),
            author_id: input.author_id.clone(),
            content: input.content.clone(),
            reply_to_id: input.reply_to_id.clone(),
            reply_to_author_id: input.reply_to_author_id.clone(),
            upvote_count: 0,
            downvote_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        });
        Ok(CreatedContent { id, created: true })
    }

    async fn toggle_engagement(
        &self,
        input: &ToggleEngagementRequest,
    ) -> Result<ToggleOutcome, ClientError> {
        let mut state = self.begin("toggle_engagement")?;
        let target = input.target.clone();
        let author = state
            .author_of(&target)
            .ok_or_else(|| not_found(format!("{} {}", target.kind, target.id)))?;
        if author != input.recipient_id {
            return Err(bad_request("recipient is not the target's author"));
        }
        let post_only = matches!(input.kind, EngagementKind::Bookmark | EngagementKind::Repost);
        if post_only && target.kind != TargetKind::Post {
            return Err(bad_request("bookmark and repost apply to posts only"));
        }

        let key = (target.kind, target.id.clone(), input.actor_id.clone(), input.kind);
        let active = if state.engagements.remove(&key) {
            state.adjust(&target, input.kind, -1);
            false
        } else {
            let opposing = match input.kind {
                EngagementKind::Upvote => Some(EngagementKind::Downvote),
                EngagementKind::Downvote => Some(EngagementKind::Upvote),
                _ => None,
            };
            if let Some(opposing) = opposing {
                let opposing_key =
                    (target.kind, target.id.clone(), input.actor_id.clone(), opposing);
                if state.engagements.remove(&opposing_key) {
                    state.adjust(&target, opposing, -1);
                }
            }
            state.engagements.insert(key);
            state.adjust(&target, input.kind, 1);
            true
        };

        let notification_id = if active {
            let kind = match input.kind {
                EngagementKind::Upvote => NotificationKind::Upvote,
                EngagementKind::Downvote => NotificationKind::Downvote,
                EngagementKind::Bookmark => NotificationKind::Bookmark,
                EngagementKind::Repost => NotificationKind::Repost,
            };
            state.notify(kind, &input.actor_id, &input.recipient_id, target.clone())
        } else {
            None
        };

        let counters = state.counters(&target);
        Ok(ToggleOutcome {
            state: state.map_for(target.kind, &target.id, &input.actor_id),
            kind: input.kind,
            active,
            score: counters.upvote_count - counters.downvote_count,
            counters,
            notification_id,
            target,
        })
    }

    async fn viewer_state(
        &self,
        request: &ViewerStateRequest,
    ) -> Result<ViewerEngagementState, ClientError> {
        let state = self.begin("viewer_state")?;
        if !state.posts.iter().any(|post| post.id == request.post_id) {
            return Err(not_found(format!("post {}", request.post_id)));
        }
        Ok(ViewerEngagementState {
            post: state.map_for(TargetKind::Post, &request.post_id, &request.viewer_id),
            comments: request
                .comment_ids
                .iter()
                .map(|id| (id.clone(), state.map_for(TargetKind::Comment, id, &request.viewer_id)))
                .collect(),
            replies: request
                .reply_ids
                .iter()
                .map(|id| (id.clone(), state.map_for(TargetKind::Reply, id, &request.viewer_id)))
                .collect(),
        })
    }

    async fn list_notifications(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<NotificationItem>, ClientError> {
        let state = self.begin("list_notifications")?;
        Ok(state
            .notifications
            .iter()
            .filter(|item| item.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize, ClientError> {
        let mut state = self.state();
        state.calls.push("mark_read");
        state.mark_read_calls.push(ids.to_vec());
        if state.failing.contains("mark_read") {
            return Err(ClientError::Status {
                status: 500,
                message: "internal server error".into(),
            });
        }
        let mut updated = 0;
        for item in state.notifications.iter_mut() {
            if item.recipient_id == recipient_id && !item.is_read && ids.contains(&item.id) {
                item.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}
