use crate::api::{ClientError, ContentApi};
use crate::config::ClientConfig;
use crate::content_tree::ContentTree;
use crate::continuation::{self, ContinuationGuard, PendingContinuation};
use crate::engagement_cache::{EngagementCache, VoteDisplay};
use crate::models::{
    CreateCommentRequest, CreateReplyRequest, EditPostRequest, EngagementKind, EngagementMap,
    PostView, TargetRef, ToggleEngagementRequest,
};
use uuid::Uuid;

/// Identity as resolved by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated { viewer_id: String },
    Unauthenticated,
}

impl SessionStatus {
    pub fn viewer_id(&self) -> Option<&str> {
        match self {
            SessionStatus::Authenticated { viewer_id } => Some(viewer_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking message for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Compose and edit surfaces currently open on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affordances {
    pub comment_box: bool,
    /// Comment whose reply box is open.
    pub reply_box: Option<String>,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The viewer has to sign in first; the redirect carries the intent.
    SignInRequired { redirect_url: String },
    /// Identity or the view itself is still loading.
    NotReady,
    /// The viewer may not do this.
    Denied,
    /// The target is not part of the loaded view.
    TargetMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No continuation on the location, or it was already consumed.
    Idle,
    /// Waiting on identity or on the first load.
    Deferred,
    /// Still signed out after the round trip; the intent was dropped.
    Abandoned,
    Opened,
    Replayed,
    /// The engagement was already active for this viewer; nothing was sent.
    Satisfied,
    /// The continuation was malformed or pointed at a missing target.
    Dropped,
    Denied,
    Failed,
}

enum Gate {
    Viewer(String),
    SignIn,
    NotReady,
}

/// Everything one post page owns: the loaded tree, the viewer's engagement
/// cache, open affordances, notices and the browser-visible location.
///
/// Mutations are two-phase: the request is sent and acknowledged, then the
/// whole view is fetched again. Local state is never patched ahead of the
/// server.
pub struct PostViewSession<A: ContentApi> {
    api: A,
    signin_path: String,
    post_id: String,
    history: Vec<String>,
    status: SessionStatus,
    tree: Option<ContentTree>,
    cache: Option<EngagementCache>,
    affordances: Affordances,
    notices: Vec<Notice>,
    guard: ContinuationGuard,
    compose_key: String,
    view_recorded: bool,
}

impl<A: ContentApi> PostViewSession<A> {
    pub fn new(
        api: A,
        config: &ClientConfig,
        post_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            api,
            signin_path: config.signin_path.clone(),
            post_id: post_id.into(),
            history: vec![location.into()],
            status: SessionStatus::Loading,
            tree: None,
            cache: None,
            affordances: Affordances::default(),
            notices: Vec::new(),
            guard: ContinuationGuard::default(),
            compose_key: Uuid::new_v4().to_string(),
            view_recorded: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Engagement state belongs to one viewer, so a different viewer drops
    /// the cache until the next load.
    pub fn set_status(&mut self, status: SessionStatus) {
        let stale = self
            .cache
            .as_ref()
            .is_some_and(|cache| Some(cache.viewer_id()) != status.viewer_id());
        if stale {
            self.cache = None;
        }
        self.status = status;
    }

    pub fn location(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or_default()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Pushes a new history entry, as following a link would.
    pub fn navigate(&mut self, location: impl Into<String>) {
        self.history.push(location.into());
    }

    fn replace_location(&mut self, location: String) {
        match self.history.last_mut() {
            Some(current) => *current = location,
            None => self.history.push(location),
        }
    }

    pub fn tree(&self) -> Option<&ContentTree> {
        self.tree.as_ref()
    }

    pub fn post(&self) -> Option<&PostView> {
        self.tree.as_ref().map(ContentTree::post)
    }

    pub fn engagement(&self, target: &TargetRef) -> EngagementMap {
        self.cache
            .as_ref()
            .map(|cache| cache.get(target))
            .unwrap_or_default()
    }

    pub fn vote_display(&self, target: &TargetRef) -> Option<VoteDisplay> {
        let node = self.tree.as_ref()?.node(target)?;
        let (up, down) = node.vote_counts();
        Some(VoteDisplay::new(up, down))
    }

    pub fn affordances(&self) -> &Affordances {
        &self.affordances
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(post_id = %self.post_id, ?level, %message, "notice");
        self.notices.push(Notice { level, message });
    }

    /// Fetches post, discussion and (when signed in) the viewer's engagement
    /// state. On failure the previous view is kept as it was.
    ///
    /// The first successful post fetch of a session counts as the page view;
    /// later loads, including the refresh after every action, do not.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let fetched = self.fetch_view().await;
        match fetched {
            Ok((tree, cache)) => {
                tracing::debug!(
                    post_id = %self.post_id,
                    comments = tree.comments().len(),
                    cached = cache.as_ref().map(EngagementCache::len).unwrap_or(0),
                    "post view loaded"
                );
                self.tree = Some(tree);
                self.cache = cache;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(post_id = %self.post_id, error = %err, "failed to load post view");
                self.notice(NoticeLevel::Error, format!("Could not load this post: {err}"));
                Err(err)
            }
        }
    }

    async fn fetch_view(&mut self) -> Result<(ContentTree, Option<EngagementCache>), ClientError> {
        let post = if self.view_recorded {
            self.api.get_post(&self.post_id).await?
        } else {
            let post = self.api.record_view(&self.post_id).await?;
            self.view_recorded = true;
            post
        };
        let discussion = self.api.get_discussion(&self.post_id).await?;
        let tree = ContentTree::assemble(post, discussion);
        let cache = match self.status.viewer_id() {
            Some(viewer_id) => {
                let request = EngagementCache::request_for(&tree, viewer_id);
                let state = self.api.viewer_state(&request).await?;
                Some(EngagementCache::from_state(&self.post_id, viewer_id, state))
            }
            None => None,
        };
        Ok((tree, cache))
    }

    fn gate(&self) -> Gate {
        match &self.status {
            SessionStatus::Loading => Gate::NotReady,
            SessionStatus::Unauthenticated => Gate::SignIn,
            SessionStatus::Authenticated { viewer_id } => Gate::Viewer(viewer_id.clone()),
        }
    }

    fn sign_in_required(
        &self,
        pending: PendingContinuation,
    ) -> Result<ActionOutcome, ClientError> {
        let callback = pending.callback_url(self.location())?;
        let redirect_url = continuation::sign_in_redirect(&self.signin_path, &callback)?;
        tracing::info!(post_id = %self.post_id, %redirect_url, "sign-in required");
        Ok(ActionOutcome::SignInRequired { redirect_url })
    }

    pub async fn toggle_engagement(
        &mut self,
        target: &TargetRef,
        kind: EngagementKind,
    ) -> Result<ActionOutcome, ClientError> {
        match self.gate() {
            Gate::NotReady => Ok(ActionOutcome::NotReady),
            Gate::SignIn => self.sign_in_required(PendingContinuation::engage(kind, target)),
            Gate::Viewer(viewer_id) => self.apply_toggle(&viewer_id, target, kind).await,
        }
    }

    async fn apply_toggle(
        &mut self,
        viewer_id: &str,
        target: &TargetRef,
        kind: EngagementKind,
    ) -> Result<ActionOutcome, ClientError> {
        let Some(tree) = self.tree.as_ref() else {
            return Ok(ActionOutcome::NotReady);
        };
        let Some(recipient_id) = tree.owner(target).map(str::to_string) else {
            self.notice(NoticeLevel::Warning, "That item is no longer available.");
            return Ok(ActionOutcome::TargetMissing);
        };

        let request = ToggleEngagementRequest {
            actor_id: viewer_id.to_string(),
            recipient_id,
            target: target.clone(),
            kind,
        };
        let acknowledged = self.api.toggle_engagement(&request).await;
        let outcome = match acknowledged {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    target_id = %target.id,
                    target_type = %target.kind,
                    kind = kind.as_str(),
                    error = %err,
                    "engagement toggle failed"
                );
                self.notice(NoticeLevel::Error, format!("Could not {}: {err}", kind.as_str()));
                return Err(err);
            }
        };
        tracing::info!(
            target_id = %target.id,
            target_type = %target.kind,
            kind = kind.as_str(),
            active = outcome.active,
            score = outcome.score,
            "engagement toggled"
        );

        self.load().await?;
        Ok(ActionOutcome::Completed)
    }

    pub fn open_comment_box(&mut self) -> Result<ActionOutcome, ClientError> {
        match self.gate() {
            Gate::NotReady => Ok(ActionOutcome::NotReady),
            Gate::SignIn => self.sign_in_required(PendingContinuation::Commenting),
            Gate::Viewer(_) => {
                self.affordances.comment_box = true;
                Ok(ActionOutcome::Completed)
            }
        }
    }

    pub fn open_reply_box(&mut self, comment_id: &str) -> Result<ActionOutcome, ClientError> {
        match self.gate() {
            Gate::NotReady => Ok(ActionOutcome::NotReady),
            Gate::SignIn => self.sign_in_required(PendingContinuation::Reply {
                comment_id: comment_id.to_string(),
            }),
            Gate::Viewer(_) => Ok(self.show_reply_box(comment_id)),
        }
    }

    fn show_reply_box(&mut self, comment_id: &str) -> ActionOutcome {
        let Some(tree) = self.tree.as_ref() else {
            return ActionOutcome::NotReady;
        };
        if tree.comment(comment_id).is_none() {
            self.notice(NoticeLevel::Warning, "That comment is no longer available.");
            return ActionOutcome::TargetMissing;
        }
        self.affordances.reply_box = Some(comment_id.to_string());
        ActionOutcome::Completed
    }

    pub fn start_editing(&mut self) -> Result<ActionOutcome, ClientError> {
        match self.gate() {
            Gate::NotReady => Ok(ActionOutcome::NotReady),
            Gate::SignIn => self.sign_in_required(PendingContinuation::Editing),
            Gate::Viewer(viewer_id) => Ok(self.show_editor(&viewer_id)),
        }
    }

    fn show_editor(&mut self, viewer_id: &str) -> ActionOutcome {
        let Some(post) = self.post() else {
            return ActionOutcome::NotReady;
        };
        if post.author_id != viewer_id {
            self.notice(NoticeLevel::Warning, "Only the author can edit this post.");
            return ActionOutcome::Denied;
        }
        self.affordances.editing = true;
        ActionOutcome::Completed
    }

    /// Posts a comment. Retried submissions reuse the compose key, so the
    /// server returns the first comment instead of a duplicate.
    pub async fn submit_comment(&mut self, content: &str) -> Result<ActionOutcome, ClientError> {
        let viewer_id = match self.gate() {
            Gate::NotReady => return Ok(ActionOutcome::NotReady),
            Gate::SignIn => return self.sign_in_required(PendingContinuation::Commenting),
            Gate::Viewer(viewer_id) => viewer_id,
        };
        let request = CreateCommentRequest {
            author_id: viewer_id,
            content: content.to_string(),
            comment_key: Some(self.compose_key.clone()),
        };
        let acknowledged = self.api.create_comment(&self.post_id, &request).await;
        let created = match acknowledged {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(post_id = %self.post_id, error = %err, "comment submission failed");
                self.notice(NoticeLevel::Error, format!("Could not post comment: {err}"));
                return Err(err);
            }
        };
        tracing::info!(
            post_id = %self.post_id,
            comment_id = %created.id,
            created = created.created,
            "comment submitted"
        );
        self.affordances.comment_box = false;
        self.compose_key = Uuid::new_v4().to_string();
        self.load().await?;
        Ok(ActionOutcome::Completed)
    }

    /// Posts a reply under `comment_id`, optionally addressed to one of the
    /// comment's earlier replies.
    pub async fn submit_reply(
        &mut self,
        comment_id: &str,
        content: &str,
        reply_to_id: Option<&str>,
    ) -> Result<ActionOutcome, ClientError> {
        let viewer_id = match self.gate() {
            Gate::NotReady => return Ok(ActionOutcome::NotReady),
            Gate::SignIn => {
                return self.sign_in_required(PendingContinuation::Reply {
                    comment_id: comment_id.to_string(),
                })
            }
            Gate::Viewer(viewer_id) => viewer_id,
        };
        let Some(tree) = self.tree.as_ref() else {
            return Ok(ActionOutcome::NotReady);
        };
        if tree.comment(comment_id).is_none() {
            self.notice(NoticeLevel::Warning, "That comment is no longer available.");
            return Ok(ActionOutcome::TargetMissing);
        }
        let reply_to_author_id = reply_to_id
            .and_then(|id| tree.reply(id))
            .map(|reply| reply.author_id.clone());

        let request = CreateReplyRequest {
            post_id: self.post_id.clone(),
            author_id: viewer_id,
            content: content.to_string(),
            reply_to_id: reply_to_id.map(str::to_string),
            reply_to_author_id,
        };
        let acknowledged = self.api.create_reply(comment_id, &request).await;
        let created = match acknowledged {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(comment_id = %comment_id, error = %err, "reply submission failed");
                self.notice(NoticeLevel::Error, format!("Could not post reply: {err}"));
                return Err(err);
            }
        };
        tracing::info!(comment_id = %comment_id, reply_id = %created.id, "reply submitted");
        self.affordances.reply_box = None;
        self.load().await?;
        Ok(ActionOutcome::Completed)
    }

    pub async fn submit_edit(
        &mut self,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<ActionOutcome, ClientError> {
        let viewer_id = match self.gate() {
            Gate::NotReady => return Ok(ActionOutcome::NotReady),
            Gate::SignIn => return self.sign_in_required(PendingContinuation::Editing),
            Gate::Viewer(viewer_id) => viewer_id,
        };
        match self.post().map(|post| post.author_id == viewer_id) {
            None => return Ok(ActionOutcome::NotReady),
            Some(false) => {
                self.notice(NoticeLevel::Warning, "Only the author can edit this post.");
                return Ok(ActionOutcome::Denied);
            }
            Some(true) => {}
        }
        let request = EditPostRequest {
            actor_id: viewer_id,
            title,
            body,
        };
        let acknowledged = self.api.edit_post(&self.post_id, &request).await;
        if let Err(err) = acknowledged {
            tracing::warn!(post_id = %self.post_id, error = %err, "post edit failed");
            let message = if err.is_forbidden() {
                "Only the author can edit this post.".to_string()
            } else {
                format!("Could not save changes: {err}")
            };
            self.notice(NoticeLevel::Error, message);
            return Err(err);
        }
        self.affordances.editing = false;
        self.load().await?;
        Ok(ActionOutcome::Completed)
    }

    /// Replays the continuation carried by the current location, at most once
    /// per page load. Call it on every render; it waits for identity and the
    /// first load, then consumes the parameter and strips it from the
    /// location without adding a history entry.
    pub async fn resume_continuation(&mut self) -> ResumeOutcome {
        if self.guard.is_consumed() {
            return ResumeOutcome::Idle;
        }
        let decoded = match PendingContinuation::decode(self.location()) {
            Ok(None) => return ResumeOutcome::Idle,
            Ok(Some(pending)) => Ok(pending),
            Err(err) => Err(err),
        };
        if self.status == SessionStatus::Loading || self.tree.is_none() {
            return ResumeOutcome::Deferred;
        }
        if !self.guard.consume() {
            return ResumeOutcome::Idle;
        }

        let Some(viewer_id) = self.status.viewer_id().map(str::to_string) else {
            self.notice(NoticeLevel::Info, "Sign in to continue where you left off.");
            self.strip_continuation();
            return ResumeOutcome::Abandoned;
        };
        let pending = match decoded {
            Ok(pending) => pending,
            Err(err) => {
                tracing::warn!(location = %self.location(), error = %err, "dropping continuation");
                self.notice(NoticeLevel::Warning, "That action could not be resumed.");
                self.strip_continuation();
                return ResumeOutcome::Dropped;
            }
        };
        tracing::info!(post_id = %self.post_id, ?pending, "resuming continuation");

        let outcome = match pending {
            PendingContinuation::Commenting => {
                self.affordances.comment_box = true;
                ResumeOutcome::Opened
            }
            PendingContinuation::Reply { comment_id } => match self.show_reply_box(&comment_id) {
                ActionOutcome::Completed => ResumeOutcome::Opened,
                _ => ResumeOutcome::Dropped,
            },
            PendingContinuation::Editing => match self.show_editor(&viewer_id) {
                ActionOutcome::Completed => ResumeOutcome::Opened,
                _ => ResumeOutcome::Denied,
            },
            PendingContinuation::Engage { kind, target } => {
                let target = target.resolve(&self.post_id);
                // toggling an active engagement would retract it
                if self.engagement(&target).is_active(kind) {
                    tracing::info!(
                        target_id = %target.id,
                        target_type = %target.kind,
                        kind = kind.as_str(),
                        "engagement already active, skipping replay"
                    );
                    self.strip_continuation();
                    return ResumeOutcome::Satisfied;
                }
                match self.apply_toggle(&viewer_id, &target, kind).await {
                    Ok(ActionOutcome::Completed) => ResumeOutcome::Replayed,
                    Ok(ActionOutcome::TargetMissing) => ResumeOutcome::Dropped,
                    Ok(_) | Err(_) => ResumeOutcome::Failed,
                }
            }
        };
        self.strip_continuation();
        outcome
    }

    fn strip_continuation(&mut self) {
        match continuation::strip(self.location()) {
            Ok(stripped) => self.replace_location(stripped),
            Err(err) => tracing::warn!(error = %err, "failed to strip continuation"),
        }
    }
}
