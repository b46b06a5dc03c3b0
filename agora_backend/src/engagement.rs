//! Votes, bookmarks and reposts.
//!
//! A toggle flips one engagement for one actor on one target and keeps the
//! target's denormalized counters in step, all inside a single transaction.
//! Votes are mutually exclusive: casting an upvote retracts an active
//! downvote and vice versa. Casting an engagement that is already active
//! retracts it. Only activations notify the content owner.

use crate::database::models::{EngagementRecord, TargetCounters};
use crate::database::repositories::{EngagementRepository, PostRepository};
use crate::database::Database;
use crate::error::ServiceError;
use crate::notifications::{fan_out, FanOutEvent};
use crate::target::{EngagementKind, TargetKind, TargetRef};
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone)]
pub struct EngagementService {
    database: Database,
}

impl EngagementService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn toggle(&self, input: ToggleEngagementInput) -> Result<ToggleOutcome> {
        if input.actor_id.trim().is_empty() {
            return Err(ServiceError::invalid("actor_id may not be empty").into());
        }
        if !input.kind.applies_to(input.target.kind) {
            return Err(ServiceError::invalid(format!(
                "{} is not available on a {}",
                input.kind.as_str(),
                input.target.kind
            ))
            .into());
        }

        let outcome = self.database.with_transaction(|repos| {
            let engagements = repos.engagements();
            let ownership = engagements.resolve(&input.target)?.ok_or_else(|| {
                ServiceError::not_found(format!("{} {}", input.target.kind, input.target.id))
            })?;
            if ownership.author_id != input.recipient_id {
                return Err(ServiceError::invalid(format!(
                    "{} is not the author of {} {}",
                    input.recipient_id, input.target.kind, input.target.id
                ))
                .into());
            }

            let already_active = engagements.exists(&input.target, &input.actor_id, input.kind)?;
            let mut notification_id = None;
            if already_active {
                engagements.remove(&input.target, &input.actor_id, input.kind)?;
                engagements.adjust_counter(&input.target, input.kind, -1)?;
            } else {
                if let Some(opposing) = input.kind.opposing_vote() {
                    if engagements.remove(&input.target, &input.actor_id, opposing)? {
                        engagements.adjust_counter(&input.target, opposing, -1)?;
                    }
                }
                engagements.insert(&EngagementRecord {
                    target_type: input.target.kind.as_str().to_string(),
                    target_id: input.target.id.clone(),
                    actor_id: input.actor_id.clone(),
                    kind: input.kind.as_str().to_string(),
                    post_id: ownership.post_id.clone(),
                    created_at: now_utc_iso(),
                })?;
                engagements.adjust_counter(&input.target, input.kind, 1)?;

                notification_id = fan_out(
                    &repos,
                    FanOutEvent {
                        kind: input.kind.into(),
                        actor_id: &input.actor_id,
                        recipient_id: &input.recipient_id,
                        target: &input.target,
                        post_id: &ownership.post_id,
                    },
                )?
                .map(|item| item.id);
            }

            let mut state = EngagementMap::empty_for(input.target.kind);
            for kind in [
                EngagementKind::Upvote,
                EngagementKind::Downvote,
                EngagementKind::Bookmark,
                EngagementKind::Repost,
            ] {
                if kind.applies_to(input.target.kind)
                    && engagements.exists(&input.target, &input.actor_id, kind)?
                {
                    state.set(kind, true);
                }
            }
            let counters = engagements.counters(&input.target)?;

            Ok(ToggleOutcome {
                target: input.target.clone(),
                kind: input.kind,
                active: !already_active,
                state,
                score: counters.upvote_count - counters.downvote_count,
                counters,
                notification_id,
            })
        })?;

        tracing::info!(
            actor_id = %input.actor_id,
            target_type = %outcome.target.kind,
            target_id = %outcome.target.id,
            kind = outcome.kind.as_str(),
            active = outcome.active,
            score = outcome.score,
            "engagement toggled"
        );
        Ok(outcome)
    }

    /// The viewer's engagement with a post and with every listed comment and
    /// reply, answered from one query. Ids the viewer never engaged with map
    /// to an all-false entry.
    pub fn viewer_state(&self, request: &ViewerStateRequest) -> Result<ViewerEngagementState> {
        let records = self.database.with_repositories(|repos| {
            if repos.posts().get(&request.post_id)?.is_none() {
                return Err(ServiceError::not_found(format!("post {}", request.post_id)).into());
            }
            repos
                .engagements()
                .list_for_actor_in_post(&request.viewer_id, &request.post_id)
        })?;

        let mut state = ViewerEngagementState {
            post: EngagementMap::empty_for(TargetKind::Post),
            comments: request
                .comment_ids
                .iter()
                .map(|id| (id.clone(), EngagementMap::empty_for(TargetKind::Comment)))
                .collect(),
            replies: request
                .reply_ids
                .iter()
                .map(|id| (id.clone(), EngagementMap::empty_for(TargetKind::Reply)))
                .collect(),
        };

        for record in records {
            let (Ok(target_kind), Ok(kind)) = (
                record.target_type.parse::<TargetKind>(),
                record.kind.parse::<EngagementKind>(),
            ) else {
                tracing::warn!(
                    target_type = %record.target_type,
                    kind = %record.kind,
                    "ignoring malformed engagement row"
                );
                continue;
            };
            let entry = match target_kind {
                TargetKind::Post if record.target_id == request.post_id => Some(&mut state.post),
                TargetKind::Post => None,
                TargetKind::Comment => state.comments.get_mut(&record.target_id),
                TargetKind::Reply => state.replies.get_mut(&record.target_id),
            };
            if let Some(entry) = entry {
                entry.set(kind, true);
            }
        }
        Ok(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEngagementInput {
    pub actor_id: String,
    pub recipient_id: String,
    pub target: TargetRef,
    pub kind: EngagementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub target: TargetRef,
    pub kind: EngagementKind,
    /// Whether `kind` is active for the actor after the toggle.
    pub active: bool,
    pub state: EngagementMap,
    pub counters: TargetCounters,
    pub score: i64,
    pub notification_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerStateRequest {
    pub post_id: String,
    pub viewer_id: String,
    #[serde(default)]
    pub comment_ids: Vec<String>,
    #[serde(default)]
    pub reply_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerEngagementState {
    pub post: EngagementMap,
    pub comments: HashMap<String, EngagementMap>,
    pub replies: HashMap<String, EngagementMap>,
}

/// One viewer's engagement with one target. `bookmark` and `repost` are
/// only present for posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMap {
    pub upvote: bool,
    pub downvote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repost: Option<bool>,
}

impl EngagementMap {
    pub fn empty_for(kind: TargetKind) -> Self {
        let post_only = (kind == TargetKind::Post).then_some(false);
        Self {
            upvote: false,
            downvote: false,
            bookmark: post_only,
            repost: post_only,
        }
    }

    fn set(&mut self, kind: EngagementKind, active: bool) {
        match kind {
            EngagementKind::Upvote => self.upvote = active,
            EngagementKind::Downvote => self.downvote = active,
            EngagementKind::Bookmark => self.bookmark = Some(active),
            EngagementKind::Repost => self.repost = Some(active),
        }
    }
}
