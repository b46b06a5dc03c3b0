use crate::content_tree::ContentTree;
use crate::models::{
    EngagementKind, EngagementMap, TargetKind, TargetRef, ViewerEngagementState,
    ViewerStateRequest,
};
use std::collections::HashMap;

/// The viewer's own engagements for one post view, keyed by target.
///
/// Filled by one batched fetch and only ever replaced wholesale, after the
/// viewer's own acknowledged toggle.
#[derive(Debug, Clone)]
pub struct EngagementCache {
    viewer_id: String,
    entries: HashMap<(TargetKind, String), EngagementMap>,
}

impl EngagementCache {
    /// The single batched request covering the post and every loaded node.
    pub fn request_for(tree: &ContentTree, viewer_id: &str) -> ViewerStateRequest {
        ViewerStateRequest {
            post_id: tree.post().id.clone(),
            viewer_id: viewer_id.to_string(),
            comment_ids: tree.comment_ids(),
            reply_ids: tree.reply_ids(),
        }
    }

    pub fn from_state(post_id: &str, viewer_id: &str, state: ViewerEngagementState) -> Self {
        let mut entries = HashMap::with_capacity(1 + state.comments.len() + state.replies.len());
        entries.insert((TargetKind::Post, post_id.to_string()), state.post);
        entries.extend(
            state
                .comments
                .into_iter()
                .map(|(id, map)| ((TargetKind::Comment, id), map)),
        );
        entries.extend(
            state
                .replies
                .into_iter()
                .map(|(id, map)| ((TargetKind::Reply, id), map)),
        );
        Self {
            viewer_id: viewer_id.to_string(),
            entries,
        }
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    /// Missing entries read as "not engaged".
    pub fn get(&self, target: &TargetRef) -> EngagementMap {
        self.entries
            .get(&(target.kind, target.id.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_active(&self, target: &TargetRef, kind: EngagementKind) -> bool {
        self.entries
            .get(&(target.kind, target.id.clone()))
            .map(|map| map.is_active(kind))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

/// Score shown next to a target, with zero rendered as non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDisplay {
    pub score: i64,
    pub direction: VoteDirection,
}

impl VoteDisplay {
    pub fn new(upvote_count: i64, downvote_count: i64) -> Self {
        let score = upvote_count - downvote_count;
        let direction = if score >= 0 {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        };
        Self { score, direction }
    }
}
