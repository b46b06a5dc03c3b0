use crate::models::{CommentView, Discussion, PostView, ReplyView, TargetKind, TargetRef};
use std::collections::HashMap;

/// Post → Comment[] → Reply[] for one page view, built from the flat
/// discussion lists. Both levels keep fetch order.
#[derive(Debug, Clone)]
pub struct ContentTree {
    post: PostView,
    comments: Vec<CommentView>,
    replies_by_comment: HashMap<String, Vec<ReplyView>>,
    reply_parent: HashMap<String, String>,
    skipped_replies: usize,
}

/// Any node of the tree, borrowed.
#[derive(Debug, Clone, Copy)]
pub enum ContentNode<'a> {
    Post(&'a PostView),
    Comment(&'a CommentView),
    Reply(&'a ReplyView),
}

impl<'a> ContentNode<'a> {
    pub fn author_id(&self) -> &'a str {
        match *self {
            ContentNode::Post(post) => &post.author_id,
            ContentNode::Comment(comment) => &comment.author_id,
            ContentNode::Reply(reply) => &reply.author_id,
        }
    }

    pub fn vote_counts(&self) -> (i64, i64) {
        match *self {
            ContentNode::Post(post) => (post.upvote_count, post.downvote_count),
            ContentNode::Comment(comment) => (comment.upvote_count, comment.downvote_count),
            ContentNode::Reply(reply) => (reply.upvote_count, reply.downvote_count),
        }
    }
}

impl ContentTree {
    /// Replies whose parent comment is not among `discussion.comments` are
    /// left out; they are treated as not loaded yet.
    pub fn assemble(post: PostView, discussion: Discussion) -> Self {
        let Discussion { comments, replies } = discussion;
        let mut replies_by_comment: HashMap<String, Vec<ReplyView>> = comments
            .iter()
            .map(|comment| (comment.id.clone(), Vec::new()))
            .collect();
        let mut reply_parent = HashMap::new();
        let mut skipped_replies = 0;

        for reply in replies {
            match replies_by_comment.get_mut(&reply.comment_id) {
                Some(bucket) => {
                    reply_parent.insert(reply.id.clone(), reply.comment_id.clone());
                    bucket.push(reply);
                }
                None => {
                    tracing::debug!(
                        reply_id = %reply.id,
                        comment_id = %reply.comment_id,
                        "reply parent not loaded, skipping"
                    );
                    skipped_replies += 1;
                }
            }
        }

        Self {
            post,
            comments,
            replies_by_comment,
            reply_parent,
            skipped_replies,
        }
    }

    pub fn post(&self) -> &PostView {
        &self.post
    }

    pub fn comments(&self) -> &[CommentView] {
        &self.comments
    }

    pub fn replies_for(&self, comment_id: &str) -> &[ReplyView] {
        self.replies_by_comment
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn comment(&self, comment_id: &str) -> Option<&CommentView> {
        self.comments.iter().find(|comment| comment.id == comment_id)
    }

    pub fn reply(&self, reply_id: &str) -> Option<&ReplyView> {
        let comment_id = self.reply_parent.get(reply_id)?;
        self.replies_for(comment_id)
            .iter()
            .find(|reply| reply.id == reply_id)
    }

    pub fn node(&self, target: &TargetRef) -> Option<ContentNode<'_>> {
        match target.kind {
            TargetKind::Post => {
                (self.post.id == target.id).then_some(ContentNode::Post(&self.post))
            }
            TargetKind::Comment => self.comment(&target.id).map(ContentNode::Comment),
            TargetKind::Reply => self.reply(&target.id).map(ContentNode::Reply),
        }
    }

    /// Author of the target, which is who an engagement on it notifies.
    pub fn owner(&self, target: &TargetRef) -> Option<&str> {
        self.node(target).map(|node| node.author_id())
    }

    pub fn comment_ids(&self) -> Vec<String> {
        self.comments.iter().map(|comment| comment.id.clone()).collect()
    }

    pub fn reply_ids(&self) -> Vec<String> {
        self.comments
            .iter()
            .flat_map(|comment| self.replies_for(&comment.id))
            .map(|reply| reply.id.clone())
            .collect()
    }

    /// Replies dropped by `assemble` because their comment was missing.
    pub fn skipped_replies(&self) -> usize {
        self.skipped_replies
    }

    pub fn anchor(&self, target: &TargetRef) -> Option<String> {
        match self.node(target)? {
            ContentNode::Post(_) => None,
            ContentNode::Comment(comment) => Some(comment_anchor(&comment.id)),
            ContentNode::Reply(reply) => Some(reply_anchor(&reply.comment_id, &reply.id)),
        }
    }
}

pub fn comment_anchor(comment_id: &str) -> String {
    format!("comment-{comment_id}")
}

pub fn reply_anchor(comment_id: &str, reply_id: &str) -> String {
    format!("{}-reply-{reply_id}", comment_anchor(comment_id))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{CommentView, PostView, ReplyView};

    pub fn post(id: &str, author: &str) -> PostView {
        PostView {
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
        }
    }

    pub fn comment(id: &str, post_id: &str, author: &str) -> CommentView {
        CommentView {
            id: id.into(),
            post_id: post_id.into(),
            author_id: author.into(),
            content: format!("comment {id}"),
            upvote_count: 0,
            downvote_count: 0,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        }
    }

    pub fn reply(id: &str, comment_id: &str, post_id: &str, author: &str) -> ReplyView {
        ReplyView {
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
        }
    }
}
