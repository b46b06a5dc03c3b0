//! Pending intents carried through the sign-in redirect as one query
//! parameter on the callback URL.
//!
//! | intent                  | parameter              |
//! |-------------------------|------------------------|
//! | open the comment box    | `?commenting`          |
//! | reply to a comment      | `?reply=<commentId>`   |
//! | edit the post           | `?editing`             |
//! | engage with the post    | `?upvote=Post`         |
//! | engage with a comment   | `?upvote=Comment:<id>` |
//! | engage with a reply     | `?upvote=Reply:<id>`   |
//!
//! `downvote`, `bookmark` and `repost` follow the `upvote` form.

use crate::api::ClientError;
use crate::models::{EngagementKind, TargetKind, TargetRef};
use reqwest::Url;
use thiserror::Error;

const COMMENTING_KEY: &str = "commenting";
const REPLY_KEY: &str = "reply";
const EDITING_KEY: &str = "editing";
const CALLBACK_PARAM: &str = "callbackUrl";
const LOCATION_BASE: &str = "http://localhost/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContinuationError {
    #[error("invalid location `{0}`")]
    InvalidLocation(String),
    #[error("continuation `{key}` has malformed value `{value}`")]
    Malformed { key: String, value: String },
}

impl From<ContinuationError> for ClientError {
    fn from(err: ContinuationError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

/// Target of a deferred engagement. The post itself is implied by the page,
/// so only comments and replies carry an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationTarget {
    Post,
    Comment(String),
    Reply(String),
}

impl ContinuationTarget {
    pub fn from_ref(target: &TargetRef) -> Self {
        match target.kind {
            TargetKind::Post => ContinuationTarget::Post,
            TargetKind::Comment => ContinuationTarget::Comment(target.id.clone()),
            TargetKind::Reply => ContinuationTarget::Reply(target.id.clone()),
        }
    }

    pub fn resolve(&self, post_id: &str) -> TargetRef {
        match self {
            ContinuationTarget::Post => TargetRef::post(post_id),
            ContinuationTarget::Comment(id) => TargetRef::comment(id.as_str()),
            ContinuationTarget::Reply(id) => TargetRef::reply(id.as_str()),
        }
    }

    fn encode(&self) -> String {
        match self {
            ContinuationTarget::Post => TargetKind::Post.as_str().to_string(),
            ContinuationTarget::Comment(id) => format!("{}:{id}", TargetKind::Comment),
            ContinuationTarget::Reply(id) => format!("{}:{id}", TargetKind::Reply),
        }
    }

    fn decode(raw: &str) -> Option<Self> {
        if raw == TargetKind::Post.as_str() {
            return Some(ContinuationTarget::Post);
        }
        let (kind, id) = raw.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        match kind {
            "Comment" => Some(ContinuationTarget::Comment(id.to_string())),
            "Reply" => Some(ContinuationTarget::Reply(id.to_string())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingContinuation {
    Commenting,
    Reply { comment_id: String },
    Editing,
    Engage {
        kind: EngagementKind,
        target: ContinuationTarget,
    },
}

impl PendingContinuation {
    pub fn engage(kind: EngagementKind, target: &TargetRef) -> Self {
        PendingContinuation::Engage {
            kind,
            target: ContinuationTarget::from_ref(target),
        }
    }

    fn key(&self) -> &'static str {
        match self {
            PendingContinuation::Commenting => COMMENTING_KEY,
            PendingContinuation::Reply { .. } => REPLY_KEY,
            PendingContinuation::Editing => EDITING_KEY,
            PendingContinuation::Engage { kind, .. } => kind.as_str(),
        }
    }

    fn value(&self) -> Option<String> {
        match self {
            PendingContinuation::Commenting | PendingContinuation::Editing => None,
            PendingContinuation::Reply { comment_id } => Some(comment_id.clone()),
            PendingContinuation::Engage { target, .. } => Some(target.encode()),
        }
    }

    /// `location` with this continuation attached. Any continuation already
    /// present is replaced; other parameters are kept.
    pub fn callback_url(&self, location: &str) -> Result<String, ContinuationError> {
        let mut url = parse_location(location)?;
        retain_pairs(&mut url, |key| !is_continuation_key(key));
        match self.value() {
            Some(value) => {
                url.query_pairs_mut().append_pair(self.key(), &value);
            }
            None => {
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{existing}&{}", self.key()),
                    _ => self.key().to_string(),
                };
                url.set_query(Some(&query));
            }
        }
        Ok(relative(&url))
    }

    /// Reads the continuation carried by `location`, if any. The first
    /// recognised parameter wins.
    pub fn decode(location: &str) -> Result<Option<Self>, ContinuationError> {
        let url = parse_location(location)?;
        for (key, value) in url.query_pairs() {
            let continuation = match key.as_ref() {
                COMMENTING_KEY => PendingContinuation::Commenting,
                EDITING_KEY => PendingContinuation::Editing,
                REPLY_KEY if !value.is_empty() => PendingContinuation::Reply {
                    comment_id: value.into_owned(),
                },
                other => match EngagementKind::from_key(other) {
                    Some(kind) => match ContinuationTarget::decode(&value) {
                        Some(target) => PendingContinuation::Engage { kind, target },
                        None => return Err(malformed(other, &value)),
                    },
                    None if other == REPLY_KEY => return Err(malformed(other, &value)),
                    None => continue,
                },
            };
            return Ok(Some(continuation));
        }
        Ok(None)
    }
}

/// `location` without any continuation parameter.
pub fn strip(location: &str) -> Result<String, ContinuationError> {
    let mut url = parse_location(location)?;
    retain_pairs(&mut url, |key| !is_continuation_key(key));
    Ok(relative(&url))
}

/// Sign-in page URL that sends the actor back to `callback_url` afterwards.
pub fn sign_in_redirect(
    signin_path: &str,
    callback_url: &str,
) -> Result<String, ContinuationError> {
    let mut url = parse_location(signin_path)?;
    url.query_pairs_mut().append_pair(CALLBACK_PARAM, callback_url);
    Ok(relative(&url))
}

/// One decode per page load. Once consumed, later resume attempts are
/// no-ops even if the parameter is still visible.
#[derive(Debug, Default)]
pub struct ContinuationGuard {
    consumed: bool,
}

impl ContinuationGuard {
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Returns `true` exactly once.
    pub fn consume(&mut self) -> bool {
        !std::mem::replace(&mut self.consumed, true)
    }
}

fn is_continuation_key(key: &str) -> bool {
    matches!(key, COMMENTING_KEY | REPLY_KEY | EDITING_KEY)
        || EngagementKind::from_key(key).is_some()
}

fn malformed(key: &str, value: &str) -> ContinuationError {
    ContinuationError::Malformed {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_location(location: &str) -> Result<Url, ContinuationError> {
    Url::parse(LOCATION_BASE)
        .and_then(|base| base.join(location))
        .map_err(|err| ContinuationError::InvalidLocation(format!("{location}: {err}")))
}

/// Drops query segments whose key fails `keep`. Kept segments are copied as
/// written, bare flags included.
fn retain_pairs(url: &mut Url, keep: impl Fn(&str) -> bool) {
    let query = url.query().map(|query| {
        query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| keep(segment.split_once('=').map_or(*segment, |(key, _)| key)))
            .collect::<Vec<_>>()
            .join("&")
    });
    url.set_query(query.as_deref().filter(|query| !query.is_empty()));
}

/// Path, query and fragment of `url`, dropping the placeholder origin.
fn relative(url: &Url) -> String {
    let mut out = url.path().to_string();
    if let Some(query) = url.query().filter(|query| !query.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reply_redirect_round_trip() {
        let pending = PendingContinuation::Reply {
            comment_id: "c1".into(),
        };
        let callback = pending.callback_url("/post/42/my-slug").unwrap();
        assert_eq!(callback, "/post/42/my-slug?reply=c1");

        let redirect = sign_in_redirect("/auth/signin", &callback).unwrap();
        assert_eq!(
            redirect,
            "/auth/signin?callbackUrl=%2Fpost%2F42%2Fmy-slug%3Freply%3Dc1"
        );

        assert_eq!(PendingContinuation::decode(&callback).unwrap(), Some(pending));
        assert_eq!(strip(&callback).unwrap(), "/post/42/my-slug");
    }

    #[test]
    fn bare_keys_have_no_value() {
        let callback = PendingContinuation::Commenting
            .callback_url("/post/42/my-slug?sort=new")
            .unwrap();
        assert_eq!(callback, "/post/42/my-slug?sort=new&commenting");
        assert_eq!(
            PendingContinuation::decode(&callback).unwrap(),
            Some(PendingContinuation::Commenting)
        );

        let editing = PendingContinuation::Editing.callback_url("/post/42").unwrap();
        assert_eq!(editing, "/post/42?editing");
    }

    #[test]
    fn engagement_targets_encode_kind_and_id() {
        let post = PendingContinuation::engage(EngagementKind::Upvote, &TargetRef::post("p1"));
        assert_eq!(post.callback_url("/post/p1").unwrap(), "/post/p1?upvote=Post");

        let comment =
            PendingContinuation::engage(EngagementKind::Downvote, &TargetRef::comment("c9"));
        let callback = comment.callback_url("/post/p1").unwrap();
        assert_eq!(callback, "/post/p1?downvote=Comment%3Ac9");
        let decoded = PendingContinuation::decode(&callback).unwrap().unwrap();
        assert_eq!(decoded, comment);

        match decoded {
            PendingContinuation::Engage { target, .. } => {
                assert_eq!(target.resolve("p1"), TargetRef::comment("c9"));
            }
            other => panic!("unexpected continuation {other:?}"),
        }
    }

    #[test]
    fn new_continuation_replaces_existing_one() {
        let callback = PendingContinuation::engage(EngagementKind::Repost, &TargetRef::post("p1"))
            .callback_url("/post/p1?reply=c1&page=2")
            .unwrap();
        assert_eq!(callback, "/post/p1?page=2&repost=Post");
    }

    #[test]
    fn strip_keeps_other_parameters_and_fragment() {
        let stripped = strip("/post/42/my-slug?sort=new&reply=c1#comment-c1").unwrap();
        assert_eq!(stripped, "/post/42/my-slug?sort=new#comment-c1");
        assert_eq!(strip("/post/42?upvote=Post").unwrap(), "/post/42");
    }

    #[test]
    fn unrelated_parameters_pass_through_untouched() {
        assert_eq!(strip("/post/1?preview&reply=c1").unwrap(), "/post/1?preview");
        assert_eq!(
            strip("/post/1?q=a%20b&editing&ref=x+y").unwrap(),
            "/post/1?q=a%20b&ref=x+y"
        );

        let callback = PendingContinuation::Reply {
            comment_id: "c2".into(),
        }
        .callback_url("/post/1?preview&upvote=Post")
        .unwrap();
        assert_eq!(callback, "/post/1?preview&reply=c2");
    }

    #[test]
    fn locations_without_continuation_decode_to_none() {
        assert_eq!(PendingContinuation::decode("/post/42").unwrap(), None);
        assert_eq!(PendingContinuation::decode("/post/42?sort=new").unwrap(), None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            PendingContinuation::decode("/post/42?upvote=Thread:7"),
            Err(ContinuationError::Malformed { .. })
        ));
        assert!(matches!(
            PendingContinuation::decode("/post/42?bookmark=Comment:"),
            Err(ContinuationError::Malformed { .. })
        ));
        assert!(matches!(
            PendingContinuation::decode("/post/42?reply="),
            Err(ContinuationError::Malformed { .. })
        ));
    }

    #[test]
    fn guard_fires_once() {
        let mut guard = ContinuationGuard::default();
        assert!(!guard.is_consumed());
        assert!(guard.consume());
        assert!(!guard.consume());
        assert!(guard.is_consumed());
    }
}
