//! Dialogue posts exchanged between the oversight body and tender owner.
//!
//! Posts form an append-only thread inside the aggregate. Replies are
//! constrained: a reply targets an existing post by the other author, each
//! post takes at most one reply, and chains never nest (depth ≤ 1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::ValidationError;
use crate::ids::PostId;

/// One dialogue post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Stable post id, assigned on append.
    #[serde(default)]
    pub id: PostId,

    /// Short subject line.
    pub title: String,

    /// Body text.
    pub description: String,

    /// Recorded author identity.
    #[serde(default)]
    pub author: String,

    /// Post this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_post: Option<PostId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped when the post is appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a top-level post.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: PostId::new(),
            title: title.into(),
            description: description.into(),
            author: String::new(),
            related_post: None,
            documents: Vec::new(),
            date_published: None,
        }
    }

    /// Turn this post into a reply to `target`.
    #[must_use]
    pub fn replying_to(mut self, target: PostId) -> Self {
        self.related_post = Some(target);
        self
    }
}

/// Validates the reply invariants for `incoming` posts appended after
/// `existing` ones, returning one error per violation.
///
/// Checks, per incoming reply: the target exists in the combined thread,
/// the target is not itself a reply, the reply author differs from the
/// target author, and the target has no other reply (existing or within
/// the same batch).
#[must_use]
pub fn validate_reply_chain(existing: &[Post], incoming: &[Post]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut taken: Vec<PostId> = existing.iter().filter_map(|p| p.related_post).collect();

    for (index, post) in incoming.iter().enumerate() {
        let field = format!("posts[{index}].relatedPost");
        let Some(target_id) = post.related_post else {
            continue;
        };

        let target = existing
            .iter()
            .chain(incoming.iter().take(index))
            .find(|p| p.id == target_id);

        let Some(target) = target else {
            errors.push(ValidationError::UnresolvedPostReference {
                field,
                reference: target_id.to_string(),
            });
            continue;
        };

        if target.related_post.is_some() {
            errors.push(ValidationError::NestedReply {
                field,
                reference: target_id.to_string(),
            });
            continue;
        }

        if !target.author.is_empty() && target.author == post.author {
            errors.push(ValidationError::SelfReply {
                field,
                reference: target_id.to_string(),
            });
            continue;
        }

        if taken.contains(&target_id) {
            errors.push(ValidationError::DuplicateReply {
                field,
                reference: target_id.to_string(),
            });
            continue;
        }

        taken.push(target_id);
    }

    errors
}
