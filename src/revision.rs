//! Revision tokens and the append-only structural audit log.
//!
//! Every successful write appends one [`Revision`] carrying an ordered
//! structural diff (add/replace/remove over the serialized aggregate).
//! Replaying all diffs in order against the empty document reconstructs
//! the final serialized state exactly; the log itself is never diffed.
//!
//! Tokens are opaque to callers: a per-id counter plus a content digest,
//! totally ordered per id. Only the monotonicity is contractual, not the
//! encoding.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Opaque, totally ordered (per id) compare-and-swap token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionToken {
    counter: u64,
    digest: String,
}

impl RevisionToken {
    /// Token for a document that has never been written.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            counter: 0,
            digest: "0".repeat(16),
        }
    }

    /// Computes the successor token for a write body.
    #[must_use]
    pub fn next(&self, body: &[u8]) -> Self {
        let counter = self.counter + 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&counter.to_le_bytes());
        hasher.update(body);
        let digest = hasher.finalize().to_hex().as_str()[..16].to_string();
        Self { counter, digest }
    }

    /// The write ordinal this token encodes.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }
}

impl PartialOrd for RevisionToken {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RevisionToken {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.digest.cmp(&other.digest))
    }
}

impl fmt::Display for RevisionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.counter, self.digest)
    }
}

/// Errors parsing a revision token from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed revision token '{value}'")]
pub struct ParseRevisionTokenError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for RevisionToken {
    type Err = ParseRevisionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseRevisionTokenError {
            value: s.to_string(),
        };
        let (counter, digest) = s.split_once('-').ok_or_else(malformed)?;
        let counter: u64 = counter.parse().map_err(|_| malformed())?;
        if digest.is_empty() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        Ok(Self {
            counter,
            digest: digest.to_string(),
        })
    }
}

impl Serialize for RevisionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of one structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOp {
    /// A key or array element that did not exist before.
    Add,
    /// A value replaced in place.
    Replace,
    /// A key or array element removed.
    Remove,
}

/// One structural change, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    /// Change kind.
    pub op: DiffOp,
    /// JSON pointer into the serialized aggregate.
    pub path: String,
    /// New value for add/replace; absent for remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One audit-log entry, appended atomically with its write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Identity of the writer.
    pub author: String,
    /// When the write committed.
    pub date: DateTime<Utc>,
    /// Token assigned to the write.
    pub rev: RevisionToken,
    /// Ordered structural diff against the previous state.
    pub changes: Vec<PatchOp>,
}

fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn diff_into(old: &Value, new: &Value, path: &str, out: &mut Vec<PatchOp>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, old_value) in old_map {
                let child = format!("{path}/{}", escape_pointer_segment(key));
                match new_map.get(key) {
                    None => out.push(PatchOp {
                        op: DiffOp::Remove,
                        path: child,
                        value: None,
                    }),
                    Some(new_value) if new_value != old_value => {
                        diff_into(old_value, new_value, &child, out);
                    }
                    Some(_) => {}
                }
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    out.push(PatchOp {
                        op: DiffOp::Add,
                        path: format!("{path}/{}", escape_pointer_segment(key)),
                        value: Some(new_value.clone()),
                    });
                }
            }
        }
        (Value::Array(old_arr), Value::Array(new_arr)) => {
            let common = old_arr.len().min(new_arr.len());
            for index in 0..common {
                if old_arr[index] != new_arr[index] {
                    diff_into(
                        &old_arr[index],
                        &new_arr[index],
                        &format!("{path}/{index}"),
                        out,
                    );
                }
            }
            for (index, value) in new_arr.iter().enumerate().skip(common) {
                out.push(PatchOp {
                    op: DiffOp::Add,
                    path: format!("{path}/{index}"),
                    value: Some(value.clone()),
                });
            }
            // Removals run tail-first so replay indices stay valid.
            for index in (common..old_arr.len()).rev() {
                out.push(PatchOp {
                    op: DiffOp::Remove,
                    path: format!("{path}/{index}"),
                    value: None,
                });
            }
        }
        (old_value, new_value) => {
            if old_value != new_value {
                out.push(PatchOp {
                    op: DiffOp::Replace,
                    path: path.to_string(),
                    value: Some(new_value.clone()),
                });
            }
        }
    }
}

/// Computes the ordered structural diff from `old` to `new`.
///
/// Scalar and mixed-type changes become a single replace; object keys and
/// array elements are descended into. Applying the result to `old` with
/// [`apply`] yields `new` exactly.
#[must_use]
pub fn diff(old: &Value, new: &Value) -> Vec<PatchOp> {
    let mut out = Vec::new();
    diff_into(old, new, "", &mut out);
    out
}

/// Errors replaying an audit log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Path '{path}' does not resolve in the target document")]
    PathNotFound {
        path: String,
    },

    #[error("Operation at '{path}' does not match the target shape")]
    ShapeMismatch {
        path: String,
    },
}

fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn apply_one(target: &mut Value, op: &PatchOp) -> Result<(), ReplayError> {
    let not_found = || ReplayError::PathNotFound {
        path: op.path.clone(),
    };
    let mismatch = || ReplayError::ShapeMismatch {
        path: op.path.clone(),
    };

    if op.path.is_empty() {
        // Whole-document replace.
        let value = op.value.clone().ok_or_else(mismatch)?;
        *target = value;
        return Ok(());
    }

    let mut segments: Vec<String> = op
        .path
        .split('/')
        .skip(1)
        .map(unescape_pointer_segment)
        .collect();
    let leaf = segments.pop().ok_or_else(not_found)?;

    let mut cursor = target;
    for segment in &segments {
        cursor = match cursor {
            Value::Object(map) => map.get_mut(segment).ok_or_else(not_found)?,
            Value::Array(arr) => {
                let index: usize = segment.parse().map_err(|_| not_found())?;
                arr.get_mut(index).ok_or_else(not_found)?
            }
            _ => return Err(mismatch()),
        };
    }

    match cursor {
        Value::Object(map) => match op.op {
            DiffOp::Add | DiffOp::Replace => {
                let value = op.value.clone().ok_or_else(mismatch)?;
                map.insert(leaf, value);
            }
            DiffOp::Remove => {
                map.remove(&leaf).ok_or_else(not_found)?;
            }
        },
        Value::Array(arr) => {
            let index: usize = leaf.parse().map_err(|_| not_found())?;
            match op.op {
                DiffOp::Add => {
                    let value = op.value.clone().ok_or_else(mismatch)?;
                    if index > arr.len() {
                        return Err(not_found());
                    }
                    arr.insert(index, value);
                }
                DiffOp::Replace => {
                    let value = op.value.clone().ok_or_else(mismatch)?;
                    *arr.get_mut(index).ok_or_else(not_found)? = value;
                }
                DiffOp::Remove => {
                    if index >= arr.len() {
                        return Err(not_found());
                    }
                    arr.remove(index);
                }
            }
        }
        _ => return Err(mismatch()),
    }

    Ok(())
}

/// Applies an ordered diff to `target` in place.
///
/// # Errors
///
/// Returns a [`ReplayError`] when a path does not resolve or an operation
/// does not fit the target shape; `target` may be partially updated then.
pub fn apply(target: &mut Value, ops: &[PatchOp]) -> Result<(), ReplayError> {
    for op in ops {
        apply_one(target, op)?;
    }
    Ok(())
}

/// Replays a full audit log from the empty document.
///
/// # Errors
///
/// Returns a [`ReplayError`] when the log is not self-consistent.
pub fn replay<'a>(revisions: impl IntoIterator<Item = &'a Revision>) -> Result<Value, ReplayError> {
    let mut doc = Value::Object(serde_json::Map::new());
    for revision in revisions {
        apply(&mut doc, &revision.changes)?;
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_ordering_is_per_counter() {
        let initial = RevisionToken::initial();
        let first = initial.next(b"body-1");
        let second = first.next(b"body-2");

        assert!(initial < first);
        assert!(first < second);
        assert_eq!(second.counter(), 2);
    }

    #[test]
    fn test_token_digest_depends_on_body() {
        let initial = RevisionToken::initial();
        assert_ne!(initial.next(b"a"), initial.next(b"b"));
    }

    #[test]
    fn test_token_wire_round_trip() {
        let token = RevisionToken::initial().next(b"doc");
        let wire = token.to_string();
        let parsed: RevisionToken = wire.parse().unwrap();
        assert_eq!(parsed, token);

        assert!("".parse::<RevisionToken>().is_err());
        assert!("5".parse::<RevisionToken>().is_err());
        assert!("x-abcdef".parse::<RevisionToken>().is_err());
        assert!("5-zzzz".parse::<RevisionToken>().is_err());
    }

    #[test]
    fn test_diff_object_add_replace_remove() {
        let old = json!({"a": 1, "b": "x", "gone": true});
        let new = json!({"a": 1, "b": "y", "added": [1, 2]});

        let ops = diff(&old, &new);
        let mut replayed = old.clone();
        apply(&mut replayed, &ops).unwrap();
        assert_eq!(replayed, new);

        assert!(ops.iter().any(|o| o.op == DiffOp::Remove && o.path == "/gone"));
        assert!(ops.iter().any(|o| o.op == DiffOp::Replace && o.path == "/b"));
        assert!(ops.iter().any(|o| o.op == DiffOp::Add && o.path == "/added"));
    }

    #[test]
    fn test_diff_descends_into_nested_objects() {
        let old = json!({"decision": {"description": "draft text", "date": "2026-01-01"}});
        let new = json!({"decision": {"description": "final text", "date": "2026-01-01"}});

        let ops = diff(&old, &new);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, "/decision/description");
    }

    #[test]
    fn test_diff_array_growth_and_shrink() {
        let old = json!({"posts": [{"t": "a"}, {"t": "b"}, {"t": "c"}]});
        let new = json!({"posts": [{"t": "a"}, {"t": "B"}]});

        let ops = diff(&old, &new);
        let mut replayed = old.clone();
        apply(&mut replayed, &ops).unwrap();
        assert_eq!(replayed, new);
    }

    #[test]
    fn test_diff_handles_pointer_escapes() {
        let old = json!({"a/b": 1, "t~e": 2});
        let new = json!({"a/b": 3});

        let ops = diff(&old, &new);
        let mut replayed = old.clone();
        apply(&mut replayed, &ops).unwrap();
        assert_eq!(replayed, new);
    }

    #[test]
    fn test_replay_from_empty_reconstructs() {
        let states = [
            json!({}),
            json!({"status": "draft", "reasons": ["indicator"]}),
            json!({"status": "active", "reasons": ["indicator"], "decision": {"description": "d"}}),
            json!({"status": "active", "reasons": ["indicator", "media"], "decision": {"description": "d"}}),
        ];

        let revisions: Vec<Revision> = states
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Revision {
                author: "auditor".to_string(),
                date: Utc::now(),
                rev: RevisionToken::initial().next(format!("{i}").as_bytes()),
                changes: diff(&pair[0], &pair[1]),
            })
            .collect();

        let replayed = replay(&revisions).unwrap();
        assert_eq!(replayed, states[states.len() - 1]);
    }

    #[test]
    fn test_apply_rejects_dangling_path() {
        let mut doc = json!({"a": 1});
        let op = PatchOp {
            op: DiffOp::Replace,
            path: "/missing/leaf".to_string(),
            value: Some(json!(2)),
        };
        assert!(matches!(
            apply(&mut doc, std::slice::from_ref(&op)),
            Err(ReplayError::PathNotFound { .. })
        ));
    }
}
