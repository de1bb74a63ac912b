//! Thread structure reported by `UID THREAD` (RFC 5256) and its flattening
//! into one ordered UID sequence per conversation.
//!
//! ```text
//! * THREAD (101 (102)(103))(200)
//!          └──── thread 1 ────┘└ 2 ┘   →   [[101, 102, 103], [200]]
//! ```

use tracing::warn;

use crate::error::{ArchiveError, Result};
use crate::model::message::Uid;

/// One node of the server-reported thread tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadNode {
    /// A single message.
    Leaf(Uid),
    /// A parenthesized group of nodes, in server order.
    Branch(Vec<ThreadNode>),
    /// A token that is neither a UID nor a group (e.g. `NIL`).
    Unrecognized(String),
}

/// Iterative teardown: server trees may nest to any depth.
impl Drop for ThreadNode {
    fn drop(&mut self) {
        let ThreadNode::Branch(children) = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let ThreadNode::Branch(grandchildren) = &mut node {
                pending.append(grandchildren);
            }
        }
    }
}

/// Flatten every top-level element into its own UID sequence.
///
/// The result has exactly one sequence per element of `roots`, each listing
/// the element's leaves depth-first, left to right. Unrecognized nodes are
/// skipped with a warning.
pub fn flatten_threads(roots: &[ThreadNode]) -> Vec<Vec<Uid>> {
    roots.iter().map(flatten).collect()
}

/// Concatenate the leaves of one subtree in depth-first, left-to-right order.
pub fn flatten(node: &ThreadNode) -> Vec<Uid> {
    let mut uids = Vec::new();
    // Explicit stack so adversarially deep nesting cannot overflow ours
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        match node {
            ThreadNode::Leaf(uid) => uids.push(*uid),
            ThreadNode::Branch(children) => stack.extend(children.iter().rev()),
            ThreadNode::Unrecognized(token) => {
                warn!(token = %token, "Skipping unhandled node in thread structure");
            }
        }
    }
    uids
}

/// Parse the untagged `* THREAD` line out of a raw server response.
///
/// Returns the top-level elements. A response without a `THREAD` line (or
/// with an empty one) yields no threads.
pub fn parse_thread_response(response: &[u8]) -> Result<Vec<ThreadNode>> {
    let text = String::from_utf8_lossy(response);
    let Some(line) = text.lines().find_map(|l| {
        let rest = l.strip_prefix("* ")?;
        let keyword = rest.get(..6)?;
        let args = &rest[6..];
        (keyword.eq_ignore_ascii_case("THREAD") && (args.is_empty() || args.starts_with(' ')))
            .then_some(args)
    }) else {
        return Ok(Vec::new());
    };

    let mut roots: Vec<ThreadNode> = Vec::new();
    // Open groups; the innermost is last
    let mut open: Vec<Vec<ThreadNode>> = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        let node = match ch {
            ' ' | '\t' | '\r' => continue,
            '(' => {
                open.push(Vec::new());
                continue;
            }
            ')' => {
                let group = open.pop().ok_or_else(|| {
                    ArchiveError::ThreadResponse(format!("unbalanced ')' at column {pos}"))
                })?;
                ThreadNode::Branch(group)
            }
            _ => {
                let mut end = pos + ch.len_utf8();
                while let Some(&(next_pos, next)) = chars.peek() {
                    if next == ' ' || next == '(' || next == ')' || next == '\r' {
                        break;
                    }
                    end = next_pos + next.len_utf8();
                    chars.next();
                }
                let token = &line[pos..end];
                match token.parse::<Uid>() {
                    Ok(uid) if uid > 0 => ThreadNode::Leaf(uid),
                    _ => ThreadNode::Unrecognized(token.to_string()),
                }
            }
        };

        match open.last_mut() {
            Some(group) => group.push(node),
            None => roots.push(node),
        }
    }

    if !open.is_empty() {
        return Err(ArchiveError::ThreadResponse(format!(
            "{} unclosed '('",
            open.len()
        )));
    }

    Ok(roots)
}
