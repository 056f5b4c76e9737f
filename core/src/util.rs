//! Small shared helpers used across the core: token estimation, content
//! hashing, and id generation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Rough token estimate for budget accounting: 4 characters per token.
///
/// This is intentionally crude — it avoids pulling in a tokenizer crate for
/// a figure that is only ever used as a soft budget heuristic, never for
/// wire-level truncation.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + 3) / 4
}

/// Stable hash of a tool's argument JSON, used as the `args_hash` field on
/// invocation audit records so identical calls can be deduplicated without
/// storing the (possibly sensitive) arguments twice.
pub fn hash_args(args: &serde_json::Value) -> String {
    let canonical = args.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random identifier with the given prefix, e.g. `goal_`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

/// Current UTC timestamp, the single place the core asks the system clock
/// so records are comparable across modules.
pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
