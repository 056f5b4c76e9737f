//! Memory retrieval (§4.5 step 3): pull working-memory context under a
//! token budget, optionally fan out to a semantic search, and merge the
//! two (plus the knowledge graph, when used) by Reciprocal Rank Fusion.

use crate::store::WorkingMemoryItem;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const RRF_K: f64 = 60.0;
const WEIGHT_SEMANTIC: f64 = 1.0;
const WEIGHT_GRAPH: f64 = 0.8;
const WEIGHT_MEMORY: f64 = 0.6;

/// One retrieved passage, source-tagged so its weight can be applied
/// during the RRF merge.
#[derive(Debug, Clone)]
pub struct RetrievedItem {
    pub content: String,
    pub source: Source,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Semantic,
    Graph,
    Memory,
}

impl Source {
    fn weight(self) -> f64 {
        match self {
            Source::Semantic => WEIGHT_SEMANTIC,
            Source::Graph => WEIGHT_GRAPH,
            Source::Memory => WEIGHT_MEMORY,
        }
    }
}

/// Estimate tokens at 4 chars/token (§4.5 "prose length estimated at 4
/// chars/token").
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    (text.len() + chars_per_token - 1) / chars_per_token.max(1)
}

/// Pull working-memory items for `session_id`, most-recently-accessed
/// first, stopping once the running token estimate would exceed
/// `token_budget`.
pub fn cap_working_memory(
    items: Vec<WorkingMemoryItem>,
    token_budget: usize,
    chars_per_token: usize,
) -> Vec<WorkingMemoryItem> {
    let mut sorted = items;
    sorted.sort_by(|a, b| b.accessed_at.cmp(&a.accessed_at));

    let mut kept = Vec::new();
    let mut used = 0usize;
    for item in sorted {
        let text = item.value.to_string();
        let cost = estimate_tokens(&text, chars_per_token);
        if used + cost > token_budget && !kept.is_empty() {
            break;
        }
        used += cost;
        kept.push(item);
    }
    kept
}

fn content_hash(content: &str) -> u64 {
    let normalized: String = content
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect();
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    hasher.finish()
}

struct Fused {
    total_score: f64,
    best_score: f64,
    item: RetrievedItem,
}

/// Reciprocal Rank Fusion across sources, each weighted per §4.5:
/// `score = sum_i 1/(k+rank_i)` across every source an item appears in, so
/// an item retrieved by two sources outranks one retrieved by only one at
/// the same rank. Content-hash dedup keeps the individual instance with
/// the highest single-source score as the representative item.
pub fn rrf_merge(items: Vec<RetrievedItem>) -> Vec<RetrievedItem> {
    let mut fused: HashMap<u64, Fused> = HashMap::new();
    for item in items {
        let score = item.source.weight() / (RRF_K + item.rank as f64);
        let hash = content_hash(&item.content);
        fused
            .entry(hash)
            .and_modify(|entry| {
                entry.total_score += score;
                if score > entry.best_score {
                    entry.best_score = score;
                    entry.item = item.clone();
                }
            })
            .or_insert(Fused {
                total_score: score,
                best_score: score,
                item,
            });
    }
    let mut merged: Vec<Fused> = fused.into_values().collect();
    merged.sort_by(|a, b| b.total_score.partial_cmp(&a.total_score).unwrap_or(std::cmp::Ordering::Equal));
    merged.into_iter().map(|entry| entry.item).collect()
}
