//! Memory compression (§4.5 "Memory compression"): three tiers — raw
//! (hot), recent summary, archive — with an importance-scored selection
//! of what gets summarized first. The router performs the actual
//! summarization; this module only scores, selects, and records the
//! compressed-vs-raw bookkeeping.

use crate::router::{ChatMessage, ChatRequest, ModelRouterClient};
use crate::store::WorkingMemoryItem;
use serde::{Deserialize, Serialize};

const RAW_TIER_SIZE: usize = 20;
const RECENT_TIER_SIZE: usize = 100;
const SELECTION_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Raw,
    RecentSummary,
    Archive,
}

/// Which category a compressed summary belongs to: `raw`,
/// `compressed_recent`, or `compressed_archive`.
pub fn category_for_tier(tier: Tier) -> &'static str {
    match tier {
        Tier::Raw => "raw",
        Tier::RecentSummary => "compressed_recent",
        Tier::Archive => "compressed_archive",
    }
}

/// Assigns each item to a tier by recency rank: the most recent
/// `RAW_TIER_SIZE` items stay raw, the next `RECENT_TIER_SIZE` become
/// recent-summary candidates, everything older is archive (§4.5).
pub fn assign_tiers(items_newest_first: &[WorkingMemoryItem]) -> Vec<Tier> {
    items_newest_first
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            if idx < RAW_TIER_SIZE {
                Tier::Raw
            } else if idx < RAW_TIER_SIZE + RECENT_TIER_SIZE {
                Tier::RecentSummary
            } else {
                Tier::Archive
            }
        })
        .collect()
}

/// Importance score inputs for one candidate item (§4.5's four-factor
/// formula).
#[derive(Debug, Clone, Copy)]
pub struct ImportanceFactors {
    pub recency: f64,
    pub significance: f64,
    pub category_weight: f64,
    pub length_norm: f64,
}

/// `score = 0.4*recency + 0.3*significance + 0.2*category_weight +
/// 0.1*length_norm` (§4.5).
pub fn importance_score(factors: ImportanceFactors) -> f64 {
    0.4 * factors.recency + 0.3 * factors.significance + 0.2 * factors.category_weight
        + 0.1 * factors.length_norm
}

/// Pick the top `SELECTION_FRACTION` of candidates by importance score,
/// highest first. Ties keep input order (stable sort).
pub fn select_for_compression<T: Clone>(scored: &[(T, f64)]) -> Vec<T> {
    let mut indexed: Vec<(usize, &(T, f64))> = scored.iter().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1 .1
            .partial_cmp(&a.1 .1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let take = ((scored.len() as f64) * SELECTION_FRACTION).ceil() as usize;
    indexed
        .into_iter()
        .take(take.max(1).min(scored.len()))
        .map(|(_, (item, _))| item.clone())
        .collect()
}

/// Summarization instructions sent to the router: preserve named
/// entities, numbers, and decisions (§4.5).
const SUMMARY_INSTRUCTIONS: &str = "Summarize the following memory items. Preserve every named \
entity, number, and decision verbatim; omit only conversational filler.";

pub async fn summarize(
    client: &ModelRouterClient,
    model: &str,
    tier: Tier,
    contents: &[String],
) -> crate::error::Result<String> {
    let target_ratio = match tier {
        Tier::RecentSummary => "to about 30% of the original length",
        Tier::Archive => "to about 10% of the original length",
        Tier::Raw => "",
    };
    let prompt = format!(
        "{SUMMARY_INSTRUCTIONS} Compress {target_ratio}.\n\nItems:\n{}",
        contents.join("\n---\n")
    );
    let request = ChatRequest::new(model, vec![ChatMessage::user(prompt)]);
    let response = client.chat_completion(request).await?;
    Ok(response
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default())
}

/// Bookkeeping result: the raw items are never deleted, only marked
/// compressed with a reference to the summary that now represents them
/// (§4.5 "the underlying raw items are marked as compressed (not
/// deleted) with a reference to the summary id").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionRecord {
    pub summary_id: String,
    pub tier: Tier,
    pub source_keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::now;

    fn item(key: &str) -> WorkingMemoryItem {
        WorkingMemoryItem {
            key: key.to_string(),
            value: serde_json::json!("v"),
            category: "context".to_string(),
            importance: 0.5,
            created_at: now(),
            accessed_at: now(),
            access_count: 0,
            session_id: None,
        }
    }

    #[test]
    fn tiers_follow_recency_boundaries() {
        let items: Vec<WorkingMemoryItem> = (0..130).map(|i| item(&i.to_string())).collect();
        let tiers = assign_tiers(&items);
        assert_eq!(tiers[0], Tier::Raw);
        assert_eq!(tiers[19], Tier::Raw);
        assert_eq!(tiers[20], Tier::RecentSummary);
        assert_eq!(tiers[119], Tier::RecentSummary);
        assert_eq!(tiers[120], Tier::Archive);
    }

    #[test]
    fn importance_score_weights_recency_highest() {
        let recency_heavy = ImportanceFactors {
            recency: 1.0,
            significance: 0.0,
            category_weight: 0.0,
            length_norm: 0.0,
        };
        let significance_heavy = ImportanceFactors {
            recency: 0.0,
            significance: 1.0,
            category_weight: 0.0,
            length_norm: 0.0,
        };
        assert!(importance_score(recency_heavy) > importance_score(significance_heavy));
    }

    #[test]
    fn select_for_compression_takes_top_30_percent() {
        let scored: Vec<(&str, f64)> = vec![("a", 0.9), ("b", 0.1), ("c", 0.5), ("d", 0.8), ("e", 0.2)];
        let selected = select_for_compression(&scored);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0], "a");
        assert_eq!(selected[1], "d");
    }
}
