//! Pattern recognition (§4.5 "Pattern recognition"): a scheduled batch
//! job (wired as a heartbeat job, not run per-message) that scans recent
//! activities/messages for recurring topics and emits `Pattern` records
//! when frequency, emerging-interest, knowledge-gap, or temporal-
//! concentration thresholds trip.

use chrono::{DateTime, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const WINDOW_DAYS: i64 = 30;
const FREQUENCY_THRESHOLD: usize = 5;
const EMERGING_GROWTH_THRESHOLD: f64 = 2.0;
const KNOWLEDGE_GAP_REPEAT_THRESHOLD: usize = 3;
const TEMPORAL_CONCENTRATION_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Frequency,
    EmergingInterest,
    KnowledgeGap,
    Temporal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub topic: String,
    pub confidence: f64,
    pub evidence_count: usize,
}

/// One scanned item: a message or activity with its topic-bearing text,
/// a timestamp, and whether it was an unanswered question (for the
/// knowledge-gap trigger).
#[derive(Debug, Clone)]
pub struct ScanItem {
    pub text: String,
    pub at: DateTime<Utc>,
    pub unanswered_question: bool,
}

/// Extract topics from `text` via keyword + regex heuristics: hashtags,
/// `#topic`-style mentions, and capitalized multi-word phrases longer
/// than 3 characters. Grounded on a keyword/regex-heuristic extraction
/// approach rather than requiring an embedding model, matching this
/// pipeline's "cheap batch pass" framing.
pub fn extract_topics(text: &str) -> Vec<String> {
    let hashtag = Regex::new(r"#(\w{4,})").unwrap();
    let mut topics: Vec<String> = hashtag
        .captures_iter(text)
        .map(|c| c[1].to_lowercase())
        .collect();

    let word_re = Regex::new(r"[A-Za-z][A-Za-z0-9_\-]{3,}").unwrap();
    for word in word_re.find_iter(text) {
        let lower = word.as_str().to_lowercase();
        if !topics.contains(&lower) {
            topics.push(lower);
        }
    }
    topics
}

fn within_window(items: &[ScanItem], now: DateTime<Utc>, days: i64) -> Vec<&ScanItem> {
    let cutoff = now - chrono::Duration::days(days);
    items.iter().filter(|i| i.at >= cutoff).collect()
}

/// Run the full pattern scan over `items`, emitting every pattern whose
/// trigger condition is met (§4.5).
pub fn scan(items: &[ScanItem], now: DateTime<Utc>) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    let recent = within_window(items, now, WINDOW_DAYS);
    let historical_cutoff_days = WINDOW_DAYS * 2;
    let historical = within_window(items, now, historical_cutoff_days);

    let mut recent_counts: HashMap<String, usize> = HashMap::new();
    let mut historical_counts: HashMap<String, usize> = HashMap::new();

    for item in &recent {
        for topic in extract_topics(&item.text) {
            *recent_counts.entry(topic).or_insert(0) += 1;
        }
    }
    for item in &historical {
        for topic in extract_topics(&item.text) {
            *historical_counts.entry(topic).or_insert(0) += 1;
        }
    }

    for (topic, count) in &recent_counts {
        if *count >= FREQUENCY_THRESHOLD {
            patterns.push(Pattern {
                kind: PatternKind::Frequency,
                topic: topic.clone(),
                confidence: (*count as f64 / (FREQUENCY_THRESHOLD as f64 * 2.0)).min(1.0),
                evidence_count: *count,
            });
        }

        let prior = historical_counts.get(topic).copied().unwrap_or(0).saturating_sub(*count);
        if prior > 0 {
            let growth = *count as f64 / prior as f64;
            if growth >= EMERGING_GROWTH_THRESHOLD {
                patterns.push(Pattern {
                    kind: PatternKind::EmergingInterest,
                    topic: topic.clone(),
                    confidence: (growth / (EMERGING_GROWTH_THRESHOLD * 2.0)).min(1.0),
                    evidence_count: *count,
                });
            }
        }
    }

    // Knowledge gap: repeated unanswered questions about the same topic.
    let mut unanswered_counts: HashMap<String, usize> = HashMap::new();
    for item in recent.iter().filter(|i| i.unanswered_question) {
        for topic in extract_topics(&item.text) {
            *unanswered_counts.entry(topic).or_insert(0) += 1;
        }
    }
    for (topic, count) in &unanswered_counts {
        if *count >= KNOWLEDGE_GAP_REPEAT_THRESHOLD {
            patterns.push(Pattern {
                kind: PatternKind::KnowledgeGap,
                topic: topic.clone(),
                confidence: (*count as f64 / (KNOWLEDGE_GAP_REPEAT_THRESHOLD as f64 * 2.0)).min(1.0),
                evidence_count: *count,
            });
        }
    }

    // Temporal concentration: >30% of a topic's mentions fall in one hour-of-day bucket.
    let mut hour_buckets: HashMap<(String, u32), usize> = HashMap::new();
    for item in &recent {
        let hour = item.at.hour();
        for topic in extract_topics(&item.text) {
            *hour_buckets.entry((topic, hour)).or_insert(0) += 1;
        }
    }
    for (topic, total) in &recent_counts {
        if *total == 0 {
            continue;
        }
        let max_bucket = (0..24)
            .map(|h| hour_buckets.get(&(topic.clone(), h)).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        let concentration = max_bucket as f64 / *total as f64;
        if concentration > TEMPORAL_CONCENTRATION_THRESHOLD && *total >= 3 {
            patterns.push(Pattern {
                kind: PatternKind::Temporal,
                topic: topic.clone(),
                confidence: concentration.min(1.0),
                evidence_count: *total,
            });
        }
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_at(text: &str, hours_ago: i64) -> ScanItem {
        ScanItem {
            text: text.to_string(),
            at: crate::util::now() - chrono::Duration::hours(hours_ago),
            unanswered_question: false,
        }
    }

    #[test]
    fn extracts_hashtag_and_word_topics() {
        let topics = extract_topics("thinking about #rustlang and Kubernetes deployments");
        assert!(topics.contains(&"rustlang".to_string()));
        assert!(topics.contains(&"kubernetes".to_string()));
    }

    #[test]
    fn frequent_topic_triggers_frequency_pattern() {
        let items: Vec<ScanItem> = (0..6).map(|i| item_at("kubernetes deployment question", i)).collect();
        let patterns = scan(&items, crate::util::now());
        assert!(patterns
            .iter()
            .any(|p| p.kind == PatternKind::Frequency && p.topic == "kubernetes"));
    }

    #[test]
    fn repeated_unanswered_question_triggers_knowledge_gap() {
        let mut items = Vec::new();
        for i in 0..4 {
            items.push(ScanItem {
                text: "how does sharding work".to_string(),
                at: crate::util::now() - chrono::Duration::hours(i),
                unanswered_question: true,
            });
        }
        let patterns = scan(&items, crate::util::now());
        assert!(patterns.iter().any(|p| p.kind == PatternKind::KnowledgeGap));
    }

    #[test]
    fn sparse_topics_trigger_nothing() {
        let items = vec![item_at("just one random mention of dolphins", 1)];
        let patterns = scan(&items, crate::util::now());
        assert!(patterns.is_empty());
    }
}
