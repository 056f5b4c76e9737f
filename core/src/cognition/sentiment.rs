//! Sentiment scan (§4.5 step 2): a cheap lexicon pass over the message
//! text yields `{valence, arousal, dominance}`; long or ambiguous text
//! escalates to the router for a structured classification.

use crate::router::{ChatMessage, ChatRequest, ModelRouterClient};
use serde::{Deserialize, Serialize};

const LENGTH_ESCALATION_THRESHOLD: usize = 400;

const POSITIVE_MARKERS: &[&str] = &[
    "thanks", "thank you", "great", "awesome", "love", "perfect", "nice", "excellent", "happy",
    "glad", "appreciate", "works", "worked", "fixed", "solved",
];
const NEGATIVE_MARKERS: &[&str] = &[
    "broken", "bug", "fail", "failed", "error", "crash", "wrong", "annoying", "frustrated",
    "angry", "hate", "terrible", "worse", "stuck", "confused",
];
const AROUSAL_MARKERS: &[&str] = &["!", "urgent", "asap", "immediately", "now", "critical"];
const COMMAND_MARKERS: &[&str] = &["do this", "make it", "fix", "implement", "run", "just"];
const UNCERTAINTY_MARKERS: &[&str] = &["maybe", "i think", "not sure", "perhaps", "could you", "?"];

/// The three-axis blended score the pipeline persists as a `sentiment`
/// working-memory item (§4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentScore {
    pub valence: f64,
    pub arousal: f64,
    pub dominance: f64,
}

/// The tone the rest of the pipeline should adopt in its reply (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Empathetic,
    StepByStep,
    Celebratory,
    Neutral,
}

/// Cheap lexicon pass. Returns `None` when the text is too long or too
/// thin on markers to be confident, signalling the caller to escalate to
/// the router (§4.5 "when the lexicon is unsure").
pub fn lexicon_scan(text: &str) -> Option<SentimentScore> {
    if text.len() > LENGTH_ESCALATION_THRESHOLD {
        return None;
    }
    let lower = text.to_lowercase();

    let positive_hits = count_hits(&lower, POSITIVE_MARKERS);
    let negative_hits = count_hits(&lower, NEGATIVE_MARKERS);
    let arousal_hits = count_hits(&lower, AROUSAL_MARKERS);
    let command_hits = count_hits(&lower, COMMAND_MARKERS);
    let uncertainty_hits = count_hits(&lower, UNCERTAINTY_MARKERS);

    if positive_hits == 0 && negative_hits == 0 && arousal_hits == 0 {
        return None;
    }

    let valence = ((positive_hits as f64 - negative_hits as f64) / 3.0).clamp(-1.0, 1.0);
    let arousal = (arousal_hits as f64 / 3.0).clamp(0.0, 1.0);
    let dominance = (((command_hits as f64) - (uncertainty_hits as f64)) / 3.0).clamp(-1.0, 1.0);

    Some(SentimentScore {
        valence,
        arousal,
        dominance,
    })
}

fn count_hits(lower: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| lower.contains(*m)).count()
}

/// Ask the router for a structured classification when the lexicon pass
/// is unsure (§4.5). The model is told to answer with exactly a JSON
/// object of the three axes, each in `[-1, 1]` (`arousal` in `[0, 1]`).
pub async fn router_classify(
    client: &ModelRouterClient,
    model: &str,
    text: &str,
) -> crate::error::Result<SentimentScore> {
    let prompt = format!(
        "Classify the emotional tone of this message. Respond with ONLY a JSON object \
         {{\"valence\": <-1..1>, \"arousal\": <0..1>, \"dominance\": <-1..1>}}.\n\nMessage:\n{text}"
    );
    let request = ChatRequest::new(model, vec![ChatMessage::user(prompt)]).with_max_tokens(60);
    let response = client.chat_completion(request).await?;
    let content = response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .unwrap_or("{}");
    let parsed: SentimentScore = serde_json::from_str(content).map_err(|e| {
        crate::error::AriaError::Internal {
            message: format!("router returned non-JSON sentiment classification: {e}"),
        }
    })?;
    Ok(parsed)
}

/// Blend a lexicon score with a router score, weighting the router 2:1
/// over the cheap pass since it only runs when the lexicon was unsure.
pub fn blend(lexicon: Option<SentimentScore>, router: Option<SentimentScore>) -> SentimentScore {
    match (lexicon, router) {
        (Some(l), Some(r)) => SentimentScore {
            valence: (l.valence + 2.0 * r.valence) / 3.0,
            arousal: (l.arousal + 2.0 * r.arousal) / 3.0,
            dominance: (l.dominance + 2.0 * r.dominance) / 3.0,
        },
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => SentimentScore {
            valence: 0.0,
            arousal: 0.0,
            dominance: 0.0,
        },
    }
}

/// Map a blended score to the reply tone (§4.5 "a simple rule maps score
/// -> tone").
pub fn tone_for(score: SentimentScore) -> Tone {
    if score.valence <= -0.25 {
        Tone::Empathetic
    } else if score.valence >= 0.5 && score.arousal >= 0.3 {
        Tone::Celebratory
    } else if score.dominance <= -0.2 || score.arousal >= 0.5 {
        Tone::StepByStep
    } else {
        Tone::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_markers_yield_positive_valence() {
        let score = lexicon_scan("Thanks, that's perfect! works great").unwrap();
        assert!(score.valence > 0.0);
    }

    #[test]
    fn negative_markers_yield_negative_valence() {
        let score = lexicon_scan("this is broken and the build keeps failing, I'm frustrated").unwrap();
        assert!(score.valence < 0.0);
    }

    #[test]
    fn neutral_text_is_unsure() {
        assert!(lexicon_scan("the file is at src/main.rs").is_none());
    }

    #[test]
    fn long_text_escalates() {
        let long = "a".repeat(LENGTH_ESCALATION_THRESHOLD + 1);
        assert!(lexicon_scan(&long).is_none());
    }

    #[test]
    fn negative_valence_maps_to_empathetic() {
        let score = SentimentScore {
            valence: -0.5,
            arousal: 0.2,
            dominance: 0.0,
        };
        assert_eq!(tone_for(score), Tone::Empathetic);
    }

    #[test]
    fn high_positive_arousal_maps_to_celebratory() {
        let score = SentimentScore {
            valence: 0.8,
            arousal: 0.6,
            dominance: 0.0,
        };
        assert_eq!(tone_for(score), Tone::Celebratory);
    }

    #[test]
    fn blend_weights_router_double() {
        let lexicon = SentimentScore {
            valence: 0.0,
            arousal: 0.0,
            dominance: 0.0,
        };
        let router = SentimentScore {
            valence: 0.9,
            arousal: 0.9,
            dominance: 0.9,
        };
        let blended = blend(Some(lexicon), Some(router));
        assert!((blended.valence - 0.6).abs() < 1e-9);
    }
}
