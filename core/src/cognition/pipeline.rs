//! The cognition pipeline (§4.5): the main per-message control loop.
//! Wires boundary checking, sentiment scanning, memory retrieval, agent
//! selection, skill planning, invocation, persistence, and the
//! compression trigger into one ordered pass.

use super::compression::category_for_tier;
use super::plan::{PlanStep, SkillPlan};
use super::retrieval::{cap_working_memory, estimate_tokens, rrf_merge, RetrievedItem, Source};
use super::sentiment::{blend, lexicon_scan, router_classify, tone_for, SentimentScore, Tone};
use crate::agent::{AgentCoordinator, Task};
use crate::config::CognitionConfig;
use crate::error::Result;
use crate::router::{ChatMessage, ChatRequest, ModelRouterClient};
use crate::session::{Checkpointer, PendingWrite};
use crate::skills::SkillRegistry;
use crate::store::StoreFacade;
use std::sync::Arc;

/// Final outcome of running the pipeline once for a message.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub reply: String,
    pub tone: Tone,
    pub refused: bool,
    pub compression_triggered: bool,
}

pub struct CognitionPipeline {
    store: StoreFacade,
    registry: Arc<SkillRegistry>,
    router: Arc<ModelRouterClient>,
    coordinator: Arc<AgentCoordinator>,
    checkpointer: Arc<Checkpointer>,
    config: CognitionConfig,
}

impl CognitionPipeline {
    pub fn new(
        store: StoreFacade,
        registry: Arc<SkillRegistry>,
        router: Arc<ModelRouterClient>,
        coordinator: Arc<AgentCoordinator>,
        checkpointer: Arc<Checkpointer>,
        config: CognitionConfig,
    ) -> Self {
        Self {
            store,
            registry,
            router,
            coordinator,
            checkpointer,
            config,
        }
    }

    /// Run the full 8-step pipeline for one user message (§4.5).
    pub async fn process_message(
        &self,
        session_id: &str,
        agent_model: &str,
        text: &str,
    ) -> Result<PipelineOutcome> {
        // 1. Boundary check.
        if let Some(refusal) = self.config.boundary.check(text) {
            return Ok(PipelineOutcome {
                reply: refusal.to_string(),
                tone: Tone::Neutral,
                refused: true,
                compression_triggered: false,
            });
        }

        // 2. Sentiment scan.
        let lexicon = lexicon_scan(text);
        let router_score = if lexicon.is_none() {
            router_classify(&self.router, agent_model, text).await.ok()
        } else {
            None
        };
        let sentiment = blend(lexicon, router_score);
        self.persist_sentiment(session_id, sentiment)?;
        let tone = tone_for(sentiment);

        // 3. Memory retrieval.
        let retrieved = self.retrieve_context(session_id, text).await;

        // 4. Focus / agent selection (§4.2).
        let task = Task {
            description: text.to_string(),
            required_skills: Default::default(),
            focus_hints: Default::default(),
        };
        let agent_id = self.coordinator.select(&task).ok();
        let reply_model = agent_id
            .as_ref()
            .and_then(|id| self.coordinator.get(id))
            .map(|agent| agent.primary_model)
            .unwrap_or_else(|| agent_model.to_string());

        // 5. Skill plan: persist the turn to working memory through the
        // registry rather than the store directly, so the write is rate
        // limited and audited the same way a job-triggered skill call is.
        // Non-critical: a disabled or missing `memory` skill must not
        // abort the rest of the turn.
        let plan = SkillPlan::new(vec![PlanStep::new(
            "memory",
            "put",
            serde_json::json!({
                "key": "last_user_message",
                "value": text,
                "category": "context",
                "importance": 0.3,
                "session_id": session_id,
            }),
            false,
        )]);

        // 6. Invocation via the registry.
        let registry = self.registry.clone();
        let session_for_plan = session_id.to_string();
        let plan_result = plan
            .run(|skill, tool, inputs| {
                let registry = registry.clone();
                let session_id = session_for_plan.clone();
                async move {
                    match registry.invoke(&skill, &tool, inputs, Some(session_id)).await {
                        Ok(outcome) => (outcome.ok, outcome.data),
                        Err(_) => (false, None),
                    }
                }
            })
            .await;

        // Reply assembly, grounded in the retrieved context and the
        // selected agent's model; falls back to a deterministic
        // tone-keyed reply if the router call itself fails.
        let context: Vec<String> = retrieved.iter().take(5).map(|item| item.content.clone()).collect();
        let reply = self.compose_reply(&reply_model, text, tone, &context).await;

        // 7. Persist.
        self.store.activities().append(
            "message_processed",
            serde_json::json!({
                "session_id": session_id,
                "tone": format!("{tone:?}"),
                "agent_id": agent_id,
                "reply": reply,
                "plan_aborted": plan_result.aborted,
            }),
            Some(session_id.to_string()),
        )?;
        self.store.working_memory().put(
            &format!("last_reply_{session_id}"),
            serde_json::json!(reply),
            "context",
            0.3,
            Some(session_id.to_string()),
        )?;
        let checkpoint_due = self.checkpointer.on_message_boundary();
        if checkpoint_due {
            self.checkpointer.flush(&[PendingWrite {
                key: format!("last_message_{session_id}"),
                value: serde_json::json!(text),
                category: "context".to_string(),
                importance: 0.3,
                session_id: Some(session_id.to_string()),
            }])?;
        }

        // 8. Compression trigger.
        let raw_count = self.store.working_memory().for_session(Some(session_id)).len();
        let compression_triggered = raw_count > self.config.compression_threshold;

        Ok(PipelineOutcome {
            reply,
            tone,
            refused: false,
            compression_triggered,
        })
    }

    /// Compose the assistant's reply via the router, tone-steered by a
    /// system message and grounded in the retrieved context (§4.5 step
    /// 5-7). Falls back to a deterministic tone-keyed reply when the
    /// router call fails, rather than surfacing the error — a degraded
    /// reply beats dropping the turn entirely.
    async fn compose_reply(&self, model: &str, text: &str, tone: Tone, context: &[String]) -> String {
        let mut messages = vec![ChatMessage::system(system_prompt_for(tone))];
        if !context.is_empty() {
            messages.push(ChatMessage::system(format!("Relevant context:\n{}", context.join("\n"))));
        }
        messages.push(ChatMessage::user(text.to_string()));

        let request = ChatRequest::new(model, messages).with_max_tokens(512);
        match self.router.chat_completion(request).await {
            Ok(response) => response
                .choices
                .first()
                .map(|choice| choice.message.content.clone())
                .unwrap_or_else(|| fallback_reply(tone)),
            Err(e) => {
                tracing::warn!(error = %e, model = %model, "reply composition failed, using fallback");
                fallback_reply(tone)
            }
        }
    }

    fn persist_sentiment(&self, session_id: &str, sentiment: SentimentScore) -> Result<()> {
        self.store.working_memory().put(
            "sentiment",
            serde_json::json!({
                "valence": sentiment.valence,
                "arousal": sentiment.arousal,
                "dominance": sentiment.dominance,
            }),
            "sentiment",
            0.2,
            Some(session_id.to_string()),
        )?;
        Ok(())
    }

    /// Working-memory pull capped by the token budget, plus semantic
    /// search when the store has an embedding available, merged by RRF
    /// (§4.5 step 3).
    async fn retrieve_context(&self, session_id: &str, query: &str) -> Vec<RetrievedItem> {
        let working = self.store.working_memory().for_session(Some(session_id));
        let capped = cap_working_memory(
            working,
            self.config.retrieval_token_budget,
            self.config.chars_per_token,
        );
        let mut items: Vec<RetrievedItem> = capped
            .into_iter()
            .enumerate()
            .map(|(idx, item)| RetrievedItem {
                content: item.value.to_string(),
                source: Source::Memory,
                rank: idx + 1,
            })
            .collect();

        if let Ok(embedding_response) = self.router.embeddings("embed-default", vec![query.to_string()]).await {
            if let Some(embedding) = embedding_response.data.first() {
                if let Ok(hits) = self
                    .store
                    .semantic()
                    .search_semantic(embedding.embedding.clone(), 10, 0.0, None)
                    .await
                {
                    items.extend(hits.into_iter().map(|hit| RetrievedItem {
                        content: hit.memory.content,
                        source: Source::Semantic,
                        rank: hit.rank,
                    }));
                }
            }
        }

        rrf_merge(items)
    }

    pub fn estimate_query_tokens(&self, text: &str) -> usize {
        estimate_tokens(text, self.config.chars_per_token)
    }

    /// Category name for a given compression tier, exposed so callers
    /// building the compression job can tag the summary memory correctly.
    pub fn compression_category(&self, tier: super::compression::Tier) -> &'static str {
        category_for_tier(tier)
    }
}

fn system_prompt_for(tone: Tone) -> &'static str {
    match tone {
        Tone::Empathetic => "Respond with empathy; acknowledge the user's frustration before helping.",
        Tone::StepByStep => "Respond with clear, numbered steps.",
        Tone::Celebratory => "Respond warmly, matching the user's positive energy.",
        Tone::Neutral => "Respond helpfully and concisely.",
    }
}

fn fallback_reply(tone: Tone) -> String {
    match tone {
        Tone::Empathetic => "I hear you, and I'm looking into this.".to_string(),
        Tone::StepByStep => "Let me walk you through this step by step.".to_string(),
        Tone::Celebratory => "Glad that worked out!".to_string(),
        Tone::Neutral => "Got it, working on that.".to_string(),
    }
}
