//! The process-wide `Core` (§5 "Global mutable state -> explicit
//! process-wide structs"): wires config, store, router, skills, agent
//! coordinator, scheduler, session manager, and cognition pipeline into
//! one handle the CLI/daemon entry point owns.

use crate::agent::{Agent, AgentCoordinator, AgentRole};
use crate::cognition::CognitionPipeline;
use crate::config::{require_secret, AgentsConfig, CognitionConfig, ModelCatalog, ToolsDescriptor};
use crate::error::Result;
use crate::memory::journal::Journal;
use crate::router::ModelRouterClient;
use crate::scheduler::{HeartbeatScheduler, JobsConfig};
use crate::session::{Checkpointer, SessionManager};
use crate::skills::{KnowledgeGraphSkill, MemorySkill, Skill, SkillRegistry};
use crate::store::StoreFacade;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EMBEDDING_DIMENSION: usize = 1536;
const MAIN_SESSION_ID: &str = "S_main";
const MAIN_AGENT_ID: &str = "coordinator";

/// Filesystem layout the process expects under its data and config
/// directories (§6 "External interfaces").
pub struct CorePaths {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl CorePaths {
    fn models_yaml(&self) -> PathBuf {
        self.config_dir.join("models.yaml")
    }
    fn skills_yaml(&self) -> PathBuf {
        self.config_dir.join("skills.yaml")
    }
    fn cognition_yaml(&self) -> PathBuf {
        self.config_dir.join("cognition.yaml")
    }
    fn agents_yaml(&self) -> PathBuf {
        self.config_dir.join("agents.yaml")
    }
    pub fn jobs_yaml(&self) -> PathBuf {
        self.config_dir.join("jobs.yaml")
    }
    fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }
}

/// The wired-together process state. Cheap to clone (everything inside
/// is an `Arc` or already `Clone`) so the CLI/daemon loop can hold one
/// handle and pass it to every command.
#[derive(Clone)]
pub struct Core {
    pub store: StoreFacade,
    pub registry: Arc<SkillRegistry>,
    pub router: Arc<ModelRouterClient>,
    pub coordinator: Arc<AgentCoordinator>,
    pub sessions: Arc<SessionManager>,
    pub scheduler: Arc<HeartbeatScheduler>,
    pub pipeline: Arc<CognitionPipeline>,
    pub journal: Arc<Journal>,
    pub jobs_config_path: PathBuf,
}

impl Core {
    /// The declarative job config the scheduler was booted with.
    pub fn jobs_config(&self) -> &JobsConfig {
        self.scheduler.config()
    }

    pub fn jobs_config_path(&self) -> &Path {
        &self.jobs_config_path
    }

    /// Boot the process: load config, open the store, and wire every
    /// component. Fails with `AriaError::Configuration`/`MissingConfig`
    /// on any bad or absent required setting (exit code 1, per §6).
    pub async fn bootstrap(paths: CorePaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.data_dir)?;

        let catalog = ModelCatalog::load(&paths.models_yaml())?;
        // `ToolsDescriptor::load` (rather than the generic `load_or_default`)
        // so `env:` secret resolution and `ARIA_SKILL_*` overrides actually
        // run; an absent file just means no skill is configured.
        let tools_descriptor = if paths.skills_yaml().exists() {
            ToolsDescriptor::load(&paths.skills_yaml())?
        } else {
            ToolsDescriptor::default()
        };
        let cognition_config = load_or_default::<CognitionConfig>(&paths.cognition_yaml())?;
        let jobs_config = JobsConfig::load(&paths.jobs_yaml())?;
        let agents_config = AgentsConfig::load(&paths.agents_yaml())?;

        let store = StoreFacade::open(paths.data_dir.clone(), paths.vector_dir(), EMBEDDING_DIMENSION).await?;

        let router_base_url =
            std::env::var("ARIA_ROUTER_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());
        let router_api_key = require_secret("ARIA_ROUTER_API_KEY")?;
        let router = Arc::new(ModelRouterClient::new(router_base_url, router_api_key, catalog)?);

        let registry = Arc::new(SkillRegistry::new(store.invocations()));
        register_builtin_skills(&registry, &tools_descriptor, &store)?;

        let coordinator = Arc::new(AgentCoordinator::new());
        register_agents(&coordinator, &agents_config, &router, &registry);

        let sessions = Arc::new(SessionManager::new(
            store.sessions(),
            store.working_memory(),
            store.activities(),
            MAIN_SESSION_ID,
        ));
        sessions.ensure_main_session(MAIN_AGENT_ID)?;

        let checkpointer = Arc::new(Checkpointer::new(store.working_memory()));

        let scheduler = Arc::new(HeartbeatScheduler::new(
            jobs_config,
            store.jobs(),
            registry.clone(),
            store.activities(),
        ));

        let pipeline = Arc::new(CognitionPipeline::new(
            store.clone(),
            registry.clone(),
            router.clone(),
            coordinator.clone(),
            checkpointer,
            cognition_config,
        ));

        let journal = Arc::new(Journal::new(&paths.data_dir)?);
        let jobs_config_path = paths.jobs_yaml();

        Ok(Self {
            store,
            registry,
            router,
            coordinator,
            sessions,
            scheduler,
            pipeline,
            journal,
            jobs_config_path,
        })
    }
}

fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if path.exists() {
        crate::config::load_yaml(path)
    } else {
        Ok(T::default())
    }
}

/// Register every built-in skill whose `skills.yaml` entry enables it (or
/// that has no entry at all, defaulting to enabled). Schema validation —
/// the signature-vs-schema check (§4.1) — happens inside
/// `SkillRegistry::register`, so a mismatch fails startup here rather
/// than surfacing as `SkillNotFound` at the first real invocation.
fn register_builtin_skills(registry: &SkillRegistry, descriptor: &ToolsDescriptor, store: &StoreFacade) -> Result<()> {
    let builtins: Vec<(Arc<dyn Skill>, u32)> = vec![
        (
            Arc::new(KnowledgeGraphSkill::new(store.knowledge())) as Arc<dyn Skill>,
            descriptor.get("knowledge_graph").and_then(|e| e.max_per_minute).unwrap_or(60),
        ),
        (
            Arc::new(MemorySkill::new(store.working_memory())) as Arc<dyn Skill>,
            descriptor.get("memory").and_then(|e| e.max_per_minute).unwrap_or(120),
        ),
    ];
    for (skill, max_per_minute) in builtins {
        let name = skill.name().to_string();
        if descriptor.skills.contains_key(&name) && !descriptor.is_enabled(&name) {
            continue;
        }
        registry.register(skill, max_per_minute)?;
    }
    Ok(())
}

/// Register the declared persona roster, or — when none is declared — a
/// single generalist agent spanning every skill that just registered, so
/// `coordinator.select` is never inert for want of a config file (§4.2).
fn register_agents(coordinator: &AgentCoordinator, agents_config: &AgentsConfig, router: &ModelRouterClient, registry: &SkillRegistry) {
    let catalog = router.catalog();
    if agents_config.agents.is_empty() {
        let allowed_skills: HashSet<String> = registry.list().into_iter().map(|d| d.name).collect();
        coordinator.register(Agent::new(
            MAIN_AGENT_ID,
            AgentRole::Coordinator,
            allowed_skills,
            catalog.primary.clone(),
            catalog.fallbacks.first().cloned().unwrap_or_else(|| catalog.primary.clone()),
            HashSet::new(),
        ));
        return;
    }
    for definition in &agents_config.agents {
        let primary_model = definition.primary_model.clone().unwrap_or_else(|| catalog.primary.clone());
        let fallback_model = definition
            .fallback_model
            .clone()
            .unwrap_or_else(|| catalog.fallbacks.first().cloned().unwrap_or_else(|| catalog.primary.clone()));
        coordinator.register(Agent::new(
            definition.agent_id.clone(),
            definition.role,
            definition.allowed_skills.clone(),
            primary_model,
            fallback_model,
            definition.focus_tags.clone(),
        ));
    }
}
