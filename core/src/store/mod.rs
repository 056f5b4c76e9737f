//! Typed facade over the persistent store (§4.7). Skills never speak the
//! storage protocol directly; everything flows through `StoreFacade`.

mod activities;
mod goals;
mod invocations;
pub mod json_table;
mod jobs;
mod knowledge;
mod memories;
mod sessions;

pub use activities::{Activity, ActivitiesTable, ActivityFilters};
pub use goals::{Goal, GoalFilters, GoalStatus, GoalsTable};
pub use invocations::{InvocationFilters, InvocationsTable, SkillInvocationRecord};
pub use json_table::Page;
pub use jobs::{JobState, JobsTable};
pub use knowledge::{KnowledgeEntity, KnowledgeRelation, KnowledgeTable};
pub use memories::{WorkingMemoryItem, WorkingMemoryTable};
pub use sessions::{SessionKind, SessionRow, SessionState, SessionsTable};

use crate::error::Result;
use crate::memory::VectorStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Wires every table together behind one handle. Cheap to clone (an
/// `Arc` internally) so it can be threaded through the process-wide
/// `Core` and shared with every component that needs it.
#[derive(Clone)]
pub struct StoreFacade {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    goals: Arc<GoalsTable>,
    activities: Arc<ActivitiesTable>,
    working_memory: Arc<WorkingMemoryTable>,
    sessions: Arc<SessionsTable>,
    invocations: Arc<InvocationsTable>,
    knowledge: Arc<KnowledgeTable>,
    jobs: Arc<JobsTable>,
    semantic: Arc<VectorStore>,
}

impl StoreFacade {
    pub async fn open(root_dir: PathBuf, vector_dir: PathBuf, embedding_dimension: usize) -> Result<Self> {
        std::fs::create_dir_all(&root_dir)?;
        let semantic = VectorStore::new(vector_dir.to_str().unwrap_or("."), embedding_dimension).await?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                goals: Arc::new(GoalsTable::open(&root_dir)?),
                activities: Arc::new(ActivitiesTable::open(&root_dir)?),
                working_memory: Arc::new(WorkingMemoryTable::open(&root_dir)?),
                sessions: Arc::new(SessionsTable::open(&root_dir)?),
                invocations: Arc::new(InvocationsTable::open(&root_dir)?),
                knowledge: Arc::new(KnowledgeTable::open(&root_dir)?),
                jobs: Arc::new(JobsTable::open(&root_dir)?),
                semantic: Arc::new(semantic),
            }),
        })
    }

    /// Every accessor returns a cheap `Arc` clone, not a borrow, so
    /// components that need their own owned handle (the scheduler, the
    /// session manager) share the exact same in-memory table rather than
    /// racing a second file-backed copy (§5 "one writer per session").
    pub fn goals(&self) -> Arc<GoalsTable> {
        self.inner.goals.clone()
    }
    pub fn activities(&self) -> Arc<ActivitiesTable> {
        self.inner.activities.clone()
    }
    pub fn working_memory(&self) -> Arc<WorkingMemoryTable> {
        self.inner.working_memory.clone()
    }
    pub fn sessions(&self) -> Arc<SessionsTable> {
        self.inner.sessions.clone()
    }
    pub fn invocations(&self) -> Arc<InvocationsTable> {
        self.inner.invocations.clone()
    }
    pub fn knowledge(&self) -> Arc<KnowledgeTable> {
        self.inner.knowledge.clone()
    }
    pub fn jobs(&self) -> Arc<JobsTable> {
        self.inner.jobs.clone()
    }
    pub fn semantic(&self) -> Arc<VectorStore> {
        self.inner.semantic.clone()
    }
}
