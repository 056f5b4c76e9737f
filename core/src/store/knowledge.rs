//! Knowledge graph tables: entities and relations (§3, §4.7, §8 "Idempotent
//! knowledge sync").

use super::json_table::JsonTable;
use crate::error::Result;
use crate::util::now;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntity {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub properties: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub auto_generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRelation {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub relation_type: String,
    pub properties: serde_json::Value,
    pub auto_generated: bool,
}

pub struct KnowledgeTable {
    entities: JsonTable<KnowledgeEntity>,
    relations: JsonTable<KnowledgeRelation>,
}

impl KnowledgeTable {
    pub fn open(root: &std::path::Path) -> Result<Self> {
        Ok(Self {
            entities: JsonTable::open(root.join("knowledge_entities.json"))?,
            relations: JsonTable::open(root.join("knowledge_relations.json"))?,
        })
    }

    /// Upsert by `(name, entity_type)`: re-running auto-generation twice
    /// yields the same entity id (§8 idempotency).
    pub fn upsert_entity(
        &self,
        name: &str,
        entity_type: &str,
        properties: serde_json::Value,
        auto_generated: bool,
    ) -> Result<KnowledgeEntity> {
        self.entities.mutate(|rows| {
            if let Some(existing) = rows
                .iter_mut()
                .find(|e| e.name == name && e.entity_type == entity_type)
            {
                existing.properties = properties;
                return existing.clone();
            }
            let entity = KnowledgeEntity {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                entity_type: entity_type.to_string(),
                properties,
                created_at: now(),
                auto_generated,
            };
            rows.push(entity.clone());
            entity
        })
    }

    /// Upsert by `(from_id, to_id, relation_type)`.
    pub fn upsert_relation(
        &self,
        from_id: &str,
        to_id: &str,
        relation_type: &str,
        properties: serde_json::Value,
        auto_generated: bool,
    ) -> Result<KnowledgeRelation> {
        self.relations.mutate(|rows| {
            if let Some(existing) = rows.iter_mut().find(|r| {
                r.from_id == from_id && r.to_id == to_id && r.relation_type == relation_type
            }) {
                existing.properties = properties;
                return existing.clone();
            }
            let relation = KnowledgeRelation {
                id: uuid::Uuid::new_v4().to_string(),
                from_id: from_id.to_string(),
                to_id: to_id.to_string(),
                relation_type: relation_type.to_string(),
                properties,
                auto_generated,
            };
            rows.push(relation.clone());
            relation
        })
    }

    /// Breadth-first traversal from `start` up to `max_depth` hops,
    /// restricted to `relation_type` when given. Cycle-free: a node is
    /// never visited twice within one traversal.
    pub fn traverse(
        &self,
        start: &str,
        max_depth: usize,
        relation_type: Option<&str>,
    ) -> Vec<KnowledgeEntity> {
        let relations = self.relations.with_rows(|rows| rows.to_vec());
        let entities = self.entities.with_rows(|rows| rows.to_vec());

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.to_string());
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((start.to_string(), 0));
        let mut result = Vec::new();

        while let Some((node_id, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for relation in relations.iter().filter(|r| r.from_id == node_id) {
                if let Some(filter) = relation_type {
                    if relation.relation_type != filter {
                        continue;
                    }
                }
                if visited.insert(relation.to_id.clone()) {
                    if let Some(entity) = entities.iter().find(|e| e.id == relation.to_id) {
                        result.push(entity.clone());
                    }
                    queue.push_back((relation.to_id.clone(), depth + 1));
                }
            }
        }
        result
    }

    /// Hard-delete every auto-generated entity and relation, plus any
    /// relation left dangling by that deletion (§11 open-question
    /// resolution — `auto_generated` is wiped and rebuilt idempotently).
    pub fn clear_auto_generated(&self) -> Result<()> {
        let remaining_ids: HashSet<String> = self.entities.mutate(|rows| {
            rows.retain(|e| !e.auto_generated);
            rows.iter().map(|e| e.id.clone()).collect()
        })?;

        self.relations.mutate(|rows| {
            rows.retain(|r| {
                !r.auto_generated
                    && remaining_ids.contains(&r.from_id)
                    && remaining_ids.contains(&r.to_id)
            });
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aria-knowledge-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn upsert_entity_is_idempotent() {
        let dir = temp_dir();
        let table = KnowledgeTable::open(&dir).unwrap();
        let a = table
            .upsert_entity("rust", "topic", serde_json::json!({}), true)
            .unwrap();
        let b = table
            .upsert_entity("rust", "topic", serde_json::json!({"v": 2}), true)
            .unwrap();
        assert_eq!(a.id, b.id);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn traverse_is_cycle_free() {
        let dir = temp_dir();
        let table = KnowledgeTable::open(&dir).unwrap();
        let a = table
            .upsert_entity("a", "t", serde_json::json!({}), false)
            .unwrap();
        let b = table
            .upsert_entity("b", "t", serde_json::json!({}), false)
            .unwrap();
        table
            .upsert_relation(&a.id, &b.id, "relates_to", serde_json::json!({}), false)
            .unwrap();
        table
            .upsert_relation(&b.id, &a.id, "relates_to", serde_json::json!({}), false)
            .unwrap();

        let reached = table.traverse(&a.id, 5, None);
        assert_eq!(reached.len(), 1);
        assert_eq!(reached[0].id, b.id);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn clear_auto_generated_drops_dangling_relations() {
        let dir = temp_dir();
        let table = KnowledgeTable::open(&dir).unwrap();
        let auto = table
            .upsert_entity("auto", "t", serde_json::json!({}), true)
            .unwrap();
        let manual = table
            .upsert_entity("manual", "t", serde_json::json!({}), false)
            .unwrap();
        table
            .upsert_relation(&manual.id, &auto.id, "refers_to", serde_json::json!({}), false)
            .unwrap();

        table.clear_auto_generated().unwrap();

        let remaining = table.traverse(&manual.id, 1, None);
        assert!(remaining.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
