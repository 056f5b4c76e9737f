//! `memories_semantic` table: content + opaque embedding, searchable by
//! cosine similarity (§3, §6, §9 "Embedding opacity").
//!
//! The core never computes embeddings itself — the model router is the
//! embedding source (§9). Callers pass a precomputed vector; this module
//! only stores and queries it via LanceDB.

use crate::error::{AriaError, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Float64Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

const TABLE_NAME: &str = "memories_semantic";

/// A semantic memory row as persisted in the store (§3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SemanticMemory {
    pub id: String,
    pub content: String,
    pub category: String,
    pub importance: f64,
    pub metadata: serde_json::Value,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A search hit paired with its similarity-derived rank, used by the
/// cognition pipeline's RRF merge (§4.5).
#[derive(Debug, Clone)]
pub struct SemanticSearchHit {
    pub memory: SemanticMemory,
    pub rank: usize,
}

pub struct VectorStore {
    conn: Connection,
    dimension: usize,
}

impl VectorStore {
    pub async fn new(path: &str, dimension: usize) -> Result<Self> {
        let conn = connect(path)
            .execute()
            .await
            .map_err(|e| AriaError::Internal {
                message: format!("failed to connect to LanceDB at {path}: {e}"),
            })?;
        Ok(Self { conn, dimension })
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("importance", DataType::Float64, false),
            Field::new("metadata", DataType::Utf8, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    async fn get_or_create_table(&self) -> Result<Table> {
        match self.conn.open_table(TABLE_NAME).execute().await {
            Ok(table) => Ok(table),
            Err(_) => {
                let schema = self.schema();
                let batches = RecordBatchIterator::new(vec![], schema.clone());
                self.conn
                    .create_table(TABLE_NAME, Box::new(batches))
                    .execute()
                    .await
                    .map_err(|e| AriaError::Internal {
                        message: format!("failed to create {TABLE_NAME}: {e}"),
                    })
            }
        }
    }

    /// Insert a new semantic memory. Never mutated after insert (§3); the
    /// only way to remove one is through compaction (not modeled here —
    /// compaction writes a new `compressed_*` memory and leaves the raw
    /// rows in place per §4.5).
    pub async fn put_semantic(
        &self,
        content: &str,
        category: &str,
        importance: f64,
        metadata: serde_json::Value,
        embedding: Vec<f32>,
    ) -> Result<SemanticMemory> {
        if embedding.len() != self.dimension {
            return Err(AriaError::Validation {
                message: format!(
                    "embedding has {} dimensions, catalog declares {}",
                    embedding.len(),
                    self.dimension
                ),
            });
        }
        let memory = SemanticMemory {
            id: crate::util::new_id("mem_"),
            content: content.to_string(),
            category: category.to_string(),
            importance,
            metadata,
            embedding: embedding.clone(),
            created_at: crate::util::now(),
        };

        let schema = self.schema();
        let id_array = StringArray::from(vec![memory.id.clone()]);
        let content_array = StringArray::from(vec![memory.content.clone()]);
        let category_array = StringArray::from(vec![memory.category.clone()]);
        let importance_array = Float64Array::from(vec![memory.importance]);
        let metadata_array = StringArray::from(vec![memory.metadata.to_string()]);
        let flat = Float32Array::from(embedding);
        let embedding_array =
            FixedSizeListArray::try_new_from_values(flat, self.dimension as i32).map_err(
                |e| AriaError::Internal {
                    message: format!("failed to build embedding array: {e}"),
                },
            )?;
        let created_at_array = StringArray::from(vec![memory.created_at.to_rfc3339()]);

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(id_array),
                Arc::new(content_array),
                Arc::new(category_array),
                Arc::new(importance_array),
                Arc::new(metadata_array),
                Arc::new(embedding_array),
                Arc::new(created_at_array),
            ],
        )
        .map_err(|e| AriaError::Internal {
            message: format!("failed to build record batch: {e}"),
        })?;

        let table = self.get_or_create_table().await?;
        table
            .add(Box::new(RecordBatchIterator::new(vec![Ok(batch)], schema)))
            .execute()
            .await
            .map_err(|e| AriaError::Internal {
                message: format!("failed to insert semantic memory: {e}"),
            })?;

        Ok(memory)
    }

    /// Cosine-similarity search against a precomputed query embedding,
    /// restricted to `min_importance` and, optionally, `category` (§4.7).
    pub async fn search_semantic(
        &self,
        query_embedding: Vec<f32>,
        k: usize,
        min_importance: f64,
        category: Option<&str>,
    ) -> Result<Vec<SemanticSearchHit>> {
        let table = self.get_or_create_table().await?;
        let results = table
            .query()
            .nearest_to(query_embedding)
            .map_err(|e| AriaError::Internal {
                message: format!("failed to build nearest-to query: {e}"),
            })?
            .limit(k.max(1) * 4) // over-fetch, then filter client-side
            .execute()
            .await
            .map_err(|e| AriaError::Internal {
                message: format!("semantic search failed: {e}"),
            })?;

        let batches: Vec<RecordBatch> =
            results
                .try_collect()
                .await
                .map_err(|e| AriaError::Internal {
                    message: format!("failed to collect search results: {e}"),
                })?;

        let mut hits = Vec::new();
        for batch in &batches {
            let ids = column_str(batch, "id")?;
            let contents = column_str(batch, "content")?;
            let categories = column_str(batch, "category")?;
            let importances = column_f64(batch, "importance")?;
            let metadatas = column_str(batch, "metadata")?;
            let created_ats = column_str(batch, "created_at")?;

            for i in 0..batch.num_rows() {
                if importances.value(i) < min_importance {
                    continue;
                }
                if let Some(filter) = category {
                    if categories.value(i) != filter {
                        continue;
                    }
                }
                let metadata = serde_json::from_str(metadatas.value(i))
                    .unwrap_or(serde_json::Value::Null);
                let created_at = chrono::DateTime::parse_from_rfc3339(created_ats.value(i))
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .unwrap_or_else(|_| crate::util::now());
                hits.push(SemanticMemory {
                    id: ids.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    category: categories.value(i).to_string(),
                    importance: importances.value(i),
                    metadata,
                    embedding: Vec::new(),
                    created_at,
                });
            }
        }

        hits.truncate(k);
        Ok(hits
            .into_iter()
            .enumerate()
            .map(|(idx, memory)| SemanticSearchHit {
                memory,
                rank: idx + 1,
            })
            .collect())
    }
}

fn column_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AriaError::Internal {
            message: format!("column {name} missing or wrong type"),
        })
}

fn column_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| AriaError::Internal {
            message: format!("column {name} missing or wrong type"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_wrong_dimension_embedding() {
        let dir = std::env::temp_dir().join(format!("aria-vec-test-{}", uuid::Uuid::new_v4()));
        let store = VectorStore::new(dir.to_str().unwrap(), 4).await.unwrap();
        let err = store
            .put_semantic("hello", "note", 0.5, serde_json::json!({}), vec![0.0; 3])
            .await
            .unwrap_err();
        assert!(matches!(err, AriaError::Validation { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn put_then_search_round_trips() {
        let dir = std::env::temp_dir().join(format!("aria-vec-test-{}", uuid::Uuid::new_v4()));
        let store = VectorStore::new(dir.to_str().unwrap(), 3).await.unwrap();
        store
            .put_semantic(
                "the user prefers dark mode",
                "preference",
                0.8,
                serde_json::json!({"source": "chat"}),
                vec![1.0, 0.0, 0.0],
            )
            .await
            .unwrap();

        let hits = store
            .search_semantic(vec![1.0, 0.0, 0.0], 5, 0.0, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].memory.content, "the user prefers dark mode");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
