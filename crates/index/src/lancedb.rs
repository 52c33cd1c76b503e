//! LanceDB-backed vector index implementation.

use crate::filter::{escape_sql, Filter};
use crate::types::{Gender, ProfileMetadata, ProfileRecord, QueryMatch};
use crate::vector_index::{cosine_similarity, is_zero_vector, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, ListArray, RecordBatch,
    RecordBatchIterator, StringArray, UInt32Array,
};
use arrow_buffer::OffsetBuffer;
use arrow_schema::{DataType, Field, Schema};
use chrono::TimeZone;
use futures::TryStreamExt;
use kindred_core::{AppError, AppResult};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// LanceDB-backed vector index for profile records.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Create or open a LanceDB index at the specified path.
    ///
    /// # Arguments
    /// * `db_path` - Directory path for the LanceDB database
    /// * `table_name` - Name of the table (typically "profiles")
    /// * `embedding_dim` - Dimension of embedding vectors (e.g., 1536)
    pub async fn new(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.contains(&table_name.to_string()) {
            conn.open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Index(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized LanceDB index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Arrow schema for the profiles table.
    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("owner_id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("gender", DataType::Utf8, false),
            Field::new("location", DataType::Utf8, false),
            Field::new("age", DataType::UInt32, false),
            Field::new(
                "insights",
                DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
                false,
            ),
            Field::new("narrative", DataType::Utf8, false),
            Field::new("match_id", DataType::Utf8, false),
            Field::new("created_at", DataType::Int64, false), // Unix timestamp
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Convert a ProfileRecord to a single-row Arrow RecordBatch.
    fn record_to_batch(&self, record: &ProfileRecord) -> AppResult<RecordBatch> {
        let schema = Self::create_schema(self.embedding_dim);
        let metadata = &record.metadata;

        if record.embedding.len() != self.embedding_dim {
            return Err(AppError::DimensionMismatch {
                expected: self.embedding_dim,
                actual: record.embedding.len(),
            });
        }

        let id_array = StringArray::from(vec![record.id.as_str()]);
        let owner_id_array = StringArray::from(vec![metadata.owner_id.as_str()]);
        let name_array = StringArray::from(vec![metadata.name.as_str()]);
        let gender_array = StringArray::from(vec![metadata.gender.as_str()]);
        let location_array = StringArray::from(vec![metadata.location.as_str()]);
        let age_array = UInt32Array::from(vec![metadata.age]);

        // Insights as a single-row List<Utf8>
        let insight_values =
            StringArray::from(metadata.insights.iter().map(String::as_str).collect::<Vec<_>>());
        let insight_offsets = vec![0_i32, insight_values.len() as i32];
        let insights_array = ListArray::try_new(
            Arc::new(Field::new("item", DataType::Utf8, true)),
            OffsetBuffer::new(insight_offsets.into()),
            Arc::new(insight_values),
            None,
        )
        .map_err(|e| AppError::Index(format!("Failed to create insights array: {}", e)))?;

        let narrative_array = StringArray::from(vec![metadata.narrative.as_str()]);
        let match_id_array = StringArray::from(vec![metadata.match_id.as_str()]);
        let created_at_array = Int64Array::from(vec![metadata.created_at.timestamp()]);

        let embedding_values = Float32Array::from(record.embedding.clone());
        let embedding_array = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(embedding_values),
            None,
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(owner_id_array),
                Arc::new(name_array),
                Arc::new(gender_array),
                Arc::new(location_array),
                Arc::new(age_array),
                Arc::new(insights_array),
                Arc::new(narrative_array),
                Arc::new(match_id_array),
                Arc::new(created_at_array),
                Arc::new(embedding_array),
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert one Arrow RecordBatch row back into a ProfileRecord.
    fn batch_to_record(&self, batch: &RecordBatch, row_idx: usize) -> AppResult<ProfileRecord> {
        let string_column = |idx: usize, name: &str| -> AppResult<String> {
            Ok(batch
                .column(idx)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| AppError::Index(format!("Invalid {} column", name)))?
                .value(row_idx)
                .to_string())
        };

        let id = string_column(0, "id")?;
        let owner_id = string_column(1, "owner_id")?;
        let name = string_column(2, "name")?;
        let gender = Gender::parse(&string_column(3, "gender")?)
            .map_err(|e| AppError::Index(format!("Invalid gender column: {}", e)))?;
        let location = string_column(4, "location")?;

        let age = batch
            .column(5)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| AppError::Index("Invalid age column".to_string()))?
            .value(row_idx);

        let insights_list = batch
            .column(6)
            .as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| AppError::Index("Invalid insights column".to_string()))?;
        let insight_values_ref = insights_list.value(row_idx);
        let insight_values = insight_values_ref
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| AppError::Index("Invalid insights values".to_string()))?;
        let insights: Vec<String> = (0..insight_values.len())
            .map(|i| insight_values.value(i).to_string())
            .collect();

        let narrative = string_column(7, "narrative")?;
        let match_id = string_column(8, "match_id")?;

        let created_at_secs = batch
            .column(9)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| AppError::Index("Invalid created_at column".to_string()))?
            .value(row_idx);
        let created_at = chrono::Utc
            .timestamp_opt(created_at_secs, 0)
            .single()
            .ok_or_else(|| AppError::Index("Invalid created_at timestamp".to_string()))?;

        let embedding_list = batch
            .column(10)
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| AppError::Index("Invalid embedding column".to_string()))?;
        let embedding_values_ref = embedding_list.value(row_idx);
        let embedding_values = embedding_values_ref
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| AppError::Index("Invalid embedding values".to_string()))?;
        let embedding: Vec<f32> = (0..embedding_values.len())
            .map(|i| embedding_values.value(i))
            .collect();

        Ok(ProfileRecord {
            id,
            embedding,
            metadata: ProfileMetadata {
                owner_id,
                name,
                gender,
                location,
                age,
                insights,
                narrative,
                match_id,
                created_at,
            },
        })
    }

    /// SQL predicate matching any of the given ids.
    fn ids_predicate(ids: &[String]) -> String {
        let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", escape_sql(id))).collect();
        format!("id IN ({})", quoted.join(", "))
    }

    /// Collect result batches from a metadata-only scan.
    async fn scan(&self, predicate: Option<String>, limit: usize) -> AppResult<Vec<RecordBatch>> {
        let mut query = self.table.query().limit(limit);
        if let Some(predicate) = predicate {
            query = query.only_if(predicate);
        }

        query
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to execute scan: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Index(format!("Failed to collect results: {}", e)))
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn dimensions(&self) -> usize {
        self.embedding_dim
    }

    async fn upsert(&self, records: &[ProfileRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Convert (and validate) everything before deleting anything
        let batches: Vec<RecordBatch> = records
            .iter()
            .map(|record| self.record_to_batch(record))
            .collect::<AppResult<Vec<_>>>()?;

        let schema = batches[0].schema();
        let combined_batch = arrow_select::concat::concat_batches(&schema, &batches)
            .map_err(|e| AppError::Index(format!("Failed to concat batches: {}", e)))?;

        // Full-replace semantics: drop any existing rows for these ids
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        self.table
            .delete(&Self::ids_predicate(&ids))
            .await
            .map_err(|e| AppError::Index(format!("Failed to replace existing rows: {}", e)))?;

        self.table
            .add(RecordBatchIterator::new(
                vec![Ok(combined_batch.clone())],
                combined_batch.schema(),
            ))
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to add records: {}", e)))?;

        tracing::debug!("Upserted {} records into LanceDB", records.len());
        Ok(())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, ProfileRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let batches = self
            .scan(Some(Self::ids_predicate(ids)), ids.len())
            .await?;

        let mut records = HashMap::new();
        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let record = self.batch_to_record(batch, row_idx)?;
                records.insert(record.id.clone(), record);
            }
        }

        Ok(records)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Filter,
        include_metadata: bool,
    ) -> AppResult<Vec<QueryMatch>> {
        if vector.len() != self.embedding_dim {
            return Err(AppError::DimensionMismatch {
                expected: self.embedding_dim,
                actual: vector.len(),
            });
        }

        let predicate = filter.to_sql();

        let batches = if is_zero_vector(vector) {
            // Metadata-only degenerate mode: no semantic ranking
            self.scan(predicate, top_k).await?
        } else {
            let mut query = self
                .table
                .query()
                .nearest_to(vector.to_vec())
                .map_err(|e| AppError::Index(format!("Failed to create query: {}", e)))?
                .limit(top_k);
            if let Some(predicate) = predicate {
                query = query.only_if(predicate);
            }

            query
                .execute()
                .await
                .map_err(|e| AppError::Index(format!("Failed to execute search: {}", e)))?
                .try_collect::<Vec<_>>()
                .await
                .map_err(|e| AppError::Index(format!("Failed to collect results: {}", e)))?
        };

        let mut matches = Vec::new();
        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let record = match self.batch_to_record(batch, row_idx) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Failed to convert result row {}: {}", row_idx, e);
                        continue;
                    }
                };

                let score = if is_zero_vector(vector) {
                    0.0
                } else {
                    cosine_similarity(vector, &record.embedding)
                };

                matches.push(QueryMatch {
                    id: record.id,
                    score,
                    metadata: include_metadata.then_some(record.metadata),
                });
            }
        }

        if !is_zero_vector(vector) {
            matches.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        matches.truncate(top_k);

        tracing::debug!("Retrieved {} matches (requested top-{})", matches.len(), top_k);

        Ok(matches)
    }
}
