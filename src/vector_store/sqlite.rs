//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and cosine similarity is computed
//! in Rust over the whole collection.

use super::{
    cosine_similarity, rank, validate_batch, validate_query, Collection, CollectionInfo,
    EntryMetadata, QueryMatch, VectorStore,
};
use crate::error::{DocQaError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Database file name inside the storage directory.
pub const DATABASE_FILE: &str = "index.sqlite3";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimension INTEGER,
    next_id INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    collection TEXT NOT NULL REFERENCES collections(name),
    id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    document TEXT NOT NULL,
    headings TEXT NOT NULL,
    page INTEGER,
    content_type TEXT,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_entries_seq ON entries(collection, seq);
"#;

type SharedConnection = Arc<Mutex<Connection>>;

fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| DocQaError::Store(format!("Failed to acquire lock: {}", e)))
}

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: SharedConnection,
}

impl SqliteVectorStore {
    /// Open (or create) the store inside `dir`.
    #[instrument(skip_all)]
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DATABASE_FILE);

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self))]
    async fn get_or_create(&self, name: &str) -> Result<Arc<dyn Collection>> {
        let conn = lock(&self.conn)?;
        let created = conn.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        if created > 0 {
            info!("Created collection {}", name);
        }

        Ok(Arc::new(SqliteCollection {
            name: name.to_string(),
            conn: Arc::clone(&self.conn),
        }))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.name, c.dimension, c.created_at,
                   (SELECT COUNT(*) FROM entries e WHERE e.collection = c.name)
            FROM collections c
            ORDER BY c.name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let dimension: Option<i64> = row.get(1)?;
            let created_at: String = row.get(2)?;
            let count: i64 = row.get(3)?;
            Ok(CollectionInfo {
                name: row.get(0)?,
                count: count as usize,
                dimension: dimension.map(|d| d as usize),
                created_at: parse_timestamp(&created_at),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// A collection inside a [`SqliteVectorStore`].
pub struct SqliteCollection {
    name: String,
    conn: SharedConnection,
}

impl SqliteCollection {
    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn read_dimension(conn: &Connection, name: &str) -> Result<Option<usize>> {
        let dimension: Option<Option<i64>> = conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match dimension {
            Some(d) => Ok(d.map(|d| d as usize)),
            None => Err(DocQaError::Store(format!("Collection {} does not exist", name))),
        }
    }
}

#[async_trait]
impl Collection for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(collection = %self.name, count = ids.len()))]
    async fn insert(
        &self,
        ids: &[String],
        embeddings: &[Vec<f32>],
        texts: &[String],
        metadatas: &[EntryMetadata],
    ) -> Result<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let current = Self::read_dimension(&tx, &self.name)?;
        let dimension = validate_batch(ids, embeddings, texts, metadatas, current)?;
        if ids.is_empty() {
            return Ok(());
        }

        {
            let mut exists =
                tx.prepare("SELECT 1 FROM entries WHERE collection = ?1 AND id = ?2")?;
            for id in ids {
                if exists.exists(params![self.name, id])? {
                    return Err(DocQaError::Store(format!("Id already exists: {}", id)));
                }
            }
        }

        if current.is_none() {
            tx.execute(
                "UPDATE collections SET dimension = ?1 WHERE name = ?2",
                params![dimension.map(|d| d as i64), self.name],
            )?;
        }

        let first_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM entries WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        let indexed_at = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO entries
                (collection, id, seq, embedding, document, headings, page, content_type, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;

            for (offset, (((id, embedding), text), metadata)) in ids
                .iter()
                .zip(embeddings)
                .zip(texts)
                .zip(metadatas)
                .enumerate()
            {
                stmt.execute(params![
                    self.name,
                    id,
                    first_seq + offset as i64,
                    Self::embedding_to_bytes(embedding),
                    text,
                    metadata.headings,
                    metadata.page,
                    metadata.content_type,
                    indexed_at,
                ])?;
            }
        }

        tx.commit()?;
        debug!("Inserted {} entries into {}", ids.len(), self.name);
        Ok(())
    }

    #[instrument(skip(self, embedding), fields(collection = %self.name))]
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<QueryMatch>> {
        let conn = lock(&self.conn)?;
        let dimension = Self::read_dimension(&conn, &self.name)?;
        validate_query(embedding, dimension)?;
        if k == 0 || dimension.is_none() {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT id, seq, embedding, document, headings, page, content_type
            FROM entries
            WHERE collection = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![self.name], |row| {
            let seq: i64 = row.get(1)?;
            let embedding_bytes: Vec<u8> = row.get(2)?;
            let stored = Self::bytes_to_embedding(&embedding_bytes);

            Ok((
                seq,
                QueryMatch {
                    id: row.get(0)?,
                    text: row.get(3)?,
                    metadata: EntryMetadata {
                        headings: row.get(4)?,
                        page: row.get(5)?,
                        content_type: row.get(6)?,
                    },
                    score: cosine_similarity(embedding, &stored),
                },
            ))
        })?;

        let candidates = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        let results = rank(candidates, k);

        debug!("Found {} matching entries", results.len());
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        let conn = lock(&self.conn)?;
        Self::read_dimension(&conn, &self.name)
    }

    async fn allocate_ids(&self, n: usize) -> Result<Vec<String>> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let start: i64 = tx
            .query_row(
                "SELECT next_id FROM collections WHERE name = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DocQaError::Store(format!("Collection {} does not exist", self.name)))?;

        tx.execute(
            "UPDATE collections SET next_id = next_id + ?1 WHERE name = ?2",
            params![n as i64, self.name],
        )?;
        tx.commit()?;

        Ok((start..start + n as i64).map(|id| id.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::fixtures::batch;

    #[tokio::test]
    async fn test_insert_and_query() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let collection = store.get_or_create("document_chunks").await.unwrap();

        let b = batch(&[
            ("0", vec![1.0, 0.0, 0.0], "Hello world"),
            ("1", vec![0.0, 1.0, 0.0], "Goodbye world"),
        ]);
        collection
            .insert(&b.ids, &b.embeddings, &b.texts, &b.metadatas)
            .await
            .unwrap();

        assert_eq!(collection.count().await.unwrap(), 2);
        assert_eq!(collection.dimension().await.unwrap(), Some(3));

        let results = collection.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "Hello world");
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].metadata.content_type.as_deref(), Some("TXT"));
    }

    #[tokio::test]
    async fn test_rejected_batch_writes_nothing() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let collection = store.get_or_create("c").await.unwrap();

        let b = batch(&[("0", vec![1.0, 0.0], "first")]);
        collection
            .insert(&b.ids, &b.embeddings, &b.texts, &b.metadatas)
            .await
            .unwrap();

        // Existing id
        let dup = batch(&[("1", vec![0.0, 1.0], "new"), ("0", vec![1.0, 1.0], "again")]);
        let err = collection
            .insert(&dup.ids, &dup.embeddings, &dup.texts, &dup.metadatas)
            .await
            .unwrap_err();
        assert!(matches!(err, DocQaError::Store(_)));

        // Wrong dimension
        let wide = batch(&[("2", vec![1.0, 0.0, 0.0], "wide")]);
        let err = collection
            .insert(&wide.ids, &wide.embeddings, &wide.texts, &wide.metadatas)
            .await
            .unwrap_err();
        assert!(matches!(err, DocQaError::Store(_)));

        assert_eq!(collection.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_and_empty() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let collection = store.get_or_create("c").await.unwrap();
        assert!(collection.query(&[1.0, 0.0], 5).await.unwrap().is_empty());

        let b = batch(&[("0", vec![1.0, 0.0], "x")]);
        collection
            .insert(&b.ids, &b.embeddings, &b.texts, &b.metadatas)
            .await
            .unwrap();

        let err = collection.query(&[1.0, 0.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, DocQaError::Store(_)));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SqliteVectorStore::open(dir.path()).unwrap();
            let collection = store.get_or_create("document_chunks").await.unwrap();
            let ids = collection.allocate_ids(2).await.unwrap();
            assert_eq!(ids, vec!["0", "1"]);

            let b = batch(&[("0", vec![0.6, 0.8], "kept"), ("1", vec![0.8, 0.6], "also kept")]);
            collection
                .insert(&b.ids, &b.embeddings, &b.texts, &b.metadatas)
                .await
                .unwrap();
        }

        assert!(dir.path().join(DATABASE_FILE).exists());

        let store = SqliteVectorStore::open(dir.path()).unwrap();
        let collection = store.get_or_create("document_chunks").await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 2);
        assert_eq!(collection.allocate_ids(1).await.unwrap(), vec!["2"]);

        let infos = store.list_collections().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].count, 2);
        assert_eq!(infos[0].dimension, Some(2));
    }
}
