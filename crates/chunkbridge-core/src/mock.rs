//! Synthetic chunk records.
//!
//! Every value is derived from the document and chunk position, and the
//! embedding from the text alone, so two runs with the same timestamp and
//! first id produce identical rows.

use chunkbridge_store::ChunkRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Body shared by every mock chunk.
pub const DEMO_TEXT: &str = "This is a demo text to insert into Milvus.";

/// Deterministic pseudo-random embedding for `text`.
///
/// The PRNG is seeded with the first 8 bytes of SHA-256(text), read
/// big-endian, and yields `dim` values uniform in `[-1, 1)`.
pub fn fake_embedding(text: &str, dim: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_be_bytes(seed));
    (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// Label of the `doc`-th mock document, e.g. `doc_0003`.
pub fn document_label(doc: i64) -> String {
    format!("doc_{:04}", doc)
}

/// Source URI of the `doc`-th mock document.
pub fn document_source(doc: i64) -> String {
    format!("mock://{}", document_label(doc))
}

/// Text of one mock chunk.
pub fn chunk_text(doc: i64, chunk: i64, created_at: &str) -> String {
    format!(
        "[{}] chunk={} {} source={} created_at={}",
        document_label(doc),
        chunk,
        DEMO_TEXT,
        document_source(doc),
        created_at
    )
}

/// Parameters of a mock data set.
#[derive(Debug, Clone)]
pub struct MockPlan {
    pub docs: u32,
    pub chunks_per_doc: u32,
    pub first_id: i64,
    pub dim: usize,
    pub created_at: String,
}

impl MockPlan {
    /// Total number of chunks the plan yields.
    pub fn total(&self) -> u64 {
        u64::from(self.docs) * u64::from(self.chunks_per_doc)
    }

    /// Lazily generate the chunks, documents in order, chunks within each.
    pub fn chunks(&self) -> MockChunks<'_> {
        MockChunks {
            plan: self,
            doc: 0,
            chunk: 0,
            next_id: self.first_id,
        }
    }
}

/// Iterator over the records of a [`MockPlan`].
pub struct MockChunks<'a> {
    plan: &'a MockPlan,
    doc: u32,
    chunk: u32,
    next_id: i64,
}

impl Iterator for MockChunks<'_> {
    type Item = ChunkRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.plan.chunks_per_doc == 0 || self.doc >= self.plan.docs {
            return None;
        }

        let doc = i64::from(self.doc);
        let chunk = i64::from(self.chunk);
        let text = chunk_text(doc, chunk, &self.plan.created_at);
        let embedding = fake_embedding(&text, self.plan.dim);
        let record = ChunkRecord::new(self.next_id, doc, chunk, text, embedding)
            .with_source(document_source(doc))
            .with_created_at(self.plan.created_at.clone());

        self.next_id += 1;
        self.chunk += 1;
        if self.chunk >= self.plan.chunks_per_doc {
            self.chunk = 0;
            self.doc += 1;
        }
        Some(record)
    }
}
