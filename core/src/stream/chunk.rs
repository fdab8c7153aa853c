use bytes::Bytes;

/// Unit of work flowing through the pipeline.
///
/// `id` is assigned once by the coordinator when the reader hands in a
/// payload and is the only ordering key. The payload is never mutated after
/// handoff; a stage that transforms it builds a new `Chunk` with the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: u64,
    pub payload: Bytes,
}

impl Chunk {
    pub fn new(id: u64, payload: Bytes) -> Self {
        Self { id, payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
