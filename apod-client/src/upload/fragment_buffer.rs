use bytes::{Bytes, BytesMut};

/// Chunks a recorder produced since the last flush, in arrival order.
#[derive(Debug, Default)]
pub struct FragmentBuffer {
    chunks: Vec<Bytes>,
    len: usize,
}

impl FragmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Total payload size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenate and clear in one step.
    pub fn take(&mut self) -> Bytes {
        let chunks = std::mem::take(&mut self.chunks);
        self.len = 0;

        match chunks.len() {
            0 => Bytes::new(),
            1 => chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let mut blob = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    blob.extend_from_slice(&chunk);
                }
                blob.freeze()
            }
        }
    }
}
