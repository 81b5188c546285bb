/// One fixed-size slice of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position of this chunk in the artifact.
    pub index: u32,
    /// Byte offset of the first byte of `data` within the artifact.
    pub offset: u64,
    /// Raw chunk bytes. Only the final chunk may be shorter than the chunk size.
    pub data: Vec<u8>,
}

/// How an artifact of a given size is split into chunks.
///
/// The layout is a pure function of the size and chunk size, so every retry
/// of the same artifact declares the same chunk total to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    pub file_size: u64,
    pub chunk_size: usize,
    pub total: u32,
}

impl ChunkLayout {
    /// Computes the layout for `file_size` bytes.
    ///
    /// A zero-byte artifact is still sent as one (empty) chunk so the
    /// collector can register its completion.
    pub fn new(file_size: u64, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let total = file_size.div_ceil(chunk_size as u64).max(1);
        Self {
            file_size,
            chunk_size,
            total: u32::try_from(total).unwrap_or(u32::MAX),
        }
    }

    /// Length in bytes of the chunk at `index`.
    pub fn chunk_len(&self, index: u32) -> usize {
        let start = index as u64 * self.chunk_size as u64;
        let remaining = self.file_size.saturating_sub(start);
        remaining.min(self.chunk_size as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn exact_multiple() {
        let layout = ChunkLayout::new(10 * MIB as u64, 2 * MIB);
        assert_eq!(layout.total, 5);
        assert_eq!(layout.chunk_len(4), 2 * MIB);
    }

    #[test]
    fn remainder_chunk() {
        let layout = ChunkLayout::new(5 * MIB as u64 + 3, 2 * MIB);
        assert_eq!(layout.total, 3);
        assert_eq!(layout.chunk_len(0), 2 * MIB);
        assert_eq!(layout.chunk_len(2), MIB + 3);
    }

    #[test]
    fn smaller_than_one_chunk() {
        let layout = ChunkLayout::new(10, 2 * MIB);
        assert_eq!(layout.total, 1);
        assert_eq!(layout.chunk_len(0), 10);
    }

    #[test]
    fn empty_file_is_one_empty_chunk() {
        let layout = ChunkLayout::new(0, 2 * MIB);
        assert_eq!(layout.total, 1);
        assert_eq!(layout.chunk_len(0), 0);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let layout = ChunkLayout::new(3, 0);
        assert_eq!(layout.chunk_size, 1);
        assert_eq!(layout.total, 3);
    }
}
