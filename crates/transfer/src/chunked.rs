use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::types::{Chunk, ChunkLayout};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Reads an artifact as a sequence of fixed-size, index-addressed chunks.
///
/// Chunks are yielded in ascending index order starting at 0. The layout is
/// fixed when the reader is opened; if the file shrinks underneath the
/// reader, [`TransferError::SizeChanged`] is returned instead of a short chunk.
pub struct ChunkReader {
    file: std::fs::File,
    layout: ChunkLayout,
    next_index: u32,
    offset: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (2 MiB) is used.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            layout: ChunkLayout::new(file_size, chunk_size),
            next_index: 0,
            offset: 0,
        })
    }

    /// Reads the next chunk. Returns `None` once every chunk has been read.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        if self.next_index >= self.layout.total {
            return Ok(None);
        }

        let len = self.layout.chunk_len(self.next_index);
        let mut data = vec![0u8; len];
        if let Err(e) = self.file.read_exact(&mut data) {
            if e.kind() == ErrorKind::UnexpectedEof {
                let actual = self.file.metadata()?.len();
                return Err(TransferError::SizeChanged {
                    expected: self.layout.file_size,
                    actual,
                });
            }
            return Err(e.into());
        }

        let chunk = Chunk {
            index: self.next_index,
            offset: self.offset,
            data,
        };
        self.next_index += 1;
        self.offset += len as u64;
        Ok(Some(chunk))
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Total file size in bytes, as observed when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.layout.file_size
    }

    /// Number of chunks not yet read.
    pub fn remaining_chunks(&self) -> u32 {
        self.layout.total - self.next_index
    }
}
