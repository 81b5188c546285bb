//! Chunked upload of a single artifact.

use outbox_transfer::{ChunkReader, TransferError};
use tracing::{debug, info};

use crate::error::CollectorError;
use crate::transport::CollectorTransport;
use crate::types::{Artifact, ChunkRequest, CompletionResult};
use crate::wire::{ChunkAck, ChunkMeta};

/// Uploads one artifact as a sequence of fixed-size chunks.
///
/// Chunks are sent one at a time in ascending index order starting at 0.
/// The collector is the authority on completion: a `"completed"` response
/// stops the pass even if chunks remain, which is what lets a retry finish
/// early when the collector already holds chunks from an earlier attempt.
pub struct ChunkUploader<'a> {
    transport: &'a dyn CollectorTransport,
    chunk_size: usize,
}

impl<'a> ChunkUploader<'a> {
    pub fn new(transport: &'a dyn CollectorTransport, chunk_size: usize) -> Self {
        Self {
            transport,
            chunk_size,
        }
    }

    /// Runs one upload pass over `artifact`.
    ///
    /// Returns `completed = false` when every chunk was accepted but the
    /// collector never confirmed; deciding what that means is up to the
    /// caller. Any transport failure or rejection aborts the pass before the
    /// next chunk is sent. Nothing is deleted here.
    pub async fn upload(&self, artifact: &Artifact) -> Result<CompletionResult, CollectorError> {
        let path = artifact.path.clone();
        let chunk_size = self.chunk_size;
        let mut reader = tokio::task::spawn_blocking(move || ChunkReader::open(&path, chunk_size))
            .await
            .map_err(|e| CollectorError::Join(e.to_string()))??;

        // The content identifier was computed from the bytes at prepare time.
        if reader.file_size() != artifact.size {
            return Err(TransferError::SizeChanged {
                expected: artifact.size,
                actual: reader.file_size(),
            }
            .into());
        }

        let chunk_total = reader.layout().total;
        debug!(
            artifact = %artifact.display_name,
            content_id = %artifact.content_id,
            size = artifact.size,
            chunk_total,
            endpoint = self.transport.endpoint(),
            "starting chunked upload"
        );

        let mut chunks_sent: u32 = 0;
        let mut last_message = None;

        loop {
            let (returned, next) = tokio::task::spawn_blocking(move || {
                let chunk = reader.next_chunk();
                (reader, chunk)
            })
            .await
            .map_err(|e| CollectorError::Join(e.to_string()))?;
            reader = returned;

            let Some(chunk) = next? else {
                break;
            };

            let chunk_index = chunk.index;
            let request = ChunkRequest {
                meta: ChunkMeta {
                    file_name: artifact.display_name.clone(),
                    file_md5: artifact.content_id.to_string(),
                    chunk_index,
                    chunk_total,
                },
                data: chunk.data,
            };

            let resp = self.transport.send_chunk(request).await?;
            chunks_sent += 1;

            match resp.ack() {
                ChunkAck::Completed => {
                    info!(
                        artifact = %artifact.display_name,
                        content_id = %artifact.content_id,
                        chunks_sent,
                        chunk_total,
                        "collector reported upload complete"
                    );
                    return Ok(CompletionResult {
                        completed: true,
                        chunks_sent,
                        chunk_total,
                        server_message: resp.msg.or(resp.status),
                    });
                }
                ChunkAck::Accepted { progress } => {
                    debug!(
                        artifact = %artifact.display_name,
                        chunk_index,
                        chunk_total,
                        progress,
                        "chunk accepted"
                    );
                    last_message = resp.msg;
                }
                ChunkAck::Rejected { code, message } => {
                    return Err(CollectorError::Rejected {
                        chunk_index,
                        code,
                        message,
                    });
                }
            }
        }

        Ok(CompletionResult {
            completed: false,
            chunks_sent,
            chunk_total,
            server_message: last_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::CollectorResponse;
    use outbox_transfer::DigestAlgorithm;
    use std::future::Future;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Mutex;

    type Responder =
        Box<dyn Fn(&ChunkMeta) -> Result<CollectorResponse, CollectorError> + Send + Sync>;

    /// Records every chunk and answers with a scripted responder.
    struct MockTransport {
        sent: Mutex<Vec<(ChunkMeta, usize)>>,
        respond: Responder,
    }

    impl MockTransport {
        fn new(
            respond: impl Fn(&ChunkMeta) -> Result<CollectorResponse, CollectorError>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        /// Completes when the last chunk of the declared total arrives.
        fn completing_on_last() -> Self {
            Self::new(|meta| {
                if meta.chunk_index + 1 == meta.chunk_total {
                    Ok(completed())
                } else {
                    Ok(progress(meta.chunk_index as u64 + 1))
                }
            })
        }

        fn indices(&self) -> Vec<u32> {
            self.sent.lock().unwrap().iter().map(|(m, _)| m.chunk_index).collect()
        }
    }

    impl CollectorTransport for MockTransport {
        fn send_chunk(
            &self,
            request: ChunkRequest,
        ) -> Pin<Box<dyn Future<Output = Result<CollectorResponse, CollectorError>> + Send + '_>>
        {
            Box::pin(async move {
                let result = (self.respond)(&request.meta);
                self.sent
                    .lock()
                    .unwrap()
                    .push((request.meta, request.data.len()));
                result
            })
        }

        fn endpoint(&self) -> &str {
            "mock://collector"
        }
    }

    fn progress(n: u64) -> CollectorResponse {
        CollectorResponse {
            progress: Some(n),
            ..Default::default()
        }
    }

    fn completed() -> CollectorResponse {
        CollectorResponse {
            status: Some("completed".into()),
            ..Default::default()
        }
    }

    fn artifact(dir: &Path, name: &str, data: &[u8]) -> Artifact {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        Artifact::prepare(&path, DigestAlgorithm::Md5).unwrap()
    }

    const MIB: usize = 1024 * 1024;

    #[tokio::test]
    async fn ten_megabytes_in_five_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "big.bin", &vec![9u8; 10 * MIB]);
        let transport = MockTransport::completing_on_last();

        let result = ChunkUploader::new(&transport, 2 * MIB)
            .upload(&art)
            .await
            .unwrap();

        assert!(result.completed);
        assert_eq!(result.chunks_sent, 5);
        assert_eq!(result.chunk_total, 5);
        assert_eq!(transport.indices(), vec![0, 1, 2, 3, 4]);

        let sent = transport.sent.lock().unwrap();
        assert!(sent.iter().all(|(m, len)| *len == 2 * MIB
            && m.chunk_total == 5
            && m.file_md5 == art.content_id.as_str()
            && m.file_name == "big.bin"));
    }

    #[tokio::test]
    async fn remainder_chunk_is_short() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "odd.bin", b"0123456789");
        let transport = MockTransport::completing_on_last();

        let result = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap();
        assert!(result.completed);

        let lens: Vec<usize> = transport.sent.lock().unwrap().iter().map(|(_, l)| *l).collect();
        assert_eq!(lens, vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn early_completion_stops_sending() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "resume.bin", &[1u8; 40]);
        // Collector already holds most chunks from an earlier run.
        let transport = MockTransport::new(|meta| {
            if meta.chunk_index == 1 {
                Ok(completed())
            } else {
                Ok(progress(9))
            }
        });

        let result = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap();
        assert!(result.completed);
        assert_eq!(result.chunks_sent, 2);
        assert_eq!(result.chunk_total, 10);
        assert_eq!(transport.indices(), vec![0, 1]);
    }

    #[tokio::test]
    async fn rejection_aborts_before_next_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "bad.bin", &[1u8; 12]);
        let transport = MockTransport::new(|meta| {
            if meta.chunk_index == 1 {
                Ok(CollectorResponse {
                    code: Some(500),
                    msg: Some("md5 mismatch".into()),
                    ..Default::default()
                })
            } else {
                Ok(progress(1))
            }
        });

        let err = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Rejected { chunk_index: 1, .. }
        ));
        assert_eq!(transport.indices(), vec![0, 1]);
    }

    #[tokio::test]
    async fn transport_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "flaky.bin", &[1u8; 12]);
        let transport = MockTransport::new(|meta| {
            if meta.chunk_index == 2 {
                Err(CollectorError::Status {
                    status: 503,
                    body: String::new(),
                })
            } else {
                Ok(progress(1))
            }
        });

        let err = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap_err();
        assert!(matches!(err, CollectorError::Status { status: 503, .. }));
        assert_eq!(transport.indices(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn no_confirmation_is_reported_not_completed() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "quiet.bin", &[1u8; 8]);
        let transport = MockTransport::new(|_| Ok(progress(1)));

        let result = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap();
        assert!(!result.completed);
        assert_eq!(result.chunks_sent, 2);
    }

    #[tokio::test]
    async fn empty_artifact_sends_one_empty_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "empty.bin", b"");
        let transport = MockTransport::completing_on_last();

        let result = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap();
        assert!(result.completed);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.chunk_total, 1);
        assert_eq!(sent[0].1, 0);
    }

    #[tokio::test]
    async fn modified_artifact_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "grow.bin", b"1234");
        std::fs::write(&art.path, b"12345678").unwrap();
        let transport = MockTransport::completing_on_last();

        let err = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Transfer(TransferError::SizeChanged { .. })
        ));
        assert!(transport.indices().is_empty());
    }

    #[tokio::test]
    async fn vanished_artifact_is_local_io() {
        let dir = tempfile::tempdir().unwrap();
        let art = artifact(dir.path(), "gone.bin", b"1234");
        std::fs::remove_file(&art.path).unwrap();
        let transport = MockTransport::completing_on_last();

        let err = ChunkUploader::new(&transport, 4).upload(&art).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::LocalIo);
    }
}
