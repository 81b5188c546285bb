fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use outbox_collector::{ChunkAck, ChunkMeta, CollectorResponse};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn decode<T: serde::de::DeserializeOwned>(name: &str) -> T {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = decode(name);
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  collector: {fixture}\n  agent:     {reserialized}"
        );
    }

    // --- Request side ---

    #[test]
    fn fixture_chunk_meta() {
        roundtrip_test::<ChunkMeta>("chunk_meta.json");

        let meta: ChunkMeta = decode("chunk_meta.json");
        assert_eq!(meta.chunk_index, 2);
        assert_eq!(meta.chunk_total, 5);
    }

    #[test]
    fn chunk_meta_field_names_match_collector_form() {
        let meta = ChunkMeta {
            file_name: "a.zip".into(),
            file_md5: "d41d8cd98f00b204e9800998ecf8427e".into(),
            chunk_index: 0,
            chunk_total: 1,
        };
        let value = serde_json::to_value(&meta).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["chunk_index", "chunk_total", "file_md5", "file_name"]);
    }

    // --- Response side ---

    #[test]
    fn fixture_progress() {
        roundtrip_test::<CollectorResponse>("response_progress.json");
        let resp: CollectorResponse = decode("response_progress.json");
        assert_eq!(resp.ack(), ChunkAck::Accepted { progress: Some(3) });
    }

    #[test]
    fn fixture_completed() {
        roundtrip_test::<CollectorResponse>("response_completed.json");
        let resp: CollectorResponse = decode("response_completed.json");
        assert_eq!(resp.ack(), ChunkAck::Completed);
    }

    #[test]
    fn fixture_status_error() {
        roundtrip_test::<CollectorResponse>("response_status_error.json");
        let resp: CollectorResponse = decode("response_status_error.json");
        assert_eq!(
            resp.ack(),
            ChunkAck::Rejected {
                code: None,
                message: "failed to save chunk".into(),
            }
        );
    }

    #[test]
    fn fixture_errcode_aliases() {
        let resp: CollectorResponse = decode("response_errcode.json");
        assert_eq!(resp.code, Some(40001));
        assert_eq!(
            resp.ack(),
            ChunkAck::Rejected {
                code: Some(40001),
                message: "md5 mismatch after merge".into(),
            }
        );
    }

    #[test]
    fn fixture_unknown_fields_ignored() {
        let resp: CollectorResponse = decode("response_extra_fields.json");
        assert_eq!(resp.status.as_deref(), Some("uploading"));
        assert_eq!(resp.ack(), ChunkAck::Accepted { progress: Some(1) });
    }
}
