#[cfg(test)]
mod tests {
    use crate::batch::*;
    use crate::ledger::{Ledger, NewEntry};
    use crate::outbound::{AudioUpload, Messenger};
    use crate::pipeline::{TrackOutcome, TrackPipeline};
    use anyhow::Result;
    use async_trait::async_trait;
    use saavn_api::SaavnClient;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every outbound call for assertions.
    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<String>>,
        edited: Mutex<Vec<String>>,
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_status(&self, _chat_id: i64, text: &str) -> Result<i32> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(text.to_string());
            Ok(sent.len() as i32)
        }

        async fn edit_status(&self, _chat_id: i64, _message_id: i32, text: &str) -> Result<()> {
            self.edited.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_audio(&self, _upload: AudioUpload) -> Result<i64> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    async fn runner(
        base_url: &str,
        messenger: Arc<RecordingMessenger>,
        runs: ActiveRuns,
        ledger: Ledger,
    ) -> (BatchRunner, tempfile::TempDir) {
        let scratch = tempfile::tempdir().unwrap();
        let catalog = SaavnClient::new(reqwest::Client::new(), base_url);
        let pipeline = TrackPipeline::new(
            catalog.clone(),
            reqwest::Client::new(),
            ledger,
            messenger.clone(),
            scratch.path().to_path_buf(),
            scratch.path().to_path_buf(),
            50 * 1024 * 1024,
            900,
        );
        (
            BatchRunner::new(catalog, pipeline, messenger, runs, Duration::ZERO),
            scratch,
        )
    }

    fn artist_target(id: &str) -> BatchTarget {
        BatchTarget {
            kind: TargetKind::Artist,
            id: id.to_string(),
        }
    }

    // ── stats ─────────────────────────────────────────────────────────────────

    #[test]
    fn stats_classify_outcomes() {
        let mut stats = BatchStats::default();
        stats.record(&TrackOutcome::Succeeded {
            title: "x".to_string(),
        });
        stats.record(&TrackOutcome::SkippedExists);
        stats.record(&TrackOutcome::SkippedTooLong);
        stats.record(&TrackOutcome::SkippedTooLarge);
        stats.record(&TrackOutcome::Failed {
            reason: "boom".to_string(),
        });

        assert_eq!(
            stats,
            BatchStats {
                success: 1,
                skipped: 3,
                failed: 1,
            }
        );
    }

    // ── registry ──────────────────────────────────────────────────────────────

    #[test]
    fn claim_is_exclusive_until_released() {
        let runs = ActiveRuns::new();
        let guard = runs.try_claim("artist_1").unwrap();
        assert!(runs.try_claim("artist_1").is_none());
        // A different target is unaffected.
        assert!(runs.try_claim("playlist_1").is_some());

        drop(guard);
        assert!(runs.try_claim("artist_1").is_some());
    }

    #[test]
    fn keys_reflect_claims() {
        let runs = ActiveRuns::new();
        let _a = runs.try_claim("artist_2").unwrap();
        let _b = runs.try_claim("playlist_9").unwrap();
        assert_eq!(runs.keys(), vec!["artist_2", "playlist_9"]);
    }

    // ── orchestration ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn duplicate_run_is_rejected_with_a_notice() {
        let messenger = Arc::new(RecordingMessenger::default());
        let runs = ActiveRuns::new();
        let ledger = Ledger::connect("sqlite::memory:").await.unwrap();
        let (runner, _scratch) =
            runner("http://127.0.0.1:1", messenger.clone(), runs.clone(), ledger).await;

        let _held = runs.try_claim("artist_42").unwrap();
        runner.run(artist_target("42"), 100).await;

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("already being downloaded"), "{sent:?}");
        assert!(messenger.edited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_catalog_notifies_and_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "data": {"name": "Silent Artist"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a9/songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "data": {"songs": []}
            })))
            .mount(&server)
            .await;

        let messenger = Arc::new(RecordingMessenger::default());
        let runs = ActiveRuns::new();
        let ledger = Ledger::connect("sqlite::memory:").await.unwrap();
        let (runner, _scratch) = runner(&server.uri(), messenger.clone(), runs.clone(), ledger).await;

        runner.run(artist_target("a9"), 100).await;

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("No songs found"), "{sent:?}");
        assert_eq!(messenger.uploads.load(Ordering::SeqCst), 0);
        // The registry slot must be free again after the run.
        assert!(runs.try_claim("artist_a9").is_some());
    }

    #[tokio::test]
    async fn archived_songs_count_as_skipped_in_the_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "data": {"name": "One Hit Wonder"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a1/songs"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"songs": [{"id": "s1", "name": "The Hit"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a1/songs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "data": {"songs": []}
            })))
            .mount(&server)
            .await;

        let messenger = Arc::new(RecordingMessenger::default());
        let runs = ActiveRuns::new();
        let ledger = Ledger::connect("sqlite::memory:").await.unwrap();
        ledger
            .record(&NewEntry {
                song_id: "s1".to_string(),
                title: "The Hit".to_string(),
                artist: "One Hit Wonder".to_string(),
                channel_message_id: 1,
                duration_secs: 180,
                source_url: None,
                file_size_bytes: 1,
            })
            .await
            .unwrap();

        let (runner, _scratch) = runner(&server.uri(), messenger.clone(), runs, ledger).await;
        runner.run(artist_target("a1"), 100).await;

        // One start message, then progress/summary edits.
        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Total Songs:* 1"), "{sent:?}");

        let edited = messenger.edited.lock().unwrap();
        let summary = edited.last().expect("expected a final summary edit");
        assert!(summary.contains("COMPLETED"), "{summary}");
        assert!(summary.contains("Skipped: 1"), "{summary}");
        assert!(summary.contains("Success: 0"), "{summary}");
        assert_eq!(messenger.uploads.load(Ordering::SeqCst), 0);
    }
}
