//! Pagination behavior against a local mock server.

#[cfg(test)]
mod tests {
    use crate::client::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SaavnClient {
        SaavnClient::new(reqwest::Client::new(), server.uri())
    }

    fn song_obj(id: &str) -> serde_json::Value {
        serde_json::json!({"id": id, "name": format!("song {id}")})
    }

    fn artist_page(ids: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "data": {"songs": ids.iter().map(|id| song_obj(id)).collect::<Vec<_>>()}
        })
    }

    #[tokio::test]
    async fn song_lookup_unwraps_single_element_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/songs/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [song_obj("s1")]
            })))
            .mount(&server)
            .await;

        let song = client(&server).song("s1").await.unwrap();
        assert_eq!(song.id, "s1");
    }

    #[tokio::test]
    async fn song_lookup_maps_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/songs/missing"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": false, "data": null})),
            )
            .mount(&server)
            .await;

        let err = client(&server).song("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::Unsuccessful(_)), "{err:?}");
    }

    #[tokio::test]
    async fn artist_songs_dedup_overlapping_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a1/songs"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_page(&["s1", "s2"])))
            .mount(&server)
            .await;
        // Page 1 overlaps page 0.
        Mock::given(method("GET"))
            .and(path("/api/artists/a1/songs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_page(&["s2", "s3"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a1/songs"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_page(&[])))
            .mount(&server)
            .await;

        let songs = client(&server).all_artist_songs("a1").await;
        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn artist_songs_stop_on_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a2/songs"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_page(&["s1"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a2/songs"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
            )
            .mount(&server)
            .await;

        let songs = client(&server).all_artist_songs("a2").await;
        assert_eq!(songs.len(), 1);
    }

    #[tokio::test]
    async fn artist_songs_keep_partial_results_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a3/songs"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(artist_page(&["s1", "s2"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artists/a3/songs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let songs = client(&server).all_artist_songs("a3").await;
        assert_eq!(songs.len(), 2);
    }

    #[tokio::test]
    async fn playlist_songs_short_page_is_final() {
        let server = MockServer::start().await;
        // 3 songs < limit of 100, so page 0 is also the last page and page 1
        // must never be requested.
        Mock::given(method("GET"))
            .and(path("/api/playlists"))
            .and(query_param("id", "p1"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"name": "Mix", "songs": [song_obj("s1"), song_obj("s2"), song_obj("s3")]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let songs = client(&server).all_playlist_songs("p1").await;
        assert_eq!(songs.len(), 3);
    }

    #[tokio::test]
    async fn playlist_lookup_returns_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playlists"))
            .and(query_param("id", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"name": "Road Trip &amp; Chill", "songCount": 42}
            })))
            .mount(&server)
            .await;

        let playlist = client(&server).playlist("p2").await.unwrap();
        assert_eq!(playlist.display_name(), "Road Trip & Chill");
        assert_eq!(playlist.song_count, Some(42));
    }
}
