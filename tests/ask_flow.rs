use flatchat_lib::models::Role;
use flatchat_lib::services::ask_client::{AskBackend, AskClient, AskError};
use flatchat_lib::services::chat_service::{ChatSession, FALLBACK_TEXT};
use flatchat_lib::services::scroll_lock::ScrollLock;
use flatchat_lib::state::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> AskClient {
    AskClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn posts_question_and_parses_listings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({ "question": "2 rooms in Almaty" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Here are **two** options:",
            "flats": [
                { "title": "2-room, 54 m²", "price": "38 000 000 ₸", "photos": ["https://img/1.jpg", "https://img/2.jpg"] },
                { "title": "2-room, 61 m²", "district": "Bostandyk", "photos": null }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).ask("2 rooms in Almaty").await.unwrap();

    assert_eq!(response.answer(), Some("Here are **two** options:"));
    let listings = response.into_listings();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].photo_count(), 2);
    assert_eq!(listings[1].photo_count(), 0);
    assert_eq!(listings[1].location(), Some("Bostandyk".to_string()));
}

#[tokio::test]
async fn server_error_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client(&server).ask("hi").await;

    match result {
        Err(AskError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn failing_server_yields_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let session = ChatSession::new(Arc::new(client(&server)));
    let reply = session.send("anything").await.unwrap();

    assert_eq!(reply.role(), Role::Bot);
    assert_eq!(reply.text(), FALLBACK_TEXT);
    assert!(reply.listings().is_empty());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn thumbnail_click_opens_gallery_over_http_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "One match",
            "flats": [{ "title": "A", "photos": ["u1", "u2", "u3"] }]
        })))
        .mount(&server)
        .await;

    let scroll = ScrollLock::new();
    let state = AppState::new(Arc::new(client(&server)), scroll.clone());
    let reply = state.ask("flats").await.unwrap();

    let html = state.transcript_html().await;
    assert!(html.contains("One match"));
    assert_eq!(html.matches("class=\"photo-thumb").count(), 3);

    let view = state.open_photo(reply.id(), 0, 1).await.unwrap();
    assert!(view.is_open);
    assert_eq!(view.active_index, Some(1));
    assert!(scroll.is_locked());

    let view = state.close_gallery();
    assert!(!view.is_open);
    assert!(!scroll.is_locked());
}
