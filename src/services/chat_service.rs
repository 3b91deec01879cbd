use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};
use uuid::Uuid;

use super::ask_client::AskBackend;
use crate::models::{ListingRecord, Message};

/// Bot reply when the backend could not be reached or failed.
pub const FALLBACK_TEXT: &str = "Something went wrong while contacting the server. Please try again.";
/// Bot reply when the backend answered without text.
pub const NO_ANSWER_TEXT: &str = "No answer";

/// Append-only conversation log.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Arc<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> Arc<Message> {
        self.push(Message::user(text))
    }

    pub fn push_bot(&mut self, text: impl Into<String>, listings: Vec<ListingRecord>) -> Arc<Message> {
        self.push(Message::bot(text, listings))
    }

    fn push(&mut self, message: Message) -> Arc<Message> {
        let message = Arc::new(message);
        self.messages.push(Arc::clone(&message));
        message
    }

    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn find(&self, id: Uuid) -> Option<&Arc<Message>> {
        self.messages.iter().find(|message| message.id() == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Sets the loading flag for as long as it lives.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

type Observer = Box<dyn Fn() + Send + Sync>;

/// One conversation: the message log plus the send pipeline.
pub struct ChatSession {
    backend: Arc<dyn AskBackend>,
    store: RwLock<MessageStore>,
    loading: AtomicBool,
    // Single slot: sends run one at a time, in the order they were issued.
    send_slot: Mutex<()>,
    observer: Option<Observer>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn AskBackend>) -> Self {
        Self {
            backend,
            store: RwLock::new(MessageStore::new()),
            loading: AtomicBool::new(false),
            send_slot: Mutex::new(()),
            observer: None,
        }
    }

    /// Called after every append, while the loading flag still reflects the
    /// send that caused it.
    pub fn set_observer(&mut self, observer: impl Fn() + Send + Sync + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer();
        }
    }

    /// Sends a question and appends the user message and the bot reply.
    ///
    /// Blank input is ignored and returns `None`. Backend failures never
    /// surface as errors: they become a fallback bot message.
    pub async fn send(&self, question: &str) -> Option<Arc<Message>> {
        if question.trim().is_empty() {
            return None;
        }

        let _slot = self.send_slot.lock().await;
        let _loading = LoadingGuard::new(&self.loading);

        self.store.write().await.push_user(question);
        self.notify();
        info!("Sending question ({} chars)", question.chars().count());

        let (text, listings) = match self.backend.ask(question).await {
            Ok(response) => {
                let text = response.answer().unwrap_or(NO_ANSWER_TEXT).to_string();
                let listings = response.into_listings();
                info!("Received answer with {} listings", listings.len());
                (text, listings)
            }
            Err(e) => {
                error!("Ask request failed: {}", e);
                (FALLBACK_TEXT.to_string(), Vec::new())
            }
        };

        let reply = self.store.write().await.push_bot(text, listings);
        self.notify();
        Some(reply)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn messages(&self) -> Vec<Arc<Message>> {
        self.store.read().await.messages().to_vec()
    }

    pub async fn find(&self, id: Uuid) -> Option<Arc<Message>> {
        self.store.read().await.find(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AskResponse, Role};
    use crate::services::ask_client::AskError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Echoes the question; questions starting with "slow" take longer.
    struct EchoBackend;

    #[async_trait]
    impl AskBackend for EchoBackend {
        async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
            if question.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(AskResponse {
                answer: Some(format!("echo: {}", question)),
                flats: None,
            })
        }
    }

    struct FixedBackend(&'static str);

    #[async_trait]
    impl AskBackend for FixedBackend {
        async fn ask(&self, _question: &str) -> Result<AskResponse, AskError> {
            Ok(serde_json::from_str(self.0).unwrap())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl AskBackend for FailingBackend {
        async fn ask(&self, _question: &str) -> Result<AskResponse, AskError> {
            Err(AskError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            })
        }
    }

    struct GatedBackend(Arc<Notify>);

    #[async_trait]
    impl AskBackend for GatedBackend {
        async fn ask(&self, _question: &str) -> Result<AskResponse, AskError> {
            self.0.notified().await;
            Ok(AskResponse::default())
        }
    }

    #[tokio::test]
    async fn round_trips_alternate_and_keep_input() {
        let session = ChatSession::new(Arc::new(EchoBackend));
        let questions = ["2 rooms in Almaty", "  with balcony  ", "under 40M?"];

        for question in questions {
            session.send(question).await.unwrap();
        }

        let messages = session.messages().await;
        assert_eq!(messages.len(), 2 * questions.len());
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[0].text(), questions[i]);
            assert!(pair[0].listings().is_empty());
            assert_eq!(pair[1].role(), Role::Bot);
            assert_eq!(pair[1].text(), format!("echo: {}", questions[i]));
        }
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let session = ChatSession::new(Arc::new(EchoBackend));

        assert!(session.send("   ").await.is_none());
        assert!(session.send("").await.is_none());
        assert_eq!(session.len().await, 0);
    }

    #[tokio::test]
    async fn answer_only_reply_has_no_listings() {
        let session = ChatSession::new(Arc::new(FixedBackend(r#"{ "answer": "x" }"#)));

        let reply = session.send("hi").await.unwrap();

        assert_eq!(reply.text(), "x");
        assert!(reply.listings().is_empty());
    }

    #[tokio::test]
    async fn reply_carries_listings() {
        let session = ChatSession::new(Arc::new(FixedBackend(
            r#"{ "answer": "y", "flats": [{ "title": "A", "photos": ["u1", "u2"] }] }"#,
        )));

        let reply = session.send("flats?").await.unwrap();

        assert_eq!(reply.text(), "y");
        assert_eq!(reply.listings().len(), 1);
        assert_eq!(reply.listings()[0].title(), Some("A"));
        assert_eq!(reply.listings()[0].photo_count(), 2);
    }

    #[tokio::test]
    async fn missing_answer_uses_placeholder() {
        let session = ChatSession::new(Arc::new(FixedBackend(r#"{ "flats": [] }"#)));

        let reply = session.send("anything").await.unwrap();

        assert_eq!(reply.text(), NO_ANSWER_TEXT);
    }

    #[tokio::test]
    async fn failure_appends_fallback_and_clears_loading() {
        let session = ChatSession::new(Arc::new(FailingBackend));

        let reply = session.send("hi").await.unwrap();

        assert_eq!(reply.text(), FALLBACK_TEXT);
        assert!(!session.is_loading());
        assert_eq!(session.len().await, 2);
    }

    #[tokio::test]
    async fn loading_is_set_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let session = Arc::new(ChatSession::new(Arc::new(GatedBackend(Arc::clone(&gate)))));

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send("hi").await })
        };
        for _ in 0..100 {
            if session.is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(session.is_loading());

        gate.notify_one();
        task.await.unwrap();
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn concurrent_sends_are_serialized_in_send_order() {
        let session = ChatSession::new(Arc::new(EchoBackend));

        futures::future::join(session.send("slow first"), session.send("fast second")).await;

        let texts: Vec<_> = session
            .messages()
            .await
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        assert_eq!(
            texts,
            vec!["slow first", "echo: slow first", "fast second", "echo: fast second"]
        );
    }

    #[tokio::test]
    async fn malformed_listing_keeps_answer_and_other_cards() {
        let session = ChatSession::new(Arc::new(FixedBackend(
            r#"{ "answer": "Here you go", "flats": [{ "title": "A", "price": 45000000 }, null, { "title": "B" }] }"#,
        )));

        let reply = session.send("flats?").await.unwrap();

        assert_eq!(reply.text(), "Here you go");
        assert_eq!(reply.listings().len(), 2);
        assert_eq!(reply.listings()[0].price(), Some("45000000"));
    }

    #[tokio::test]
    async fn observer_sees_user_message_before_reply() {
        let gate = Arc::new(Notify::new());
        let appended = Arc::new(AtomicUsize::new(0));
        let mut session = ChatSession::new(Arc::new(GatedBackend(Arc::clone(&gate))));
        let counter = Arc::clone(&appended);
        session.set_observer(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let session = Arc::new(session);

        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send("hi").await })
        };
        for _ in 0..100 {
            if appended.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(appended.load(Ordering::SeqCst), 1);
        assert_eq!(session.len().await, 1);
        assert!(session.is_loading());

        gate.notify_one();
        task.await.unwrap();
        assert_eq!(appended.load(Ordering::SeqCst), 2);
        assert_eq!(session.len().await, 2);
    }
}
