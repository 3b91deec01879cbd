use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Message;
use crate::services::ask_client::{AskBackend, AskClient, AskError};
use crate::services::card_service::{CarouselStates, ListingCatalog};
use crate::services::config_service::{self, Config};
use crate::services::gallery_service::{GalleryOverlay, GalleryView};
use crate::services::markdown_service::MarkdownRenderer;
use crate::services::scroll_lock::ScrollLock;
use crate::services::chat_service::ChatSession;
use crate::services::transcript_service::render_transcript;

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("Backend client error: {0}")]
    Client(#[from] AskError),

    #[error("Unknown message {0}")]
    UnknownMessage(Uuid),

    #[error("Message {message_id} has no listing at index {listing_index}")]
    UnknownListing { message_id: Uuid, listing_index: usize },
}

/// Everything the window needs: the conversation, the single gallery
/// overlay, and the carousel state of the cards currently on screen.
pub struct AppState {
    chat: ChatSession,
    renderer: MarkdownRenderer,
    gallery: Mutex<GalleryOverlay>,
    carousels: Mutex<CarouselStates>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(backend: Arc<dyn AskBackend>, scroll: ScrollLock) -> Self {
        Self {
            chat: ChatSession::new(backend),
            renderer: MarkdownRenderer::default(),
            gallery: Mutex::new(GalleryOverlay::new(scroll)),
            carousels: Mutex::new(CarouselStates::default()),
        }
    }

    pub fn from_config(config: &Config, scroll: ScrollLock) -> Result<Self, AppStateError> {
        let client = AskClient::from_config(config)?;
        info!(
            "Using backend {} (timeout {:?})",
            client.endpoint(),
            config_service::request_timeout(config)
        );
        Ok(Self::new(Arc::new(client), scroll))
    }

    /// Called whenever a message is appended, so the window can re-render
    /// while a reply is still pending.
    pub fn on_transcript_change(mut self, observer: impl Fn() + Send + Sync + 'static) -> Self {
        self.chat.set_observer(observer);
        self
    }

    pub async fn ask(&self, question: &str) -> Option<Arc<Message>> {
        self.chat.send(question).await
    }

    pub fn is_loading(&self) -> bool {
        self.chat.is_loading()
    }

    pub async fn messages(&self) -> Vec<Arc<Message>> {
        self.chat.messages().await
    }

    /// Re-renders the message list. Card-local carousel state does not
    /// survive this.
    pub async fn transcript_html(&self) -> String {
        let messages = self.chat.messages().await;
        let mut carousels = lock(&self.carousels);
        carousels.clear();
        render_transcript(&messages, &self.renderer, &carousels, self.chat.is_loading()).to_html()
    }

    /// A click on a card thumbnail. Opens the gallery on that photo, or
    /// leaves it as it is when the index does not exist.
    pub async fn open_photo(
        &self,
        message_id: Uuid,
        listing_index: usize,
        photo_index: usize,
    ) -> Result<GalleryView, AppStateError> {
        let message = self
            .chat
            .find(message_id)
            .await
            .ok_or(AppStateError::UnknownMessage(message_id))?;

        let catalog = ListingCatalog::new(message.id(), message.listings());
        let request = {
            let mut carousels = lock(&self.carousels);
            let mut carousel = catalog
                .carousel(listing_index, &carousels)
                .ok_or(AppStateError::UnknownListing {
                    message_id,
                    listing_index,
                })?;
            let request = carousel.click(photo_index);
            carousels.record(carousel.key(), carousel.state());
            request
        };

        let mut gallery = lock(&self.gallery);
        match request {
            Some(request) => {
                if let Err(e) = gallery.open(request.photos, request.index) {
                    warn!("Gallery open ignored: {}", e);
                }
            }
            None => warn!(
                "Photo {} does not exist in listing {} of message {}",
                photo_index, listing_index, message_id
            ),
        }
        Ok(gallery.view())
    }

    /// The photo strip of one card with its current carousel state, for
    /// refreshing that card in place after a thumbnail click.
    pub async fn card_strip_html(&self, message_id: Uuid, listing_index: usize) -> Result<String, AppStateError> {
        let message = self
            .chat
            .find(message_id)
            .await
            .ok_or(AppStateError::UnknownMessage(message_id))?;

        let catalog = ListingCatalog::new(message.id(), message.listings());
        let carousels = lock(&self.carousels);
        let carousel = catalog
            .carousel(listing_index, &carousels)
            .ok_or(AppStateError::UnknownListing {
                message_id,
                listing_index,
            })?;
        Ok(carousel.render().map(|node| node.to_html()).unwrap_or_default())
    }

    pub fn close_gallery(&self) -> GalleryView {
        let mut gallery = lock(&self.gallery);
        gallery.close();
        gallery.view()
    }

    pub fn gallery_scrolled(&self, index: usize) -> GalleryView {
        let mut gallery = lock(&self.gallery);
        if let Err(e) = gallery.set_active_index(index) {
            warn!("Gallery scroll position ignored: {}", e);
        }
        gallery.view()
    }

    pub fn gallery(&self) -> GalleryView {
        lock(&self.gallery).view()
    }

    /// The window hosting the overlay is going away.
    pub fn unmount_gallery(&self) {
        if lock(&self.gallery).close() {
            info!("Gallery torn down with its window");
        }
    }
}
