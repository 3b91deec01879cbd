use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::link_service::sanitize_href;
use crate::models::{Element, ListingRecord, Node, PhotoSet};

pub const CONTACT_LABEL: &str = "Details";

/// Identifies one rendered card: the message it belongs to and its position
/// in that message's listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardKey {
    pub message_id: Uuid,
    pub listing_index: usize,
}

/// Card-local carousel state. Display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarouselViewState {
    pub last_requested: Option<usize>,
}

/// Request for the gallery to show `photos` starting at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub photos: PhotoSet,
    pub index: usize,
}

/// Carousel state of every mounted card.
#[derive(Debug, Default)]
pub struct CarouselStates {
    states: HashMap<CardKey, CarouselViewState>,
}

impl CarouselStates {
    pub fn get(&self, key: &CardKey) -> CarouselViewState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn record(&mut self, key: CardKey, state: CarouselViewState) {
        self.states.insert(key, state);
    }

    /// Drops all card state, as happens when the message list re-renders.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Horizontally scrollable photo strip of one card.
#[derive(Debug, Clone)]
pub struct PhotoCarousel {
    key: CardKey,
    photos: PhotoSet,
    state: CarouselViewState,
}

impl PhotoCarousel {
    pub fn new(key: CardKey, photos: PhotoSet) -> Self {
        Self {
            key,
            photos,
            state: CarouselViewState::default(),
        }
    }

    pub fn with_state(mut self, state: CarouselViewState) -> Self {
        // Stale state from a card with a different photo count is ignored.
        if state.last_requested.map_or(true, |i| i < self.photos.len()) {
            self.state = state;
        }
        self
    }

    pub fn key(&self) -> CardKey {
        self.key
    }

    pub fn state(&self) -> CarouselViewState {
        self.state
    }

    /// A click on the thumbnail at `index`.
    pub fn click(&mut self, index: usize) -> Option<OpenRequest> {
        if index >= self.photos.len() {
            return None;
        }
        self.state.last_requested = Some(index);
        Some(OpenRequest {
            photos: Arc::clone(&self.photos),
            index,
        })
    }

    /// The photo strip, or `None` when there are no photos.
    pub fn render(&self) -> Option<Node> {
        if self.photos.is_empty() {
            return None;
        }

        let thumbs = self.photos.iter().enumerate().map(|(i, src)| {
            let thumb = Element::new("img")
                .class("photo-thumb")
                .attr("src", src.as_str())
                .attr("alt", format!("Photo {}", i + 1))
                .attr("loading", "lazy")
                .attr("data-photo-index", i.to_string());
            if self.state.last_requested == Some(i) {
                thumb.class("is-last-viewed").into()
            } else {
                thumb.into()
            }
        });

        Some(
            Element::new("div")
                .class("photo-strip")
                .attr("data-message-id", self.key.message_id.to_string())
                .attr("data-listing-index", self.key.listing_index.to_string())
                .children(thumbs)
                .into(),
        )
    }
}

/// One listing as a card: photo strip followed by its attributes.
pub fn render_card(listing: &ListingRecord, carousel: &PhotoCarousel) -> Node {
    let mut card = Element::new("article").class("listing-card");
    if let Some(strip) = carousel.render() {
        card = card.child(strip);
    }

    let mut header = Element::new("div").class("listing-header");
    if let Some(title) = listing.title() {
        header = header.child(Element::new("h3").class("listing-title").text(title));
    }
    if let Some(location) = listing.location() {
        header = header.child(Element::new("p").class("listing-location").text(location));
    }
    if let Some(price) = listing.price() {
        header = header.child(Element::new("p").class("listing-price").text(price));
    }
    card = card.child(header);

    if let Some(infrastructure) = listing.infrastructure() {
        card = card.child(detail(format!("Amenities: {}", infrastructure)));
    }
    match (listing.mortgage_program(), listing.down_payment()) {
        (Some(program), Some(down)) => {
            card = card.child(detail(format!("Mortgage: {} (down payment from {})", program, down)));
        }
        (Some(program), None) => {
            card = card.child(detail(format!("Mortgage: {}", program)));
        }
        (None, Some(down)) => {
            card = card.child(detail(format!("Down payment from {}", down)));
        }
        (None, None) => {}
    }

    if let Some(href) = listing.contact_link().and_then(sanitize_href) {
        let contact = Element::new("a")
            .class("contact-link")
            .attr("href", href)
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .text(CONTACT_LABEL);
        card = card.child(Element::new("div").class("listing-actions").child(contact));
    }

    card.into()
}

fn detail(text: String) -> Element {
    Element::new("p").class("listing-detail").text(text)
}

/// Listings of one bot message, rendered as cards in order.
pub struct ListingCatalog<'a> {
    message_id: Uuid,
    listings: &'a [ListingRecord],
}

impl<'a> ListingCatalog<'a> {
    pub fn new(message_id: Uuid, listings: &'a [ListingRecord]) -> Self {
        Self {
            message_id,
            listings,
        }
    }

    pub fn carousel(&self, listing_index: usize, states: &CarouselStates) -> Option<PhotoCarousel> {
        let listing = self.listings.get(listing_index)?;
        let key = CardKey {
            message_id: self.message_id,
            listing_index,
        };
        Some(PhotoCarousel::new(key, Arc::clone(&listing.photos)).with_state(states.get(&key)))
    }

    /// `None` when the message has no listings.
    pub fn render(&self, states: &CarouselStates) -> Option<Node> {
        if self.listings.is_empty() {
            return None;
        }

        let cards = self
            .listings
            .iter()
            .enumerate()
            .filter_map(|(i, listing)| {
                let carousel = self.carousel(i, states)?;
                Some(render_card(listing, &carousel))
            });

        Some(
            Element::new("div")
                .class("listing-catalog")
                .children(cards)
                .into(),
        )
    }
}
