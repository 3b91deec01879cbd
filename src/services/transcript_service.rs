use std::sync::Arc;

use super::card_service::{CarouselStates, ListingCatalog};
use super::markdown_service::MarkdownRenderer;
use crate::models::{Element, Message, Node, Role};

pub const EMPTY_TRANSCRIPT_TEXT: &str = "Start the conversation...";
pub const TYPING_TEXT: &str = "bot is typing...";
pub const RENDER_FAILED_TEXT: &str = "This message could not be displayed.";

/// The whole message list.
///
/// Each bot message is rendered behind its own fault boundary, so one bad
/// reply only replaces itself with a placeholder.
pub fn render_transcript(
    messages: &[Arc<Message>],
    renderer: &MarkdownRenderer,
    carousels: &CarouselStates,
    loading: bool,
) -> Node {
    let mut transcript = Element::new("div").class("transcript");

    if messages.is_empty() {
        transcript = transcript.child(
            Element::new("div")
                .class("transcript-empty")
                .text(EMPTY_TRANSCRIPT_TEXT),
        );
    }

    for message in messages {
        transcript = transcript.child(render_message(message, renderer, carousels));
    }

    if loading {
        transcript = transcript.child(Element::new("div").class("typing").text(TYPING_TEXT));
    }

    transcript.into()
}

pub fn render_message(message: &Message, renderer: &MarkdownRenderer, carousels: &CarouselStates) -> Node {
    let bubble = Element::new("div")
        .class("message")
        .attr("data-message-id", message.id().to_string());

    match message.role() {
        Role::User => bubble.class("message-user").text(message.text()).into(),
        Role::Bot => {
            let text = match renderer.render_isolated(message.text()) {
                Ok(node) => Element::new("div").class("message-text").child(node),
                Err(e) => {
                    tracing::warn!("Rendering message {} failed: {}", message.id(), e);
                    Element::new("div")
                        .class("message-text")
                        .class("render-failed")
                        .text(RENDER_FAILED_TEXT)
                }
            };

            let mut bubble = bubble.class("message-bot").child(text);
            if let Some(catalog) = ListingCatalog::new(message.id(), message.listings()).render(carousels) {
                bubble = bubble.child(catalog);
            }
            bubble.into()
        }
    }
}
