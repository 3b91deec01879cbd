pub mod ask_client;
pub mod card_service;
pub mod chat_service;
pub mod config_service;
pub mod gallery_service;
pub mod link_service;
pub mod markdown_service;
pub mod scroll_lock;
pub mod transcript_service;
