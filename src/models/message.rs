use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ListingRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One entry of the conversation log.
///
/// Fields are private and only [`Message::user`] and [`Message::bot`] build
/// messages, so a user message never carries listings.
#[derive(Debug, Clone)]
pub struct Message {
    id: Uuid,
    role: Role,
    text: String,
    listings: Vec<ListingRecord>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), Vec::new())
    }

    pub fn bot(text: impl Into<String>, listings: Vec<ListingRecord>) -> Self {
        Self::new(Role::Bot, text.into(), listings)
    }

    fn new(role: Role, text: String, listings: Vec<ListingRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            listings,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn listings(&self) -> &[ListingRecord] {
        &self.listings
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
