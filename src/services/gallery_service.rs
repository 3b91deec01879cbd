use serde::Serialize;
use thiserror::Error;

use super::scroll_lock::{ScrollLock, ScrollLockGuard};
use crate::models::{Element, Node, PhotoSet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("gallery has no photos to show")]
    NoPhotos,
    #[error("photo index {index} out of range for {len} photos")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("gallery is closed")]
    Closed,
}

enum GalleryState {
    Closed,
    Open {
        photos: PhotoSet,
        active_index: usize,
        // Held exactly while open; dropping the state releases it.
        _scroll: ScrollLockGuard,
    },
}

/// Snapshot of the overlay sent to the frontend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    pub is_open: bool,
    pub active_index: Option<usize>,
    pub photo_count: usize,
    pub html: Option<String>,
}

/// Full-screen photo viewer. The application owns exactly one.
pub struct GalleryOverlay {
    scroll: ScrollLock,
    state: GalleryState,
}

impl GalleryOverlay {
    pub fn new(scroll: ScrollLock) -> Self {
        Self {
            scroll,
            state: GalleryState::Closed,
        }
    }

    /// Shows `photos` starting at `index`, replacing whatever is open.
    ///
    /// Invalid requests leave the overlay untouched.
    pub fn open(&mut self, photos: PhotoSet, index: usize) -> Result<(), GalleryError> {
        if photos.is_empty() {
            return Err(GalleryError::NoPhotos);
        }
        if index >= photos.len() {
            return Err(GalleryError::IndexOutOfRange {
                index,
                len: photos.len(),
            });
        }

        match &mut self.state {
            GalleryState::Open {
                photos: current,
                active_index,
                ..
            } => {
                *current = photos;
                *active_index = index;
            }
            GalleryState::Closed => {
                self.state = GalleryState::Open {
                    photos,
                    active_index: index,
                    _scroll: self.scroll.acquire(),
                };
            }
        }
        tracing::debug!("Gallery opened at photo {}", index);
        Ok(())
    }

    /// Returns whether the overlay was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = GalleryState::Closed;
        if was_open {
            tracing::debug!("Gallery closed");
        }
        was_open
    }

    /// Records the photo the user has scrolled to.
    pub fn set_active_index(&mut self, index: usize) -> Result<(), GalleryError> {
        match &mut self.state {
            GalleryState::Closed => Err(GalleryError::Closed),
            GalleryState::Open {
                photos,
                active_index,
                ..
            } => {
                if index >= photos.len() {
                    return Err(GalleryError::IndexOutOfRange {
                        index,
                        len: photos.len(),
                    });
                }
                *active_index = index;
                Ok(())
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, GalleryState::Open { .. })
    }

    pub fn active_index(&self) -> Option<usize> {
        match &self.state {
            GalleryState::Open { active_index, .. } => Some(*active_index),
            GalleryState::Closed => None,
        }
    }

    pub fn photos(&self) -> Option<&PhotoSet> {
        match &self.state {
            GalleryState::Open { photos, .. } => Some(photos),
            GalleryState::Closed => None,
        }
    }

    pub fn render(&self) -> Option<Node> {
        let GalleryState::Open {
            photos,
            active_index,
            ..
        } = &self.state
        else {
            return None;
        };

        let slides = photos.iter().enumerate().map(|(i, src)| {
            let slide = Element::new("img")
                .class("gallery-photo")
                .attr("src", src.as_str())
                .attr("alt", format!("Photo {}", i + 1))
                .attr("data-photo-index", i.to_string());
            if i == *active_index {
                slide.attr("id", "gallery-active").into()
            } else {
                slide.into()
            }
        });

        let close = Element::new("button")
            .class("gallery-close")
            .attr("type", "button")
            .attr("aria-label", "Close gallery")
            .attr("data-action", "close-gallery")
            .text("×");

        Some(
            Element::new("div")
                .class("gallery-overlay")
                .attr("role", "dialog")
                .attr("aria-modal", "true")
                .child(close)
                .child(
                    Element::new("div")
                        .class("gallery-track")
                        .attr("data-active-index", active_index.to_string())
                        .children(slides),
                )
                .into(),
        )
    }

    pub fn view(&self) -> GalleryView {
        GalleryView {
            is_open: self.is_open(),
            active_index: self.active_index(),
            photo_count: self.photos().map_or(0, |photos| photos.len()),
            html: self.render().map(|node| node.to_html()),
        }
    }

    /// Tears the overlay down with its host, releasing the scroll lock if
    /// it is still open.
    pub fn unmount(self) {
        if self.is_open() {
            tracing::debug!("Gallery unmounted while open");
        }
    }
}

impl Default for GalleryOverlay {
    fn default() -> Self {
        Self::new(ScrollLock::new())
    }
}

impl std::fmt::Debug for GalleryOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryOverlay")
            .field("is_open", &self.is_open())
            .field("active_index", &self.active_index())
            .field("photo_count", &self.photos().map(|p| p.len()))
            .finish()
    }
}
