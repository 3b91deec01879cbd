use crate::services::gallery_service::GalleryView;
use crate::state::AppState;
use tauri::State;
use uuid::Uuid;

#[tauri::command]
pub async fn open_gallery(
    state: State<'_, AppState>,
    message_id: Uuid,
    listing_index: usize,
    photo_index: usize,
) -> Result<GalleryView, String> {
    state
        .open_photo(message_id, listing_index, photo_index)
        .await
        .map_err(|e| e.to_string())
}

/// Re-rendered photo strip of one card, marking the last opened thumbnail.
#[tauri::command]
pub async fn get_card_strip(
    state: State<'_, AppState>,
    message_id: Uuid,
    listing_index: usize,
) -> Result<String, String> {
    state
        .card_strip_html(message_id, listing_index)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn close_gallery(state: State<'_, AppState>) -> GalleryView {
    state.close_gallery()
}

/// The overlay track snapped to another photo.
#[tauri::command]
pub fn gallery_scrolled(state: State<'_, AppState>, index: usize) -> GalleryView {
    state.gallery_scrolled(index)
}

#[tauri::command]
pub fn get_gallery(state: State<'_, AppState>) -> GalleryView {
    state.gallery()
}
