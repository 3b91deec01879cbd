use crate::state::AppState;
use tauri::State;

/// Sends a question and returns the re-rendered transcript.
#[tauri::command]
pub async fn send_question(state: State<'_, AppState>, question: String) -> Result<String, String> {
    state.ask(&question).await;
    Ok(state.transcript_html().await)
}

#[tauri::command]
pub async fn get_transcript(state: State<'_, AppState>) -> Result<String, String> {
    Ok(state.transcript_html().await)
}

#[tauri::command]
pub fn is_loading(state: State<'_, AppState>) -> bool {
    state.is_loading()
}
