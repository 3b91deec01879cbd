use crate::services::config_service;

#[tauri::command]
pub fn get_backend_url() -> Result<String, String> {
    config_service::get_backend_url().map_err(|e| e.to_string())
}

/// Takes effect on the next start.
#[tauri::command]
pub fn set_backend_url(url: String) -> Result<(), String> {
    config_service::set_backend_url(&url).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_config() -> Result<config_service::Config, String> {
    config_service::get_full_config().map_err(|e| e.to_string())
}
