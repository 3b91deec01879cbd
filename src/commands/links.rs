use crate::services::link_service;
use tauri::AppHandle;
use tauri_plugin_opener::OpenerExt;

/// Opens a call-to-action or contact link in the system browser, which keeps
/// no handle back to this window.
#[tauri::command]
pub fn open_link(app: AppHandle, url: String) -> Result<(), String> {
    let target = link_service::external_target(&url)
        .ok_or_else(|| format!("Refusing to open link: {}", url))?;

    tracing::info!("Opening external link {}", target);
    app.opener()
        .open_url(target, None::<&str>)
        .map_err(|e| format!("Failed to open link: {}", e))
}
