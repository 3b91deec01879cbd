#[cfg(feature = "desktop")]
mod commands;
pub mod models;
pub mod services;
pub mod state;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flatchat_lib=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::*;
    use services::config_service;
    use services::scroll_lock::ScrollLock;
    use state::AppState;
    use tauri::{Emitter, Manager, WindowEvent};

    init_tracing();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let handle = app.handle().clone();
            let scroll = ScrollLock::with_observer(move |locked| {
                if let Err(e) = handle.emit("scroll-lock-changed", locked) {
                    tracing::warn!("Failed to emit scroll lock change: {}", e);
                }
            });

            let config = config_service::load_config().unwrap_or_else(|e| {
                tracing::warn!("Falling back to default config: {}", e);
                config_service::Config::default()
            });
            let handle = app.handle().clone();
            let state = AppState::from_config(&config, scroll)?.on_transcript_change(move || {
                if let Err(e) = handle.emit("transcript-changed", ()) {
                    tracing::warn!("Failed to emit transcript change: {}", e);
                }
            });
            app.manage(state);
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                window.state::<AppState>().unmount_gallery();
            }
        })
        .invoke_handler(tauri::generate_handler![
            // Chat commands
            send_question,
            get_transcript,
            is_loading,
            // Gallery commands
            open_gallery,
            get_card_strip,
            close_gallery,
            gallery_scrolled,
            get_gallery,
            // Link commands
            open_link,
            // Config commands
            get_backend_url,
            set_backend_url,
            get_config,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
