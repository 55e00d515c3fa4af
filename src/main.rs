//! Application entry point for Mestre das Letras.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run, and writes
//!    that default out so it can be edited).
//! 3. Create the [`tokio`] runtime (multi-thread, 1 worker) and enter it on
//!    the UI thread so views can spawn narrations.
//! 4. Build the generative client, audio output, narrator and exercise
//!    generator from config.
//! 5. Build the [`SessionController`].
//! 6. Run [`eframe::run_native`]; blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use eframe::egui;
use mestre_das_letras::{
    app::LetrasApp,
    audio::{AudioSink, CpalOutput},
    config::{AppConfig, AppPaths},
    genai::{ExerciseGenerator, GeminiClient, GenerativeService, Narrator},
    session::SessionController,
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("Mestre das Letras")
        .with_inner_size([width, height])
        .with_min_inner_size([640.0, 480.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Mestre das Letras starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let settings_file = AppPaths::new().settings_file;
    if !settings_file.exists() {
        match config.save_to(&settings_file) {
            Ok(()) => log::info!("Wrote default settings to {}", settings_file.display()),
            Err(e) => log::warn!("Could not write default settings: {e}"),
        }
    }

    // 3. Tokio runtime (1 worker; all work is I/O-bound)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let _guard = rt.enter();

    // 4. Generative service + audio
    let client = GeminiClient::from_config(&config.genai);
    let has_api_key = client.has_api_key();
    let service: Arc<dyn GenerativeService> = Arc::new(client);
    let sink: Arc<dyn AudioSink> = Arc::new(CpalOutput::new());

    let narrator = Arc::new(Narrator::new(
        Arc::clone(&service),
        sink,
        config.genai.clone(),
        config.narration.clone(),
    ));
    let generator = Arc::new(ExerciseGenerator::new(
        service,
        config.genai.clone(),
        config.lesson.clone(),
    ));

    // 5. Session
    let controller = SessionController::new(generator, narrator, &config.lesson);

    // 6. UI (blocks until the window is closed)
    let app = LetrasApp::new(controller, has_api_key);
    let options = native_options(&config);

    eframe::run_native(
        "Mestre das Letras",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))
}
