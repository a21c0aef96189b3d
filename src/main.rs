use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use intent_router::conversation::{Assistant, DispatchPolicy};
use intent_router::generator::GeminiGenerator;
use intent_router::history::InteractionLog;
use intent_router::server::{self, AppState};
use intent_router::settings::Settings;
use intent_router::{Catalog, EnglishNormalizer, Matcher};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;

    let catalog = Catalog::load(&settings.data.intents_file)
        .with_context(|| format!("Failed to load intents from '{}'", settings.data.intents_file))?;
    let matcher = Matcher::new(Arc::new(catalog), Arc::new(EnglishNormalizer::new()))
        .with_threshold(settings.logic.similarity_threshold)?;
    log::info!(
        "Intent matcher ready with {} intents (threshold {:.2})",
        matcher.catalog().len(),
        matcher.threshold()
    );

    let generator = GeminiGenerator::new(
        settings.generator.api_url.clone(),
        settings.generator.api_key.clone(),
        Duration::from_secs(settings.generator.timeout_secs),
    )?;

    let assistant = Assistant::new(
        Arc::new(matcher),
        Arc::new(generator),
        DispatchPolicy::new(settings.logic.complex_tags.clone()),
        settings.logic.persona.clone(),
    );
    let data = web::Data::new(AppState {
        assistant,
        history: InteractionLog::new(settings.history.capacity),
    });

    let (host, port) = (settings.server.host.clone(), settings.server.port);
    log::info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(server::configure))
        .bind((host, port))?
        .run()
        .await?;
    Ok(())
}
