use crate::conversation::Assistant;
use crate::history::{InteractionLog, Sender};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub struct AppState {
    pub assistant: Assistant,
    pub history: InteractionLog,
}

#[derive(Deserialize)]
struct AskRequest {
    user_input: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    response: String,
    intent: String,
    session_id: String,
}

#[derive(Serialize)]
struct GreetingResponse {
    response: String,
    session_id: String,
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[post("/ask")]
async fn ask_endpoint(req: web::Json<AskRequest>, data: web::Data<AppState>) -> impl Responder {
    let AskRequest {
        user_input,
        session_id,
    } = req.into_inner();
    let session_id = session_id.unwrap_or_else(new_session_id);

    log::info!("User ({}): {}", session_id, user_input);
    data.history.record(&session_id, Sender::User, &user_input, None);

    let reply = data.assistant.reply(&user_input).await;
    data.history
        .record(&session_id, Sender::Bot, &reply.text, Some(&reply.intent));

    HttpResponse::Ok().json(AskResponse {
        response: reply.text,
        intent: reply.intent,
        session_id,
    })
}

#[get("/greeting")]
async fn greeting_endpoint(data: web::Data<AppState>) -> impl Responder {
    let session_id = new_session_id();
    let greeting = data.assistant.greeting();
    data.history
        .record(&session_id, Sender::Bot, &greeting, Some("hello"));
    HttpResponse::Ok().json(GreetingResponse {
        response: greeting,
        session_id,
    })
}

#[get("/api/stats")]
async fn stats_endpoint(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.history.stats())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ask_endpoint)
        .service(greeting_endpoint)
        .service(stats_endpoint);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::conversation::DispatchPolicy;
    use crate::generator::{Generator, GeneratorError};
    use crate::matcher::Matcher;
    use crate::normalizer::EnglishNormalizer;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::sync::Arc;

    const CATALOG: &str = r#"{
        "intents": [
            {"tag": "hello", "patterns": ["hello"], "responses": ["Hi there!"]},
            {"tag": "fallback", "patterns": [], "responses": ["Could you rephrase that?"]}
        ]
    }"#;

    struct NoGenerator;

    #[async_trait]
    impl Generator for NoGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
            Err(GeneratorError::MissingApiKey)
        }
    }

    fn state() -> web::Data<AppState> {
        let catalog = Arc::new(Catalog::from_json_str(CATALOG).unwrap());
        let matcher = Arc::new(Matcher::new(catalog, Arc::new(EnglishNormalizer::new())));
        web::Data::new(AppState {
            assistant: Assistant::new(matcher, Arc::new(NoGenerator), DispatchPolicy::default(), "Bot"),
            history: InteractionLog::new(100),
        })
    }

    #[actix_web::test]
    async fn test_ask_and_stats() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(serde_json::json!({"user_input": "hello", "session_id": "s1"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["response"], "Hi there!");
        assert_eq!(body["intent"], "hello");
        assert_eq!(body["session_id"], "s1");

        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(serde_json::json!({"user_input": "the of"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["intent"], "fallback");
        assert_ne!(body["session_id"], "s1");

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["total_messages"], 4);
        assert_eq!(stats["unique_sessions"], 2);
        assert_eq!(stats["fallback_rate"], 25.0);
    }

    #[actix_web::test]
    async fn test_greeting_starts_session() {
        let data = state();
        let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/greeting").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["response"], "Hi there!");
        assert!(Uuid::parse_str(body["session_id"].as_str().unwrap()).is_ok());
        assert_eq!(data.history.len(), 1);
    }
}
