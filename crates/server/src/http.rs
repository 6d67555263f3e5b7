//! HTTP Endpoints
//!
//! REST API for the utility agent.

use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utility_agent_agent::ChatResponse;
use utility_agent_core::{Language, Turn};
use utility_agent_tools::{locale_for_language, ExtractedContracts, VoiceGender};

use crate::metrics::{metrics_handler, record_collaborator_latency, record_request};
use crate::state::AppState;
use crate::ServerError;

const SERVICE_NAME: &str = "SRM AI Customer Service";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);
    let max_upload = server.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/chat/reset", post(reset_chat))
        .route("/api/chat/greeting", get(greeting))
        .route("/api/conversations/:id", get(get_conversation))
        .route("/api/ocr/extract-contract", post(extract_contract))
        .route("/api/ocr/extract-text", post(extract_text))
        .route("/api/speech/stt", post(speech_to_text))
        .route("/api/speech/tts", post(text_to_speech))
        .route("/api/speech/languages", get(speech_languages))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// CORS from configured origins; disabled CORS or no valid origin allows any
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, allowing any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    record_request("health");
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "collaborators": {
            "llm": state.chat.has_model(),
            "ocr": state.ocr.is_some(),
            "speech": state.speech.is_some(),
        }
    }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    record_request("chat");
    let response = state
        .chat
        .chat(&request.message, request.conversation_id.as_deref())
        .await?;
    Ok(Json(response))
}

async fn reset_chat(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    record_request("reset");
    let conversation_id = state.chat.reset().await?;
    Ok(Json(serde_json::json!({ "conversation_id": conversation_id })))
}

#[derive(Debug, Deserialize)]
struct GreetingQuery {
    language: Option<String>,
}

async fn greeting(
    State(state): State<AppState>,
    Query(query): Query<GreetingQuery>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let language = match query.language.as_deref() {
        None => Language::Arabic,
        Some(code) => Language::from_str_loose(code)
            .ok_or_else(|| ServerError::InvalidRequest(format!("unsupported language: {}", code)))?,
    };
    Ok(Json(serde_json::json!({
        "language": language,
        "greeting": state.chat.greeting(language),
    })))
}

#[derive(Debug, Serialize)]
struct ConversationView {
    conversation_id: String,
    created_at: chrono::DateTime<chrono::Utc>,
    messages: Vec<Turn>,
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ServerError> {
    let conversation = state
        .chat
        .conversation(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("conversation {} not found", id)))?;
    Ok(Json(ConversationView {
        conversation_id: conversation.id,
        created_at: conversation.created_at,
        messages: conversation.turns,
    }))
}

/// Bytes of the multipart field named `file`
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
            if bytes.is_empty() {
                return Err(ServerError::InvalidRequest("file is empty".to_string()));
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(ServerError::InvalidRequest("missing multipart field 'file'".to_string()))
}

fn ocr_unavailable() -> ServerError {
    ServerError::Unavailable("OCR is not configured".to_string())
}

fn speech_unavailable() -> ServerError {
    ServerError::Unavailable("speech is not configured".to_string())
}

async fn extract_contract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractedContracts>, ServerError> {
    record_request("ocr");
    let ocr = state.ocr.clone().ok_or_else(ocr_unavailable)?;
    let image = read_file_field(multipart).await?;

    let started = Instant::now();
    let extracted = ocr.extract_contract(&image).await;
    record_collaborator_latency("ocr", started.elapsed().as_secs_f64());

    match extracted? {
        Some(contracts) => {
            tracing::info!(
                water = contracts.water_contract.is_some(),
                electricity = contracts.electricity_contract.is_some(),
                "Contract extracted from bill"
            );
            Ok(Json(contracts))
        }
        None => Err(ServerError::NotFound("not_found".to_string())),
    }
}

async fn extract_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ServerError> {
    record_request("ocr");
    let ocr = state.ocr.clone().ok_or_else(ocr_unavailable)?;
    let image = read_file_field(multipart).await?;

    let started = Instant::now();
    let text = ocr.extract_text(&image).await;
    record_collaborator_latency("ocr", started.elapsed().as_secs_f64());

    Ok(Json(serde_json::json!({ "text": text?.unwrap_or_default() })))
}

/// Locale from a BCP-47 tag (`ar-MA`) or a bare language code (`ar`)
fn resolve_locale(value: &str) -> Result<String, ServerError> {
    let value = value.trim();
    if value.contains('-') {
        return Ok(value.to_string());
    }
    Language::from_str_loose(value)
        .map(|language| locale_for_language(language).to_string())
        .ok_or_else(|| ServerError::InvalidRequest(format!("unsupported language: {}", value)))
}

#[derive(Debug, Deserialize)]
struct SttRequest {
    /// Base64 WAV audio
    audio: String,
    #[serde(default)]
    language: Option<String>,
}

async fn speech_to_text(
    State(state): State<AppState>,
    Json(request): Json<SttRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    record_request("stt");
    let speech = state.speech.clone().ok_or_else(speech_unavailable)?;
    let audio = BASE64
        .decode(request.audio.trim())
        .map_err(|e| ServerError::InvalidRequest(format!("audio is not valid base64: {}", e)))?;
    if audio.is_empty() {
        return Err(ServerError::InvalidRequest("audio is empty".to_string()));
    }
    let locale = request.language.as_deref().map(resolve_locale).transpose()?;

    let started = Instant::now();
    let transcription = speech.transcribe(&audio, locale.as_deref()).await;
    record_collaborator_latency("stt", started.elapsed().as_secs_f64());
    let transcription = transcription?;

    Ok(Json(serde_json::json!({
        "text": transcription.text,
        "detected_language": transcription.locale,
        "language": transcription.language,
    })))
}

#[derive(Debug, Deserialize)]
struct TtsRequest {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    voice_gender: Option<String>,
}

async fn text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    record_request("tts");
    let speech = state.speech.clone().ok_or_else(speech_unavailable)?;
    if request.text.trim().is_empty() {
        return Err(ServerError::InvalidRequest("text must not be empty".to_string()));
    }
    let locale = match request.language.as_deref() {
        Some(language) => resolve_locale(language)?,
        None => state.settings.speech.default_tts_language.clone(),
    };
    let gender = match request.voice_gender.as_deref() {
        Some(g) => VoiceGender::parse(g)
            .ok_or_else(|| ServerError::InvalidRequest(format!("unsupported voice_gender: {}", g)))?,
        None => VoiceGender::default(),
    };

    let started = Instant::now();
    let audio = speech.synthesize(&request.text, &locale, gender).await;
    record_collaborator_latency("tts", started.elapsed().as_secs_f64());
    let audio = audio?;

    Ok(Json(serde_json::json!({
        "audio": BASE64.encode(&audio.audio),
        "format": audio.content_type,
        "voice": audio.voice,
        "language": locale,
    })))
}

async fn speech_languages(State(state): State<AppState>) -> Json<serde_json::Value> {
    let speech = &state.settings.speech;
    Json(serde_json::json!({
        "languages": speech.candidate_languages,
        "default_tts_language": speech.default_tts_language,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use utility_agent_config::Settings;
    use utility_agent_tools::StubSpeech;

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.ocr.enabled = false;
        settings.speech.enabled = false;
        settings.llm.enabled = false;
        settings.persistence.seed_demo_data = true;
        settings
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_router_creation() {
        let _ = create_router(AppState::in_memory(Settings::default()));
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(AppState::in_memory(test_settings()));
        let (status, body) = send(app, Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["collaborators"]["ocr"], false);
    }

    #[tokio::test]
    async fn test_chat_envelope() {
        let app = create_router(AppState::in_memory(test_settings()));
        let (status, body) = send(
            app,
            post_json("/api/chat", serde_json::json!({ "message": "مشكل الكهرباء" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["diagnosis_path"], "deterministic");
        assert_eq!(body["action"]["type"], "NONE");
        assert!(body["conversation_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_empty_message_is_bad_request() {
        let app = create_router(AppState::in_memory(test_settings()));
        let (status, body) = send(app, post_json("/api/chat", serde_json::json!({ "message": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_conversation_round_trip() {
        let state = AppState::in_memory(test_settings());
        let (_, reply) = send(
            create_router(state.clone()),
            post_json("/api/chat", serde_json::json!({ "message": "4801566997 / 2025982" })),
        )
        .await;
        let id = reply["conversation_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            create_router(state.clone()),
            Request::get(format!("/api/conversations/{}", id)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            create_router(state),
            Request::get("/api/conversations/missing").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_greeting_language() {
        let app = create_router(AppState::in_memory(test_settings()));
        let (status, body) = send(
            app,
            Request::get("/api/chat/greeting?language=fr").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "fr");
        assert!(body["greeting"].as_str().unwrap().contains("SRM"));
    }

    #[tokio::test]
    async fn test_disabled_collaborators_unavailable() {
        let app = create_router(AppState::in_memory(test_settings()));
        let (status, _) = send(
            app,
            post_json("/api/speech/tts", serde_json::json!({ "text": "مرحبا" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_stt_with_stub() {
        let state = AppState::in_memory(test_settings())
            .with_speech(Arc::new(StubSpeech::new("ma kaynach lma", "ar-MA")));
        let audio = BASE64.encode([1u8, 2, 3, 4]);

        let (status, body) = send(
            create_router(state.clone()),
            post_json("/api/speech/stt", serde_json::json!({ "audio": audio })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detected_language"], "ar-MA");
        assert_eq!(body["language"], "ar");

        let (status, _) = send(
            create_router(state),
            post_json("/api/speech/stt", serde_json::json!({ "audio": "not base64!" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale("ar").unwrap(), "ar-MA");
        assert_eq!(resolve_locale("fr-FR").unwrap(), "fr-FR");
        assert!(resolve_locale("xx").is_err());
    }
}
