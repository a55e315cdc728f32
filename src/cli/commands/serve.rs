//! Chat web server.
//!
//! Serves the chat page and the JSON endpoints used by it, plus the
//! ingestion endpoints used to refresh the knowledge base.

use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::PaddockError;
use crate::language::{GoogleTranslator, Language};
use crate::llm::GroqChatModel;
use crate::orchestrator::{now_iso, BulkArticle, Orchestrator};
use crate::rag::RagEngine;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const INDEX_TEMPLATE: &str = include_str!("../../../templates/index.html");

pub const EXAMPLE_QUESTIONS_EN: [&str; 8] = [
    "Who is the current Formula 1 world champion?",
    "What are the latest F1 race results?",
    "Which team has the most F1 constructor championships?",
    "When is the next Formula 1 race?",
    "Who holds the record for most F1 wins?",
    "What are the current driver standings?",
    "Tell me about the history of McLaren F1 team",
    "What is DRS in Formula 1?",
];

pub const EXAMPLE_QUESTIONS_HI: [&str; 8] = [
    "फॉर्मूला 1 के वर्तमान विश्व चैंपियन कौन हैं?",
    "नवीनतम F1 रेस के परिणाम क्या हैं?",
    "किस टीम के पास सबसे अधिक F1 कंस्ट्रक्टर चैंपियनशिप हैं?",
    "अगली फॉर्मूला 1 रेस कब है?",
    "F1 में सबसे अधिक जीत का रिकॉर्ड किसके पास है?",
    "वर्तमान ड्राइवर स्टैंडिंग क्या है?",
    "मैक्लारेन F1 टीम के इतिहास के बारे में बताएं",
    "फॉर्मूला 1 में DRS क्या है?",
];

/// Shared application state.
pub struct AppState {
    orchestrator: Orchestrator,
    rag: RagEngine,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, rag: RagEngine) -> Self {
        Self { orchestrator, rag }
    }
}

/// Run the HTTP server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    super::preflight_or_hint(Operation::Ask, &settings)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let llm = Arc::new(GroqChatModel::new(&settings.llm)?);
    let translator = Arc::new(GoogleTranslator::new(&settings.language.translate_url)?);
    let orchestrator = Orchestrator::new(settings).await?;
    let rag = orchestrator.rag_engine(llm, translator);

    let app = router(Arc::new(AppState::new(orchestrator, rag)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Paddock F1 Chat");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat UI", "GET  /");
    Output::kv("Chat", "POST /chat");
    Output::kv("Health", "GET  /health");
    Output::kv("Stats", "GET  /stats");
    Output::kv("Update", "POST /scrape-and-update");
    Output::kv("Bulk add", "POST /admin/bulk-add-data");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/scrape-and-update", post(scrape_and_update))
        .route("/admin/bulk-add-data", post(bulk_add_data))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    supported_languages: Vec<Language>,
    timestamp: String,
}

#[derive(Serialize)]
struct UpdateResponse {
    message: &'static str,
    scraped_documents: usize,
    created_chunks: usize,
    sources: Vec<String>,
}

#[derive(Deserialize)]
struct BulkRequest {
    #[serde(default)]
    articles: Vec<BulkArticle>,
}

#[derive(Serialize)]
struct BulkResponse {
    message: &'static str,
    articles_processed: usize,
    chunks_created: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// Example questions shown on the chat page.
#[derive(Debug, Serialize)]
pub struct ExampleQuestions {
    pub english: Vec<&'static str>,
    pub hindi: Vec<&'static str>,
}

/// Two random questions per language.
pub fn pick_examples<R: rand::Rng>(rng: &mut R) -> ExampleQuestions {
    ExampleQuestions {
        english: EXAMPLE_QUESTIONS_EN.choose_multiple(rng, 2).copied().collect(),
        hindi: EXAMPLE_QUESTIONS_HI.choose_multiple(rng, 2).copied().collect(),
    }
}

fn render_index(examples: &ExampleQuestions) -> String {
    let buttons = |questions: &[&str]| {
        questions
            .iter()
            .map(|q| format!(r#"<button class="example" type="button">{}</button>"#, q))
            .collect::<Vec<_>>()
            .join("\n")
    };

    INDEX_TEMPLATE
        .replace("{{english_examples}}", &buttons(&examples.english))
        .replace("{{hindi_examples}}", &buttons(&examples.hindi))
}

// === Handlers ===

async fn index() -> Html<String> {
    let examples = pick_examples(&mut rand::thread_rng());
    Html(render_index(&examples))
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let message = req.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Please provide a question about Formula 1");
    }

    Json(state.rag.query(message).await).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        supported_languages: state.rag.language_handler().supported_languages().to_vec(),
        timestamp: now_iso(),
    })
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.vector_store().stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            tracing::error!("Failed to read index stats: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn scrape_and_update(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.scrape_and_update().await {
        Ok(report) => Json(UpdateResponse {
            message: "Successfully updated F1 knowledge base",
            scraped_documents: report.scraped_documents,
            created_chunks: report.created_chunks,
            sources: report.sources,
        })
        .into_response(),
        Err(e @ (PaddockError::VectorStore(_) | PaddockError::Embedding(_))) => {
            tracing::error!("Knowledge base update failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update vector store")
        }
        Err(e) => {
            tracing::error!("Scraping failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Scraping failed: {}", e))
        }
    }
}

async fn bulk_add_data(State(state): State<Arc<AppState>>, Json(req): Json<BulkRequest>) -> Response {
    if req.articles.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No articles provided");
    }

    let count = req.articles.len();
    match state.orchestrator.bulk_add(req.articles).await {
        Ok(report) => Json(BulkResponse {
            message: "Bulk data processed successfully",
            articles_processed: count,
            chunks_created: report.created_chunks,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Bulk upload failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload to vector database")
        }
    }
}
