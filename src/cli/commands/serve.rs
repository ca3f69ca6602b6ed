//! HTTP API server for chat front ends.
//!
//! Exposes one-shot questions, server-side chat sessions and a few
//! read-only lookups over the store assistant.

use crate::agent::OrchestrationResult;
use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::LisearchError;
use crate::llm::{Message, Role};
use crate::session::{ChatSession, Turn};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

/// Most sessions kept at once; the least recently used is dropped beyond this.
const MAX_SESSIONS: usize = 1000;

/// Sessions unused for this long are dropped.
const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    last_active: Instant,
}

/// Shared application state.
struct AppState {
    assistant: Assistant,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl AppState {
    fn new(assistant: Assistant) -> Self {
        Self {
            assistant,
            sessions: Mutex::new(HashMap::new()),
            max_sessions: MAX_SESSIONS,
            idle_timeout: SESSION_IDLE_TIMEOUT,
        }
    }

    /// Look up a session and mark it as used.
    async fn session(&self, id: Uuid) -> Option<Arc<Mutex<ChatSession>>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Instant::now();
        Some(entry.session.clone())
    }

    /// Store a new session, dropping idle ones and keeping under the cap.
    async fn insert_session(&self, id: Uuid, session: ChatSession) {
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_active.elapsed() < self.idle_timeout);

        while sessions.len() >= self.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            info!(dropped, "Expired chat sessions");
        }

        sessions.insert(
            id,
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                last_active: Instant::now(),
            },
        );
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lisearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let state = Arc::new(AppState::new(Assistant::from_settings(settings)?));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("LiSearch API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Tools", "GET    /tools");
    Output::kv("Categories", "GET    /categories");
    Output::kv("Chat", "POST   /chat");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Session transcript", "GET    /sessions/{id}");
    Output::kv("Session message", "POST   /sessions/{id}/messages");
    Output::kv("End session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/categories", get(list_categories))
        .route("/chat", post(chat))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/messages", post(session_message))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    /// Prior turns, oldest first. The system prompt is added by the server.
    #[serde(default)]
    history: Vec<Message>,
}

#[derive(Deserialize)]
struct SessionMessageRequest {
    message: String,
}

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolInfo>,
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: Uuid,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    turns: Vec<Turn>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn agent_error(e: LisearchError) -> Response {
    let status = match e {
        LisearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

fn session_not_found(id: Uuid) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

fn run_response(outcome: crate::error::Result<OrchestrationResult>) -> Response {
    match outcome {
        Ok(result) => Json(result).into_response(),
        Err(e) => agent_error(e),
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tools = state
        .assistant
        .agent()
        .registry()
        .definitions()
        .iter()
        .map(|tool| ToolInfo {
            name: tool.name.clone(),
            description: tool.description.clone(),
        })
        .collect();
    Json(ToolsResponse { tools })
}

async fn list_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(CategoriesResponse {
        categories: state.assistant.queries().all_categories().await,
    })
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let turns: Vec<Message> = req
        .history
        .into_iter()
        .filter(|m| m.role != Role::System)
        .collect();
    // Same window as a ChatSession: the new message counts toward it.
    let keep = state.assistant.settings().chat.history_turns.saturating_sub(1);
    let start = turns.len().saturating_sub(keep);

    let mut history = Vec::with_capacity(turns.len() - start + 1);
    history.push(Message::system(state.assistant.system_prompt()));
    history.extend_from_slice(&turns[start..]);

    run_response(state.assistant.agent().run(&req.message, &history).await)
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = Uuid::new_v4();
    state
        .insert_session(id, state.assistant.new_session())
        .await;
    info!(%id, "Session created");
    (StatusCode::CREATED, Json(SessionCreated { session_id: id }))
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.session(id).await {
        Some(session) => Json(SessionResponse {
            session_id: id,
            turns: session.lock().await.transcript().to_vec(),
        })
        .into_response(),
        None => session_not_found(id),
    }
}

async fn session_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionMessageRequest>,
) -> Response {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    let agent = state.assistant.agent();
    let mut session = session.lock().await;
    run_response(session.send(&agent, &req.message).await)
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.lock().await.remove(&id) {
        Some(_) => {
            info!(%id, "Session ended");
            StatusCode::NO_CONTENT.into_response()
        }
        None => session_not_found(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{request, tool_reply, ScriptedProvider};
    use crate::llm::ModelReply;
    use crate::store::testing::FakeBackend;
    use serde_json::{json, Value};

    fn state(provider: Arc<ScriptedProvider>, backend: FakeBackend) -> Arc<AppState> {
        let assistant =
            Assistant::with_parts(Settings::default(), Arc::new(backend), provider).unwrap();
        Arc::new(AppState::new(assistant))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_returns_answer_and_tool_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_reply(vec![request("get_low_stock_products", json!({}))])),
            Ok(ModelReply::text("Everything is well stocked.")),
        ]));
        let state = state(provider.clone(), FakeBackend::default());

        let response = chat(
            State(state),
            Json(ChatRequest {
                message: "What is low in stock?".to_string(),
                history: vec![Message::user("hi"), Message::assistant("Hello!")],
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Everything is well stocked.");
        assert_eq!(body["iterations"], 2);
        assert_eq!(body["exhausted"], false);
        assert_eq!(body["tool_calls"][0]["name"], "get_low_stock_products");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0].len(), 4);
    }

    #[tokio::test]
    async fn test_chat_trims_long_history() {
        let provider = Arc::new(ScriptedProvider::default());
        let state = state(provider.clone(), FakeBackend::default());

        let history: Vec<Message> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {}", i))
                } else {
                    Message::assistant(format!("answer {}", i))
                }
            })
            .collect();

        let response = chat(
            State(state),
            Json(ChatRequest {
                message: "latest".to_string(),
                history,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let seen = provider.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.len(), 11);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1].content, "answer 3");
        assert_eq!(sent[9].content, "answer 11");
        assert_eq!(sent[10].content, "latest");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let provider = Arc::new(ScriptedProvider::always(ModelReply::text("Cheers!")));
        let state = state(provider, FakeBackend::default());

        let created = create_session(State(state.clone())).await.into_response();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id: Uuid = serde_json::from_value(body_json(created).await["session_id"].clone())
            .unwrap();

        let reply = session_message(
            State(state.clone()),
            Path(id),
            Json(SessionMessageRequest {
                message: "Hello".to_string(),
            }),
        )
        .await;
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(body_json(reply).await["response"], "Cheers!");

        let transcript = body_json(get_session(State(state.clone()), Path(id)).await).await;
        assert_eq!(transcript["turns"].as_array().unwrap().len(), 2);
        assert_eq!(transcript["turns"][0]["role"], "user");

        let deleted = delete_session(State(state.clone()), Path(id)).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = delete_session(State(state), Path(id)).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    async fn new_session_id(state: &Arc<AppState>) -> Uuid {
        let created = create_session(State(state.clone())).await.into_response();
        serde_json::from_value(body_json(created).await["session_id"].clone()).unwrap()
    }

    #[tokio::test]
    async fn test_session_cap_drops_least_recently_used() {
        let assistant = Assistant::with_parts(
            Settings::default(),
            Arc::new(FakeBackend::default()),
            Arc::new(ScriptedProvider::default()),
        )
        .unwrap();
        let state = Arc::new(AppState {
            max_sessions: 2,
            ..AppState::new(assistant)
        });

        let first = new_session_id(&state).await;
        let second = new_session_id(&state).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(state.session(first).await.is_some());

        let third = new_session_id(&state).await;
        assert!(state.session(second).await.is_none());
        assert!(state.session(first).await.is_some());
        assert!(state.session(third).await.is_some());
        assert_eq!(state.sessions.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let assistant = Assistant::with_parts(
            Settings::default(),
            Arc::new(FakeBackend::default()),
            Arc::new(ScriptedProvider::default()),
        )
        .unwrap();
        let state = Arc::new(AppState {
            idle_timeout: Duration::ZERO,
            ..AppState::new(assistant)
        });

        let stale = new_session_id(&state).await;
        let fresh = new_session_id(&state).await;

        assert!(state.session(stale).await.is_none());
        assert!(state.session(fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = state(Arc::new(ScriptedProvider::default()), FakeBackend::default());
        let id = Uuid::new_v4();

        let response = session_message(
            State(state),
            Path(id),
            Json(SessionMessageRequest {
                message: "Hello".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
    }

    #[tokio::test]
    async fn test_invalid_input_maps_to_bad_request() {
        let response = agent_error(LisearchError::InvalidInput("bad".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = agent_error(LisearchError::Agent("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_tools_and_categories() {
        let backend = FakeBackend::default().with_rows(
            "categories",
            vec![json!({"name": "Wine"}), json!({"name": "Beer"})],
        );
        let state = state(Arc::new(ScriptedProvider::default()), backend);

        let tools = body_json(list_tools(State(state.clone())).await.into_response()).await;
        assert_eq!(tools["tools"].as_array().unwrap().len(), 7);

        let categories = body_json(list_categories(State(state)).await.into_response()).await;
        assert_eq!(categories["categories"], json!(["Wine", "Beer"]));
    }
}
