//! Chat front end.
//!
//! - `GET  /`          - chat page with a language picker
//! - `POST /ask`       - `{query, language?}` routed to an agent, `{response}` back
//! - `POST /ask/photo` - multipart `photo` + `language`, straight to crop diagnosis

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use kisan_agent::AgentRuntime;
use kisan_core::InterfaceError;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, info, warn};
use uuid::Uuid;

const INDEX_TEMPLATE: &str = "index.html";
const PHOTO_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub const LANGUAGES: [&str; 5] = ["English", "हिन्दी", "ಕನ್ನಡ", "తెలుగు", "தமிழ்"];

#[derive(Clone)]
pub struct WebState {
    runtime: Arc<AgentRuntime>,
    templates: Arc<Tera>,
    default_language: String,
    upload_dir: PathBuf,
}

impl WebState {
    pub fn new(
        runtime: Arc<AgentRuntime>,
        default_language: impl Into<String>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            templates: init_templates(),
            default_language: default_language.into(),
            upload_dir: upload_dir.into(),
        }
    }

    fn language_or_default(&self, language: Option<String>) -> String {
        language
            .map(|language| language.trim().to_string())
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| self.default_language.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
    pub language: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

type WebError = (StatusCode, Json<ErrorBody>);

fn init_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(error) =
        tera.add_raw_template(INDEX_TEMPLATE, include_str!("../../../templates/chat/index.html"))
    {
        warn!(event_name = "server.web.template_invalid", error = %error, "chat page template rejected");
    }
    Arc::new(tera)
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ask", post(ask))
        .route("/ask/photo", post(ask_photo).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)))
        .with_state(state)
}

async fn index(State(state): State<WebState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let mut context = Context::new();
    context.insert("title", "Kisan Mitra");
    context.insert("languages", &LANGUAGES);
    context.insert("default_language", &state.default_language);

    state.templates.render(INDEX_TEMPLATE, &context).map(Html).map_err(|error| {
        error!(event_name = "server.web.render_failed", error = %error, "chat page render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Template Error</h1>".to_string()))
    })
}

async fn ask(State(state): State<WebState>, Json(request): Json<AskRequest>) -> Json<AskResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let language = state.language_or_default(request.language);
    info!(
        event_name = "server.web.ask",
        correlation_id = %correlation_id,
        language = %language,
        query_chars = request.query.chars().count(),
        "text query received"
    );

    let runtime = state.runtime.clone();
    let query = request.query;
    let query_id = correlation_id.clone();
    let response = guarded(correlation_id, async move {
        runtime.handle_query_with_id(&query_id, &query, &language).await
    })
    .await;
    Json(AskResponse { response })
}

async fn ask_photo(
    State(state): State<WebState>,
    mut multipart: Multipart,
) -> Result<Json<AskResponse>, WebError> {
    let correlation_id = Uuid::new_v4().to_string();
    let mut language = None;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| bad_request(&correlation_id, format!("malformed upload: {error}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|error| {
                    bad_request(&correlation_id, format!("photo could not be read: {error}"))
                })?;
                photo = Some((file_name, bytes));
            }
            "language" => {
                let text = field.text().await.map_err(|error| {
                    bad_request(&correlation_id, format!("language could not be read: {error}"))
                })?;
                language = Some(text);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = photo.filter(|(_, bytes)| !bytes.is_empty()) else {
        return Err(bad_request(&correlation_id, "a `photo` file is required".to_string()));
    };
    let language = state.language_or_default(language);

    let path = state.upload_dir.join(stored_file_name(&file_name));
    if let Err(error) = tokio::fs::write(&path, &bytes).await {
        return Err(internal(&correlation_id, format!("upload could not be saved: {error}")));
    }
    info!(
        event_name = "server.web.photo_saved",
        correlation_id = %correlation_id,
        path = %path.display(),
        bytes = bytes.len(),
        "photo upload saved"
    );

    let runtime = state.runtime.clone();
    let image_path = path.to_string_lossy().into_owned();
    let diagnose_id = correlation_id.clone();
    let response = guarded(correlation_id.clone(), async move {
        runtime.diagnose_with_id(&diagnose_id, &image_path, &language).await
    })
    .await;

    if let Err(error) = tokio::fs::remove_file(&path).await {
        warn!(
            event_name = "server.web.photo_cleanup_failed",
            correlation_id = %correlation_id,
            path = %path.display(),
            error = %error,
            "photo upload could not be removed"
        );
    }
    Ok(Json(AskResponse { response }))
}

/// Runs one dispatch on its own task so a panic inside an agent becomes the
/// generic failure reply instead of a dropped connection.
async fn guarded<F>(correlation_id: String, dispatch: F) -> String
where
    F: Future<Output = String> + Send + 'static,
{
    match tokio::spawn(dispatch).await {
        Ok(response) => response,
        Err(join_error) => {
            let failure = InterfaceError::Internal { message: join_error.to_string(), correlation_id };
            error!(
                event_name = "server.web.dispatch_failed",
                correlation_id = %failure.correlation_id(),
                error = %failure,
                "dispatch task failed"
            );
            failure.user_message().to_string()
        }
    }
}

fn bad_request(correlation_id: &str, message: String) -> WebError {
    interface_error(InterfaceError::BadRequest {
        message,
        correlation_id: correlation_id.to_string(),
    })
}

fn internal(correlation_id: &str, message: String) -> WebError {
    interface_error(InterfaceError::Internal { message, correlation_id: correlation_id.to_string() })
}

fn interface_error(failure: InterfaceError) -> WebError {
    let status = match failure {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "server.web.request_rejected",
        correlation_id = %failure.correlation_id(),
        error = %failure,
        "request rejected"
    );
    (
        status,
        Json(ErrorBody {
            error: failure.user_message().to_string(),
            correlation_id: failure.correlation_id().to_string(),
        }),
    )
}

/// Upload name on disk: the client's base name reduced to a safe character
/// set, prefixed with a fresh id so concurrent uploads never collide.
fn stored_file_name(client_name: &str) -> String {
    let base = Path::new(client_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '_') {
                character
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_start_matches('.');
    let safe = if safe.is_empty() { "photo.jpg" } else { safe };
    format!("{}-{safe}", Uuid::new_v4().simple())
}
