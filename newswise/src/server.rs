use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::data::{Data, ToByteUnit};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Rocket, State};
use serde::Serialize;

use common::{Config, ServerConfig};

use crate::context::{ContextService, SummaryReply, TopicReply};
use crate::feed::NewsService;
use crate::model::{Article, NewsResponse, User};
use crate::personalization::Recommender;
use crate::storage::{EmailTaken, NewUser, UserStore};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Option<Arc<Config>>,
    pub users: Arc<dyn UserStore>,
    /// Absent when no LLM provider is configured
    pub context: Option<Arc<ContextService>>,
    pub news: Arc<NewsService>,
    pub recommender: Arc<Recommender>,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    configured_users: usize,
    recommendation_source: String,
    llm_enabled: bool,
}

async fn read_text(body: Data<'_>) -> Result<String, Status> {
    let text = body
        .open(2.mebibytes())
        .into_string()
        .await
        .map_err(|e| {
            tracing::warn!("failed to read request body: {}", e);
            Status::BadRequest
        })?;
    if !text.is_complete() {
        return Err(Status::PayloadTooLarge);
    }
    Ok(text.into_inner())
}

fn context_service(state: &AppState) -> Result<&ContextService, Status> {
    state.context.as_deref().ok_or_else(|| {
        tracing::warn!("context request received but no LLM provider is configured");
        Status::ServiceUnavailable
    })
}

fn internal(what: &'static str) -> impl FnOnce(anyhow::Error) -> Status {
    move |e| {
        tracing::error!("{}: {:#}", what, e);
        Status::InternalServerError
    }
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning simple JSON with uptime and basic config info.
#[get("/api/v1/status")]
async fn server_status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let configured_users = state.config.as_ref().map(|c| c.users.len()).unwrap_or(0);

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        configured_users,
        recommendation_source: state.recommender.source().to_string(),
        llm_enabled: state.context.is_some(),
    })
}

// --- news ---

/// Missing `sources` answers 400.
#[get("/api/news/summarized-news?<sources>")]
async fn summarized_news(
    state: &State<AppState>,
    sources: Option<String>,
) -> Result<Json<NewsResponse>, Status> {
    let sources = sources.ok_or_else(|| {
        tracing::warn!("summarized-news request without sources");
        Status::BadRequest
    })?;
    state
        .news
        .categorized_and_summarized(&sources)
        .await
        .map(Json)
        .map_err(internal("failed to build summarized news"))
}

// --- context / llm ---

#[post("/api/context/topic", data = "<body>")]
async fn context_topic(state: &State<AppState>, body: Data<'_>) -> Result<Json<TopicReply>, Status> {
    let text = read_text(body).await?;
    let topic = context_service(state)?
        .get_topic(&text)
        .await
        .map_err(internal("topic classification failed"))?;
    Ok(Json(TopicReply { topic: Some(topic) }))
}

#[post("/api/context/summarize", data = "<body>")]
async fn context_summarize(
    state: &State<AppState>,
    body: Data<'_>,
) -> Result<Json<SummaryReply>, Status> {
    let text = read_text(body).await?;
    let summary = context_service(state)?
        .summarize_article(&text)
        .await
        .map_err(internal("summarization failed"))?;
    Ok(Json(SummaryReply {
        summary: Some(summary),
    }))
}

async fn generate_text(state: &AppState, body: Data<'_>) -> Result<String, Status> {
    let text = read_text(body).await?;
    context_service(state)?
        .generate_response(&text)
        .await
        .map_err(internal("generation failed"))
}

#[post("/api/context/generate", data = "<body>")]
async fn context_generate(state: &State<AppState>, body: Data<'_>) -> Result<String, Status> {
    generate_text(state, body).await
}

#[post("/api/llm/generate", data = "<body>")]
async fn llm_generate(state: &State<AppState>, body: Data<'_>) -> Result<String, Status> {
    generate_text(state, body).await
}

/// Plain-text variant of `/api/context/summarize`.
#[post("/api/llm/summarize", data = "<body>")]
async fn llm_summarize(state: &State<AppState>, body: Data<'_>) -> Result<String, Status> {
    let text = read_text(body).await?;
    context_service(state)?
        .summarize_article(&text)
        .await
        .map_err(internal("summarization failed"))
}

// --- users ---

#[post("/users", data = "<body>")]
async fn create_user(
    state: &State<AppState>,
    body: Json<NewUser>,
) -> Result<status::Created<Json<User>>, Status> {
    let user = state.users.create(&body).await.map_err(|e| {
        if e.downcast_ref::<EmailTaken>().is_some() {
            tracing::info!("rejected user creation: {}", e);
            Status::Conflict
        } else {
            internal("failed to create user")(e)
        }
    })?;
    Ok(status::Created::new(format!("/users/{}", user.id)).body(Json(user)))
}

#[get("/users/<id>")]
async fn get_user(state: &State<AppState>, id: i64) -> Result<Json<User>, Status> {
    state
        .users
        .find_by_id(id)
        .await
        .map_err(internal("failed to fetch user"))?
        .map(Json)
        .ok_or(Status::NotFound)
}

#[get("/users/by-email?<email>")]
async fn get_user_by_email(state: &State<AppState>, email: String) -> Result<Json<User>, Status> {
    state
        .users
        .find_by_email(&email)
        .await
        .map_err(internal("failed to fetch user by email"))?
        .map(Json)
        .ok_or(Status::NotFound)
}

#[get("/users/<id>/interest")]
async fn get_user_interest(state: &State<AppState>, id: i64) -> Result<String, Status> {
    state
        .users
        .interest(id)
        .await
        .map_err(internal("failed to fetch user interest"))?
        .ok_or(Status::NotFound)
}

// --- recommendations ---

/// Personalized feed. `sources` overrides the configured news source.
#[get("/recommendations/feed/<user_id>?<sources>")]
async fn recommendation_feed(
    state: &State<AppState>,
    user_id: i64,
    sources: Option<String>,
) -> Result<Json<Vec<Article>>, Status> {
    let recommender = &state.recommender;
    let sources = sources.as_deref().unwrap_or_else(|| recommender.source());
    recommender
        .matching_articles_from(user_id, sources)
        .await
        .map(Json)
        .map_err(internal("failed to build recommendation feed"))
}

#[get("/recommendations/feed/pref/<user_id>")]
async fn recommendation_preferences(state: &State<AppState>, user_id: i64) -> Result<String, Status> {
    state
        .recommender
        .user_preference(user_id)
        .await
        .map_err(internal("failed to fetch user preference"))?
        .ok_or(Status::NotFound)
}

// --- gateway fallback ---

const USERS_UNAVAILABLE: &str = "User Service is currently unavailable. Please try again later.";
const NEWS_UNAVAILABLE: &str = "News Service is currently unavailable. Please try again later.";
const CONTEXT_UNAVAILABLE: &str = "Context Service is currently unavailable. Please try again later.";
const LLM_UNAVAILABLE: &str = "LLM Service is currently unavailable. Please try again later.";
const RECOMMENDATIONS_UNAVAILABLE: &str =
    "Recommendation Service is currently unavailable. Please try again later.";

/// Static unavailability message for a service name.
pub fn fallback_message(service: &str) -> Option<&'static str> {
    match service {
        "users" => Some(USERS_UNAVAILABLE),
        "news" => Some(NEWS_UNAVAILABLE),
        "context" => Some(CONTEXT_UNAVAILABLE),
        "llm" => Some(LLM_UNAVAILABLE),
        "recommendations" => Some(RECOMMENDATIONS_UNAVAILABLE),
        _ => None,
    }
}

#[get("/fallback/<service>")]
async fn fallback(service: &str) -> Option<&'static str> {
    fallback_message(service)
}

type Unavailable = status::Custom<&'static str>;

#[catch(500)]
fn users_unavailable() -> Unavailable {
    status::Custom(Status::ServiceUnavailable, USERS_UNAVAILABLE)
}

#[catch(500)]
fn news_unavailable() -> Unavailable {
    status::Custom(Status::ServiceUnavailable, NEWS_UNAVAILABLE)
}

#[catch(500)]
fn context_unavailable() -> Unavailable {
    status::Custom(Status::ServiceUnavailable, CONTEXT_UNAVAILABLE)
}

#[catch(500)]
fn llm_unavailable() -> Unavailable {
    status::Custom(Status::ServiceUnavailable, LLM_UNAVAILABLE)
}

#[catch(500)]
fn recommendations_unavailable() -> Unavailable {
    status::Custom(Status::ServiceUnavailable, RECOMMENDATIONS_UNAVAILABLE)
}

/// Build the Rocket instance with managed state, routes and fallback catchers,
/// applying `[server] bind` and `port` when configured.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let mut fig = rocket::Config::figment();
    if let Some(bind) = &server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = server.port {
        fig = fig.merge(("port", port));
    }

    rocket::custom(fig)
        .manage(state)
        .mount(
            "/",
            routes![
                health,
                server_status,
                summarized_news,
                context_topic,
                context_summarize,
                context_generate,
                llm_generate,
                llm_summarize,
                create_user,
                get_user,
                get_user_by_email,
                get_user_interest,
                recommendation_feed,
                recommendation_preferences,
                fallback,
            ],
        )
        .register("/users", catchers![users_unavailable])
        .register("/api/news", catchers![news_unavailable])
        .register("/api/context", catchers![context_unavailable])
        .register("/api/llm", catchers![llm_unavailable])
        .register("/recommendations", catchers![recommendations_unavailable])
}

pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> Result<()> {
    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state, server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
