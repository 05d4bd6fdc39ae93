use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use nutri_core::LedgerError;
use nutri_core::dashboard::DashboardView;
use nutri_core::models::{
    DayKey, EntryOrder, FoodItem, GoalTargets, LogEntry, Sex, UserProfile, WeightClass,
};
use nutri_core::service::{FoodDetector, NutriService};

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB, room for a photo on /api/scan

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<NutriService>>,
    detector: Arc<dyn FoodDetector>,
    clock: Clock,
}

impl AppState {
    fn lock(&self) -> MutexGuard<'_, NutriService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> (DayKey, NaiveTime) {
        let now = (self.clock)();
        (DayKey::new(now.date()), now.time())
    }
}

// --- Request / Response types ---

/// Enum fields arrive as strings so bad values surface as ledger errors.
#[derive(Deserialize)]
struct FoodRequest {
    #[serde(default)]
    id: i64,
    name: String,
    calories_kcal: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    #[serde(default)]
    weight_class: Option<String>,
    #[serde(default)]
    digestion_estimate: String,
}

impl FoodRequest {
    fn into_item(self) -> nutri_core::Result<FoodItem> {
        let weight_class = match self.weight_class.as_deref() {
            Some(raw) => raw.parse::<WeightClass>()?,
            None => WeightClass::Medium,
        };
        Ok(FoodItem {
            id: self.id,
            name: self.name,
            calories_kcal: self.calories_kcal,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            weight_class,
            digestion_estimate: self.digestion_estimate,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogRequest {
    Food { food: FoodRequest },
    Query { query: String },
}

#[derive(Deserialize)]
struct ProfileRequest {
    weight_kg: f64,
    height_cm: f64,
    age_years: i64,
    sex: String,
}

impl ProfileRequest {
    fn into_profile(self) -> nutri_core::Result<UserProfile> {
        Ok(UserProfile {
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            age_years: self.age_years,
            sex: self.sex.parse::<Sex>()?,
        })
    }
}

#[derive(Deserialize)]
struct LogQuery {
    #[serde(default)]
    order: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Serialize)]
struct ProfileResponse {
    profile: Option<UserProfile>,
    goals: GoalTargets,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => Self::NotFound(msg),
            LedgerError::Persistence(inner) => Self::Internal(inner),
            e @ (LedgerError::InvalidProfile(_) | LedgerError::InvalidFoodItem(_)) => {
                Self::BadRequest(e.to_string())
            }
        }
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardView>, ApiError> {
    let (today, _) = state.now();
    let view = state.lock().dashboard(today)?;
    Ok(Json(view))
}

async fn get_log(
    State(state): State<AppState>,
    Query(params): Query<LogQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let order = match params.order.as_deref() {
        None | Some("newest") => EntryOrder::MostRecentFirst,
        Some("oldest") => EntryOrder::Chronological,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Invalid order '{other}'. Use 'newest' or 'oldest'"
            )));
        }
    };
    let (today, _) = state.now();
    let entries = state.lock().entries(today, order)?;
    Ok(Json(entries))
}

async fn create_log_entry(
    State(state): State<AppState>,
    payload: Result<Json<LogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let Json(req) = payload?;
    let (today, at) = state.now();
    let mut svc = state.lock();
    let entry = match req {
        LogRequest::Food { food } => svc.log_food(today, &food.into_item()?, at)?,
        LogRequest::Query { query } => svc.log_by_name(today, &query, at)?,
    };
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn clear_log(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.lock().clear_log()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn scan_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let (today, at) = state.now();
    let entry = state
        .lock()
        .log_detected(state.detector.as_ref(), &body, today, at)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let svc = state.lock();
    Json(ProfileResponse {
        profile: svc.profile().cloned(),
        goals: svc.goals(),
    })
}

async fn put_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(req) = payload?;
    let profile = req.into_profile()?;
    let mut svc = state.lock();
    let goals = svc.set_profile(profile)?;
    Ok(Json(ProfileResponse {
        profile: svc.profile().cloned(),
        goals,
    }))
}

async fn search_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<FoodItem>> {
    Json(state.lock().search_foods(&params.q))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route(
            "/api/log",
            get(get_log).post(create_log_entry).delete(clear_log),
        )
        .route("/api/scan", post(scan_image))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/foods/search", get(search_foods))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: NutriService,
    detector: Arc<dyn FoodDetector>,
    port: u16,
    bind: &str,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        detector,
        clock: Arc::new(|| Local::now().naive_local()),
    };

    let app = build_router(state);

    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(bind, port, "server started");
    axum::serve(listener, app).await?;

    Ok(())
}
