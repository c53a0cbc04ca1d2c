//! Roster Aggregator - object-store-backed nurse roster aggregation server.

mod aggregate;
mod directory;
mod generator;
mod normalize;
mod schema;
mod search;
mod store;
mod week;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aggregate::{flatten, group_by_week_and_department, latest_week_roster};
use directory::NurseDirectory;
use generator::{GenerateRequest, GenerationJob, RosterServiceClient};
use schema::{CanonicalIndex, DayOfWeek, NurseProfile, SeniorityLevel, ShiftOfDay};
use store::{fetch_profiles, fetch_snapshots, supabase::SupabaseStore, SnapshotStore, StoreError};
use week::WeekResolver;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn SnapshotStore>,
    resolver: Arc<WeekResolver>,
    roster_service: Arc<RosterServiceClient>,
    jobs: Arc<RwLock<HashMap<String, GenerationJob>>>,
    history_prefix: String,
    nurse_data_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "roster_aggregator=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build collaborators up front; nothing global, everything injected.
    let object_store = SupabaseStore::from_env()?;
    info!("Object store client initialized");

    let roster_service = RosterServiceClient::from_env()?;
    info!("Roster service client initialized");

    let resolver = WeekResolver::new()?;

    let history_prefix = std::env::var("ROSTER_HISTORY_PREFIX")
        .unwrap_or_else(|_| "roster_history".to_string());
    let nurse_data_key = std::env::var("NURSE_DATA_KEY")
        .unwrap_or_else(|_| "raw_data/nurse_data/nurse.json".to_string());

    let state = AppState {
        store: Arc::new(object_store),
        resolver: Arc::new(resolver),
        roster_service: Arc::new(roster_service),
        jobs: Arc::new(RwLock::new(HashMap::new())),
        history_prefix,
        nurse_data_key,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/history", get(get_history))
        .route("/api/latest-roster", get(get_latest_roster))
        .route("/api/schedule", get(get_schedule))
        .route("/api/nurse-data", get(get_nurse_data))
        .route("/api/nurse-data/:id", get(get_nurse))
        .route("/api/search", get(search_roster))
        .route("/api/roster/generate", post(generate_roster))
        .route("/api/roster/generate/:id", get(get_generation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server listening on http://0.0.0.0:3000");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Flat history entries across every snapshot file.
async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<aggregate::HistoryEntry>>, (StatusCode, String)> {
    let files = fetch_snapshots(state.store.as_ref(), &state.history_prefix)
        .await
        .map_err(internal)?;

    let records = flatten(&files, &state.resolver);
    Ok(Json(group_by_week_and_department(records)))
}

/// The latest week's merged department rosters.
async fn get_latest_roster(
    State(state): State<AppState>,
) -> Result<Json<aggregate::LatestRoster>, (StatusCode, String)> {
    let files = fetch_snapshots(state.store.as_ref(), &state.history_prefix)
        .await
        .map_err(internal)?;

    let records = flatten(&files, &state.resolver);
    match latest_week_roster(&records) {
        Some(roster) => {
            info!(
                "latest week {} with {} departments from {} files",
                roster.week,
                roster.departments.len(),
                roster.file_count
            );
            Ok(Json(roster))
        }
        // Zero usable snapshots is a no-data condition, not a failure.
        None => Err((StatusCode::NOT_FOUND, "No roster history found".to_string())),
    }
}

#[derive(serde::Serialize)]
struct ScheduleResponse {
    week: String,
    monday: chrono::NaiveDate,
    schedule: CanonicalIndex,
}

/// The latest week's canonical schedule index (the timetable feed).
async fn get_schedule(
    State(state): State<AppState>,
) -> Result<Json<ScheduleResponse>, (StatusCode, String)> {
    let (week, schedule) = latest_index(&state).await?;
    if schedule.is_empty() {
        warn!("latest week {} produced an empty schedule index", week);
    }
    let monday = state.resolver.monday_of(&week);
    Ok(Json(ScheduleResponse { week, monday, schedule }))
}

#[derive(serde::Deserialize)]
struct NurseDataQuery {
    skill: Option<String>,
    /// Comma-separated list; every named skill must be present.
    skills: Option<String>,
    seniority: Option<SeniorityLevel>,
    min_years: Option<u32>,
    max_years: Option<u32>,
}

#[derive(serde::Serialize)]
struct NurseDataResponse {
    count: usize,
    nurses: Vec<NurseProfile>,
    lookup: NurseDirectory,
}

/// Nurse profiles with optional skill/seniority/experience filters.
async fn get_nurse_data(
    State(state): State<AppState>,
    Query(query): Query<NurseDataQuery>,
) -> Result<Json<NurseDataResponse>, (StatusCode, String)> {
    let mut profiles = fetch_profiles(state.store.as_ref(), &state.nurse_data_key)
        .await
        .map_err(internal)?;

    if let Some(skill) = &query.skill {
        profiles = directory::filter_by_skill(&profiles, skill);
    }
    if let Some(skills) = &query.skills {
        let required: Vec<&str> = skills.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        profiles = directory::with_all_skills(&profiles, &required);
    }
    if let Some(level) = query.seniority {
        profiles = directory::filter_by_seniority(&profiles, level);
    }
    if query.min_years.is_some() || query.max_years.is_some() {
        profiles = directory::filter_by_experience(
            &profiles,
            query.min_years.unwrap_or(0),
            query.max_years.unwrap_or(u32::MAX),
        );
    }

    let lookup = NurseDirectory::build(profiles.clone());
    if lookup.is_empty() {
        warn!("nurse directory is empty after filtering");
    }

    Ok(Json(NurseDataResponse {
        count: profiles.len(),
        nurses: profiles,
        lookup,
    }))
}

/// One nurse profile by id.
async fn get_nurse(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NurseProfile>, (StatusCode, String)> {
    let profiles = fetch_profiles(state.store.as_ref(), &state.nurse_data_key)
        .await
        .map_err(internal)?;

    NurseDirectory::build(profiles)
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("Unknown nurse id: {}", id)))
}

#[derive(serde::Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(serde::Serialize)]
struct SearchResponse {
    query: String,
    department: Option<String>,
}

/// Locate which department's timetable contains a matching nurse.
async fn search_roster(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let q = query.q.unwrap_or_default();
    let (_, index) = latest_index(&state).await?;

    // Name matching still works without the directory; ids always match.
    let profiles = match fetch_profiles(state.store.as_ref(), &state.nurse_data_key).await {
        Ok(profiles) => profiles,
        Err(err) => {
            warn!("nurse directory unavailable, matching ids only: {}", err);
            Vec::new()
        }
    };
    let nurse_directory = NurseDirectory::build(profiles);
    debug!(
        "searching latest index against {} directory profiles",
        nurse_directory.len()
    );

    let department = search::locate(
        &index,
        &nurse_directory,
        &ShiftOfDay::ALL,
        &DayOfWeek::ALL,
        &q,
    );
    Ok(Json(SearchResponse { query: q, department }))
}

/// Submit a roster-generation request to the optimizer service.
async fn generate_roster(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationJob>, (StatusCode, String)> {
    let summary = state.roster_service.generate(&request).await.map_err(|e| {
        error!("roster generation failed: {}", e);
        (StatusCode::BAD_GATEWAY, format!("Roster generation failed: {}", e))
    })?;

    let job = GenerationJob::new(request, summary);

    // Track the job for later retrieval
    {
        let mut jobs = state.jobs.write().unwrap();
        jobs.insert(job.id.clone(), job.clone());
    }

    info!("Roster generation complete: {}", job.id);
    Ok(Json(job))
}

/// Get a previously submitted generation job by id.
async fn get_generation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerationJob>, StatusCode> {
    let jobs = state.jobs.read().unwrap();
    jobs.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Fetch snapshots, select the latest week, and normalize its merged
/// roster into the canonical index.
async fn latest_index(state: &AppState) -> Result<(String, CanonicalIndex), (StatusCode, String)> {
    let files = fetch_snapshots(state.store.as_ref(), &state.history_prefix)
        .await
        .map_err(internal)?;

    let records = flatten(&files, &state.resolver);
    let roster = latest_week_roster(&records)
        .ok_or((StatusCode::NOT_FOUND, "No roster history found".to_string()))?;

    // The merged roster has the same department shape a snapshot does, so
    // it normalizes through the same path.
    let merged =
        serde_json::json!({ "week": &roster.week, "departments": &roster.departments });
    Ok((roster.week, normalize::normalize(&merged)))
}

fn internal(err: StoreError) -> (StatusCode, String) {
    error!("store access failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
