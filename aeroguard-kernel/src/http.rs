/**
 * API REST AEROGUARD - Serveur HTTP principal du kernel
 *
 * RÔLE :
 * Expose au dashboard le catalogue des établissements, les snapshots de
 * qualité de l'air par salle et le déclenchement des recommandations d'actions.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, sérialisation JSON automatique des réponses
 * - Routes : /health, /system/health, /facilities, /selection, /facilities/{id}/rooms/{room}
 * - Snapshots recalculés à chaque requête (aucun stockage) : même salle + même
 *   tranche de 5 min => même réponse, le dashboard peut poller librement
 * - Paramètre optionnel ?at=<epoch ms> pour rejouer un instant précis ; un
 *   instant hors de la plage représentable par `OffsetDateTime` => 400
 * - Échec du service de recommandation => 502 + message d'erreur, pas de retry
 */

use aeroguard_sim::{Catalog, Facility, RecommendActionsInput, RecommendActionsOutput, Room, RoomSnapshot, SnapshotGenerator};
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::health::{HealthTracker, KernelHealth};
use crate::recommender::{RecommendClient, RecommendError};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub generator: SnapshotGenerator,
    pub recommender: Arc<RecommendClient>,
    pub health_tracker: HealthTracker,
}

#[derive(Debug, Deserialize)]
struct AtParams {
    at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SelectionParams {
    facility: Option<String>,
    room: Option<String>,
}

#[derive(Debug, Serialize)]
struct SelectionView {
    facility: Facility,
    room: Room,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(code: StatusCode, msg: impl Into<String>) -> ApiError {
    (code, Json(serde_json::json!({ "error": msg.into() })))
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

// ?at absent => maintenant ; sinon l'instant doit être une date valide
fn requested_at(params: &AtParams) -> Result<i64, ApiError> {
    let Some(at) = params.at else {
        return Ok(now_ms());
    };
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at) * 1_000_000)
        .map(|_| at)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid `at` {at}: {e}")))
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let resp = next.run(req).await;
    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    resp
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/facilities", get(list_facilities))
        .route("/facilities/{facility_id}", get(get_facility))
        .route("/selection", get(get_selection))
        .route("/facilities/{facility_id}/rooms/{room_id}", get(get_room_snapshot))
        .route("/facilities/{facility_id}/rooms/{room_id}/recommendations", post(recommend_actions))
        .with_state(app_state)
        .layer(middleware::from_fn(log_requests))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.catalog))
}

// GET /facilities (liste)
async fn list_facilities(State(app): State<AppState>) -> Json<Vec<Facility>> {
    Json(app.catalog.facilities().to_vec())
}

// GET /facilities/{facility_id} (détail)
async fn get_facility(
    State(app): State<AppState>,
    Path(facility_id): Path<String>,
) -> Result<Json<Facility>, StatusCode> {
    let facility = app.catalog.facility(&facility_id).map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(facility.clone()))
}

// GET /selection?facility=..&room=.. (salle retenue quand le dashboard change d'établissement)
async fn get_selection(
    State(app): State<AppState>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<SelectionView>, ApiError> {
    let (facility, room) = match params.facility.as_deref() {
        None => app
            .catalog
            .default_selection()
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "catalog is empty"))?,
        Some(facility_id) => {
            let facility = app
                .catalog
                .facility(facility_id)
                .map_err(|e| api_error(StatusCode::NOT_FOUND, e.to_string()))?;
            let room = app
                .catalog
                .resolve_room(facility_id, params.room.as_deref().unwrap_or_default())
                .map_err(|e| api_error(StatusCode::NOT_FOUND, e.to_string()))?;
            (facility, room)
        }
    };
    Ok(Json(SelectionView { facility: facility.clone(), room: room.clone() }))
}

// GET /facilities/{facility_id}/rooms/{room_id}?at= (snapshot)
// Les identifiants inconnus tombent sur la politique par défaut, jamais d'erreur.
async fn get_room_snapshot(
    State(app): State<AppState>,
    Path((facility_id, room_id)): Path<(String, String)>,
    Query(params): Query<AtParams>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let at = requested_at(&params)?;
    let snapshot = app.generator.generate(&facility_id, &room_id, at);
    if snapshot.bacterial_load.is_high() {
        warn!(
            facility = %facility_id,
            room = %room_id,
            cfu = snapshot.bacterial_load.current,
            "bacterial load above high threshold"
        );
    }
    Ok(Json(snapshot))
}

// POST /facilities/{facility_id}/rooms/{room_id}/recommendations?at=
async fn recommend_actions(
    State(app): State<AppState>,
    Path((facility_id, room_id)): Path<(String, String)>,
    Query(params): Query<AtParams>,
) -> Result<Json<RecommendActionsOutput>, ApiError> {
    let at = requested_at(&params)?;
    let snapshot = app.generator.generate(&facility_id, &room_id, at);
    let input = RecommendActionsInput::from_snapshot(&snapshot);

    app.health_tracker.record_recommendation();
    match app.recommender.recommend(&input).await {
        Ok(out) => Ok(Json(out)),
        Err(e) => {
            warn!(facility = %facility_id, room = %room_id, "recommendation failed: {e}");
            app.health_tracker.record_recommendation_failure(&e.to_string());
            let code = match e {
                RecommendError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            Err(api_error(code, format!("Failed to get recommendations: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommenderConf;
    use crate::recommender::mock;
    use tokio::net::TcpListener;

    const T: i64 = 1_760_000_000_000;

    async fn spawn_app(recommender: Option<RecommenderConf>) -> (String, HealthTracker) {
        let health_tracker = HealthTracker::new();
        let state = AppState {
            catalog: Arc::new(Catalog::builtin()),
            generator: SnapshotGenerator::default(),
            recommender: Arc::new(RecommendClient::new(recommender).unwrap()),
            health_tracker: health_tracker.clone(),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        (format!("http://{addr}"), health_tracker)
    }

    #[tokio::test]
    async fn test_health_and_catalog() {
        let (base, _) = spawn_app(None).await;
        let body = reqwest::get(format!("{base}/health")).await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");

        let facilities: Vec<Facility> = reqwest::get(format!("{base}/facilities")).await.unwrap().json().await.unwrap();
        assert_eq!(facilities.len(), 5);

        let resp = reqwest::get(format!("{base}/facilities/nowhere")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let facility: Facility = reqwest::get(format!("{base}/facilities/new_hospital")).await.unwrap().json().await.unwrap();
        assert_eq!(facility.rooms.len(), 2);
    }

    #[tokio::test]
    async fn test_selection_falls_back_to_first_room() {
        let (base, _) = spawn_app(None).await;
        let sel: serde_json::Value = reqwest::get(format!("{base}/selection")).await.unwrap().json().await.unwrap();
        assert_eq!(sel["facility"]["id"], "mercy_general");
        assert_eq!(sel["room"]["id"], "icu_101");

        let sel: serde_json::Value = reqwest::get(format!("{base}/selection?facility=st_judes&room=icu_101"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(sel["room"]["id"], "pediatrics_a");

        let resp = reqwest::get(format!("{base}/selection?facility=nowhere")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_within_bucket() {
        let (base, _) = spawn_app(None).await;
        let url = |at: i64| format!("{base}/facilities/new_hospital/rooms/room_a?at={at}");

        let first: RoomSnapshot = reqwest::get(url(T)).await.unwrap().json().await.unwrap();
        let again: RoomSnapshot = reqwest::get(url(T + 1000)).await.unwrap().json().await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first, SnapshotGenerator::default().generate("new_hospital", "room_a", T));
        assert!((50..=70).contains(&first.bacterial_load.current));
        assert_eq!(first.cfu_history.len(), 48);
    }

    #[tokio::test]
    async fn test_unknown_room_still_served() {
        let (base, _) = spawn_app(None).await;
        let resp = reqwest::get(format!("{base}/facilities/unknown/rooms/ward_9?at={T}")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let snapshot: RoomSnapshot = resp.json().await.unwrap();
        assert_eq!(snapshot.cfu_history.len(), 288);
    }

    #[tokio::test]
    async fn test_out_of_range_instant_is_rejected() {
        let (base, health) = spawn_app(None).await;
        for at in [i64::MAX, i64::MIN, 253_402_300_800_000] {
            let resp = reqwest::get(format!("{base}/facilities/new_hospital/rooms/room_a?at={at}")).await.unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST, "at={at}");
            let body: serde_json::Value = resp.json().await.unwrap();
            assert!(body["error"].as_str().unwrap().contains("invalid `at`"));
        }

        let resp = reqwest::Client::new()
            .post(format!("{base}/facilities/new_hospital/rooms/room_a/recommendations?at={}", i64::MAX))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(health.get_health(&Catalog::builtin()).recommendations_requested, 0);

        // dernière milliseconde de l'an 9999 : encore valide
        let resp = reqwest::get(format!("{base}/facilities/new_hospital/rooms/room_a?at=253402300799999")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_recommendation_roundtrip() {
        let reply = mock::candidate(r#"{"actions":"Activate UV","reasoning":"Poor air"}"#);
        let conf = mock::spawn(StatusCode::OK, reply).await;
        let (base, health) = spawn_app(Some(conf)).await;

        let out: RecommendActionsOutput = reqwest::Client::new()
            .post(format!("{base}/facilities/facility/rooms/room_a/recommendations?at={T}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(out.actions, "Activate UV");

        let h = health.get_health(&Catalog::builtin());
        assert_eq!(h.recommendations_requested, 1);
        assert_eq!(h.recommendations_failed, 0);
    }

    #[tokio::test]
    async fn test_recommendation_failure_is_reported_once() {
        let conf = mock::spawn(StatusCode::SERVICE_UNAVAILABLE, serde_json::json!({"error": "down"})).await;
        let (base, health) = spawn_app(Some(conf)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/facilities/mercy_general/rooms/icu_2/recommendations"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Failed to get recommendations:"));

        let h = health.get_health(&Catalog::builtin());
        assert_eq!(h.recommendations_requested, 1);
        assert_eq!(h.recommendations_failed, 1);
        assert!(h.last_recommendation_error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_recommendation_not_configured() {
        let (base, _) = spawn_app(None).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/facilities/facility/rooms/room_b/recommendations"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let health: KernelHealth = reqwest::get(format!("{base}/system/health")).await.unwrap().json().await.unwrap();
        assert_eq!(health.recommendations_failed, 1);
    }
}
