//! HTTP route handlers.
//!
//! All handlers are thin - they parse the request, call one service
//! operation and format the result. Errors render through `ZoneError`.

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::api::response::{action_ok, api_error, api_success, remote_response, room_ok};
use crate::api::AppState;
use crate::error::{ZoneError, ZoneResult};
use crate::protocol_constants::{DEFAULT_QUEUE_LIMIT, SERVICE_ID};
use crate::remote::{self, ActionRequest, InputRequest, NavigateRequest};
use crate::services::{
    EqualizerSettings, PlayerAction, ReconcileOutcome, SpotifyAction, VolumeDirection, VolumeMode,
};
use crate::sonos::types::DesiredGrouping;

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GroupRequest {
    coordinator: String,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Deserialize)]
struct QueueQuery {
    detailed: Option<String>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct SeekQuery {
    track: Option<u32>,
    elapsed: Option<u32>,
}

#[derive(Deserialize)]
struct LineInQuery {
    source: Option<String>,
}

/// Parses a volume path argument: `"+n"` / `"-n"` are relative, a bare
/// number is absolute.
fn parse_volume_arg(value: &str) -> ZoneResult<(i32, VolumeMode)> {
    let value = value.trim();
    let mode = if value.starts_with('+') || value.starts_with('-') {
        VolumeMode::Relative
    } else {
        VolumeMode::Absolute
    };
    let number = value
        .trim_start_matches('+')
        .parse::<i32>()
        .map_err(|_| ZoneError::InvalidRequest(format!("invalid volume '{}'", value)))?;
    Ok((number, mode))
}

/// `?detailed`, `?detailed=true` and `?detailed=1` all ask for detail.
fn flag_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !matches!(v, "false" | "0"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Household
        .route("/api/zones", get(list_zones))
        .route("/api/players", get(list_players))
        .route("/api/favorites", get(list_favorites))
        .route("/api/playlists", get(list_playlists))
        .route("/api/reindex", post(reindex))
        .route("/api/pauseall", post(pause_all))
        .route("/api/groups", post(create_group))
        // Rooms
        .route("/api/rooms/{room}/state", get(room_state))
        .route("/api/rooms/{room}/play", post(play))
        .route("/api/rooms/{room}/pause", post(pause))
        .route("/api/rooms/{room}/playpause", post(play_pause))
        .route("/api/rooms/{room}/next", post(next))
        .route("/api/rooms/{room}/previous", post(previous))
        .route("/api/rooms/{room}/volume/{value}", post(set_volume))
        .route("/api/rooms/{room}/groupVolume", get(get_group_volume))
        .route("/api/rooms/{room}/groupVolume/{value}", post(set_group_volume))
        .route("/api/rooms/{room}/mute", post(mute))
        .route("/api/rooms/{room}/unmute", post(unmute))
        .route("/api/rooms/{room}/togglemute", post(toggle_mute))
        .route("/api/rooms/{room}/groupMute", post(group_mute))
        .route("/api/rooms/{room}/groupUnmute", post(group_unmute))
        .route("/api/rooms/{room}/join/{coordinator}", post(join))
        .route("/api/rooms/{room}/leave", post(leave))
        .route("/api/rooms/{room}/favorite/{name}", post(play_favorite))
        .route("/api/rooms/{room}/playlist/{name}", post(play_playlist))
        .route("/api/rooms/{room}/clearqueue", post(clear_queue))
        .route("/api/rooms/{room}/queue", get(get_queue))
        .route("/api/rooms/{room}/seek", post(seek))
        .route("/api/rooms/{room}/sleep/{value}", post(sleep))
        .route("/api/rooms/{room}/linein", post(line_in))
        .route("/api/rooms/{room}/playmode/{mode}", post(play_mode))
        .route("/api/rooms/{room}/equalizer", post(equalizer))
        .route("/api/rooms/{room}/spotify/{action}/{uri}", post(spotify))
        .route("/api/rooms/{room}/tunein/{station}", post(tunein))
        // Default-zone shortcuts
        .route("/music/start/{playlist}", post(start_music))
        .route("/music/{action}", post(music_action))
        .route("/volume/{direction}", post(volume_step))
        // Universal remote
        .route("/device/power", post(device_power))
        .route("/device/power/{action}", get(device_power_get))
        .route("/device/volume", post(device_volume))
        .route("/device/mute", post(device_mute))
        .route("/device/input", post(device_input))
        .route("/device/channel", post(device_channel))
        .route("/device/navigate", post(device_navigate))
        .route("/command/{name}", post(custom_command))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    log::info!("[HTTP] {} {}", req.method(), req.uri().path());
    next.run(req).await
}

async fn not_found() -> impl IntoResponse {
    api_error(StatusCode::NOT_FOUND, "Endpoint not found")
}

// ─────────────────────────────────────────────────────────────────────────────
// Household Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe. Does not touch the speakers.
async fn health_check() -> impl IntoResponse {
    api_success(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "timestamp": remote::timestamp(),
    }))
}

async fn list_zones(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    Ok(api_success(state.playback.zones().await?))
}

async fn list_players(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    Ok(api_success(state.playback.players().await?))
}

async fn list_favorites(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    Ok(api_success(state.library.favorites().await?))
}

async fn list_playlists(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    Ok(api_success(state.library.playlists().await?))
}

async fn reindex(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    state.library.reindex().await?;
    Ok(api_success(json!({ "success": true })))
}

async fn pause_all(State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    let paused = state.playback.pause_all().await?;
    Ok(api_success(json!({ "success": true, "paused": paused })))
}

/// Reconciles the household toward `{coordinator, members}`.
async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<GroupRequest>,
) -> ZoneResult<impl IntoResponse> {
    let desired = DesiredGrouping::new(payload.coordinator, payload.members);
    let body = match state.reconciler.reconcile(&desired).await? {
        ReconcileOutcome::NotApplicable => json!({ "applied": false }),
        ReconcileOutcome::Applied(report) => json!({
            "applied": true,
            "coordinator": report.coordinator,
            "case": report.case,
            "steps": report.steps,
            "deferredJoins": report.deferred_joins,
        }),
    };
    Ok(api_success(body))
}

// ─────────────────────────────────────────────────────────────────────────────
// Room Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn room_state(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    Ok(api_success(state.playback.state(&room).await?))
}

async fn run_player_action(
    state: &AppState,
    room: &str,
    action: PlayerAction,
) -> ZoneResult<Response> {
    let paused = state.playback.player_action(room, action).await?;
    let extra = match paused {
        Some(paused) => json!({ "paused": paused }),
        None => json!({}),
    };
    Ok(room_ok(room, extra).into_response())
}

async fn play(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    run_player_action(&state, &room, PlayerAction::Play).await
}

async fn pause(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    run_player_action(&state, &room, PlayerAction::Pause).await
}

async fn play_pause(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    run_player_action(&state, &room, PlayerAction::PlayPause).await
}

async fn next(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    state.playback.next(&room).await?;
    Ok(room_ok(&room, json!({})))
}

async fn previous(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.previous(&room).await?;
    Ok(room_ok(&room, json!({})))
}

/// Player volume: absolute, or relative with a `+`/`-` sign.
async fn set_volume(
    Path((room, value)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let volume = match parse_volume_arg(&value)? {
        (v, VolumeMode::Absolute) => {
            state.playback.set_volume(&room, v).await?;
            v
        }
        (delta, VolumeMode::Relative) => state.playback.adjust_volume(&room, delta).await?,
    };
    Ok(room_ok(&room, json!({ "volume": volume })))
}

async fn get_group_volume(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let volume = state.playback.group_volume(&room).await?;
    Ok(room_ok(&room, json!({ "groupVolume": volume })))
}

async fn set_group_volume(
    Path((room, value)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let (value, mode) = parse_volume_arg(&value)?;
    let volume = state.playback.zone_action(&room, value, mode).await?;
    Ok(room_ok(&room, json!({ "groupVolume": volume })))
}

async fn mute(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    state.playback.mute(&room).await?;
    Ok(room_ok(&room, json!({ "muted": true })))
}

async fn unmute(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    state.playback.unmute(&room).await?;
    Ok(room_ok(&room, json!({ "muted": false })))
}

async fn toggle_mute(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let muted = state.playback.toggle_mute(&room).await?;
    Ok(room_ok(&room, json!({ "muted": muted })))
}

async fn group_mute(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.group_mute(&room).await?;
    Ok(room_ok(&room, json!({ "groupMuted": true })))
}

async fn group_unmute(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.group_unmute(&room).await?;
    Ok(room_ok(&room, json!({ "groupMuted": false })))
}

async fn join(
    Path((room, coordinator)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.reconciler.join(&room, &coordinator).await?;
    Ok(room_ok(&room, json!({ "coordinator": coordinator })))
}

async fn leave(Path(room): Path<String>, State(state): State<AppState>) -> ZoneResult<impl IntoResponse> {
    state.reconciler.leave(&room).await?;
    Ok(room_ok(&room, json!({})))
}

async fn play_favorite(
    Path((room, name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let favorite = state.library.play_favorite(&room, &name).await?;
    Ok(room_ok(&room, json!({ "favorite": favorite.title })))
}

async fn play_playlist(
    Path((room, name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let playlist = state.library.play_playlist(&room, &name).await?;
    Ok(room_ok(&room, json!({ "playlist": playlist.title })))
}

async fn clear_queue(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.library.clear_queue(&room).await?;
    Ok(room_ok(&room, json!({})))
}

async fn get_queue(
    Path(room): Path<String>,
    Query(query): Query<QueueQuery>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let queue = state
        .library
        .queue(
            &room,
            flag_set(query.detailed.as_deref()),
            query.limit.unwrap_or(DEFAULT_QUEUE_LIMIT),
        )
        .await?;
    Ok(api_success(queue))
}

async fn seek(
    Path(room): Path<String>,
    Query(query): Query<SeekQuery>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.seek(&room, query.track, query.elapsed).await?;
    Ok(room_ok(&room, json!({})))
}

async fn sleep(
    Path((room, value)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let timer = state.playback.sleep(&room, &value).await?;
    Ok(room_ok(&room, json!({ "sleep": timer })))
}

async fn line_in(
    Path(room): Path<String>,
    Query(query): Query<LineInQuery>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.line_in(&room, query.source.as_deref()).await?;
    Ok(room_ok(&room, json!({ "source": query.source.as_deref().unwrap_or(&room) })))
}

async fn play_mode(
    Path((room, mode)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.play_mode(&room, &mode).await?;
    Ok(room_ok(&room, json!({ "playMode": mode })))
}

async fn equalizer(
    Path(room): Path<String>,
    State(state): State<AppState>,
    Json(settings): Json<EqualizerSettings>,
) -> ZoneResult<impl IntoResponse> {
    state.playback.equalizer(&room, &settings).await?;
    Ok(room_ok(&room, json!({})))
}

async fn spotify(
    Path((room, action, uri)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let action: SpotifyAction = action.parse()?;
    let native = state.library.spotify(&room, action, &uri).await?;
    Ok(room_ok(&room, json!({ "uri": native })))
}

async fn tunein(
    Path((room, station)): Path<(String, String)>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let native = state.library.tunein(&room, &station).await?;
    Ok(room_ok(&room, json!({ "uri": native })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shortcut Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn start_music(
    Path(playlist): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let started = state.music.start_music(&playlist).await?;
    Ok(action_ok(
        "play",
        json!({
            "favorite": started.favorite,
            "coordinator": started.coordinator,
            "rooms": started.rooms,
            "deferredJoins": started.deferred_joins,
        }),
    ))
}

async fn music_action(
    Path(action): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let paused = state.music.music_action(&action).await?;
    Ok(action_ok(
        &action,
        match paused {
            Some(paused) => json!({ "paused": paused }),
            None => json!({}),
        },
    ))
}

async fn volume_step(
    Path(direction): Path<String>,
    State(state): State<AppState>,
) -> ZoneResult<impl IntoResponse> {
    let step: VolumeDirection = direction.parse()?;
    let volume = state.music.volume_step(step).await?;
    Ok(action_ok(&direction, json!({ "groupVolume": volume })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn device_power(Json(req): Json<ActionRequest>) -> impl IntoResponse {
    remote_response(remote::power(&req))
}

async fn device_power_get(Path(action): Path<String>) -> impl IntoResponse {
    api_success(remote::power_get(&action))
}

async fn device_volume(Json(req): Json<ActionRequest>) -> impl IntoResponse {
    remote_response(remote::volume(&req))
}

async fn device_mute(Json(req): Json<ActionRequest>) -> impl IntoResponse {
    remote_response(remote::mute(&req))
}

async fn device_input(Json(req): Json<InputRequest>) -> impl IntoResponse {
    remote_response(remote::input(&req))
}

async fn device_channel(Json(req): Json<ActionRequest>) -> impl IntoResponse {
    remote_response(remote::channel(&req))
}

async fn device_navigate(Json(req): Json<NavigateRequest>) -> impl IntoResponse {
    remote_response(remote::navigate(&req))
}

/// Echoes any JSON payload; an empty body echoes `null`.
async fn custom_command(Path(name): Path<String>, body: Bytes) -> ZoneResult<impl IntoResponse> {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ZoneError::InvalidRequest(format!("invalid JSON payload: {}", e)))?
    };
    Ok(api_success(remote::command(&name, payload)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::bootstrap::BootstrappedServices;
    use crate::config::Config;
    use crate::services::test_support::{item, zone, FakeHousehold};

    fn router(household: &Arc<FakeHousehold>) -> Router {
        let services = BootstrappedServices::with_collaborators(
            household.clone(),
            household.clone(),
            household.clone(),
            &Config::default(),
        );
        create_router(services.app_state())
    }

    fn household() -> Arc<FakeHousehold> {
        Arc::new(
            FakeHousehold::new(vec![zone("Port", &["Kitchen"]), zone("Office", &[])])
                .with_favorites(vec![item("Jazz Radio", "x-sonosapi-stream:s9")]),
        )
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[test]
    fn volume_arguments() {
        assert_eq!(parse_volume_arg("+3").unwrap(), (3, VolumeMode::Relative));
        assert_eq!(parse_volume_arg("-2").unwrap(), (-2, VolumeMode::Relative));
        assert_eq!(parse_volume_arg("40").unwrap(), (40, VolumeMode::Absolute));
        assert!(parse_volume_arg("loud").is_err());
    }

    #[test]
    fn detail_flag() {
        assert!(flag_set(Some("")));
        assert!(flag_set(Some("true")));
        assert!(!flag_set(Some("false")));
        assert!(!flag_set(None));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = call(router(&household()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "sofabridge");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (status, body) = call(router(&household()), Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn unknown_room_is_404() {
        let household = household();
        let (status, body) = call(
            router(&household),
            Method::POST,
            "/api/rooms/Garage/playpause",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert!(household.sent().is_empty());
    }

    #[tokio::test]
    async fn playpause_reports_paused_flag() {
        let household = household();
        let (status, body) = call(
            router(&household),
            Method::POST,
            "/api/rooms/Kitchen/playpause",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paused"], false);
        assert_eq!(household.sent_names(), vec!["Port:Play"]);
    }

    #[tokio::test]
    async fn relative_group_volume() {
        let household = household();
        let (_, body) = call(
            router(&household),
            Method::POST,
            "/api/rooms/Port/groupVolume/+5",
            None,
        )
        .await;
        assert_eq!(body["groupVolume"], 25);
    }

    #[tokio::test]
    async fn create_group_single_room_is_not_applied() {
        let household = household();
        let (status, body) = call(
            router(&household),
            Method::POST,
            "/api/groups",
            Some(json!({ "coordinator": "Port", "members": ["Port"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "applied": false }));
        assert_eq!(household.list_calls(), 0);
    }

    #[tokio::test]
    async fn create_group_reports_steps() {
        let household = household();
        let (_, body) = call(
            router(&household),
            Method::POST,
            "/api/groups",
            Some(json!({ "coordinator": "Port", "members": ["Port", "Office"] })),
        )
        .await;
        assert_eq!(body["applied"], true);
        assert_eq!(body["case"], "existingZone");
        assert_eq!(body["steps"][0], json!({ "op": "leave", "room": "Kitchen" }));
        assert_eq!(body["deferredJoins"], json!(["Office"]));
    }

    #[tokio::test]
    async fn unsupported_spotify_kind_is_400() {
        let (status, body) = call(
            router(&household()),
            Method::POST,
            "/api/rooms/Port/spotify/now/spotify:show:XYZ",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unsupported_type");
    }

    #[tokio::test]
    async fn device_failure_is_502() {
        let household = household();
        household.fail_on("Office", "Next");
        let (status, body) = call(router(&household), Method::POST, "/api/rooms/Office/next", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "device_error");
    }

    #[tokio::test]
    async fn directory_outage_is_503() {
        let household = Arc::new(FakeHousehold::unavailable());
        let (status, _) = call(router(&household), Method::GET, "/api/zones", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn music_start_replaces_underscores() {
        let household = household();
        let (status, body) = call(
            router(&household),
            Method::POST,
            "/music/start/jazz_radio",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["action"], "play");
        assert_eq!(body["favorite"], "Jazz Radio");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn volume_shortcut_steps_down_by_two() {
        let household = household();
        let (_, body) = call(router(&household), Method::POST, "/volume/down", None).await;
        assert_eq!(body["groupVolume"], 18);

        let (status, _) = call(router(&household), Method::POST, "/volume/sideways", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remote_rejects_invalid_source() {
        let (status, body) = call(
            router(&household()),
            Method::POST,
            "/device/input",
            Some(json!({ "source": "scart" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid source");
        assert!(body["validSources"].is_array());
    }

    #[tokio::test]
    async fn remote_power_get_and_command_echo() {
        let (status, body) = call(router(&household()), Method::GET, "/device/power/on", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["method"], "GET");

        let (_, body) = call(
            router(&household()),
            Method::POST,
            "/command/lights",
            Some(json!({ "level": 2 })),
        )
        .await;
        assert_eq!(body["command"], "lights");
        assert_eq!(body["payload"]["level"], 2);

        let (_, body) = call(router(&household()), Method::POST, "/command/ping", None).await;
        assert!(body["payload"].is_null());
    }

    #[tokio::test]
    async fn queue_defaults_to_summary() {
        let household = Arc::new(
            FakeHousehold::new(vec![zone("Port", &[])]).with_queue(vec![item("Song", "x-file:s")]),
        );
        let (_, body) = call(router(&household), Method::GET, "/api/rooms/Port/queue", None).await;
        assert_eq!(body[0]["title"], "Song");
        assert!(body[0].get("uri").is_none());

        let (_, body) = call(
            router(&household),
            Method::GET,
            "/api/rooms/Port/queue?detailed",
            None,
        )
        .await;
        assert_eq!(body[0]["uri"], "x-file:s");
    }
}
