//! HTTP surface of the room store.
//!
//! `PUT /rooms/{code}` does triple duty, dispatched on the body's `action`
//! field: "join", "start"/"restart", or (no action) a partial state update
//! answered with the full merged record.

use crate::store::{RoomStore, StoreOpError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared::room::{
    CreateRoomRequest, CreateRoomResponse, ErrorResponse, JoinRoomResponse, RoomPutBody,
    StartGameResponse, JOINER_PLAYER_ID,
};
use std::sync::Arc;

pub fn router(store: Arc<RoomStore>) -> Router {
    Router::new()
        .route("/rooms", post(create_room))
        .route(
            "/rooms/:code",
            get(get_room).put(put_room).delete(delete_room),
        )
        .with_state(store)
}

fn error_response(err: StoreOpError) -> Response {
    let status = match err {
        StoreOpError::RoomNotFound => StatusCode::NOT_FOUND,
        StoreOpError::RoomFull | StoreOpError::NoUpdates | StoreOpError::NotEnoughPlayers => {
            StatusCode::BAD_REQUEST
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn create_room(
    State(store): State<Arc<RoomStore>>,
    Json(req): Json<CreateRoomRequest>,
) -> Response {
    let record = store.create(&req.player_name, req.map_type);
    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_code: record.room_code,
            player_id: record.host_player_id,
        }),
    )
        .into_response()
}

async fn get_room(State(store): State<Arc<RoomStore>>, Path(code): Path<String>) -> Response {
    match store.get(&code) {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(err),
    }
}

async fn put_room(
    State(store): State<Arc<RoomStore>>,
    Path(code): Path<String>,
    Json(body): Json<RoomPutBody>,
) -> Response {
    match body.action.as_deref() {
        Some("join") => {
            let name = body.player_name.as_deref().unwrap_or("P2");
            match store.join(&code, name) {
                Ok(record) => Json(JoinRoomResponse {
                    room_code: record.room_code,
                    player_id: JOINER_PLAYER_ID.to_string(),
                    map_type: record.map_type,
                })
                .into_response(),
                Err(err) => error_response(err),
            }
        }
        Some("start") => match store.start(&code) {
            Ok(monkey_player_id) => Json(StartGameResponse {
                status: "started".to_string(),
                monkey_player_id,
            })
            .into_response(),
            Err(err) => error_response(err),
        },
        Some("restart") => match store.restart(&code) {
            Ok(monkey_player_id) => Json(StartGameResponse {
                status: "restarted".to_string(),
                monkey_player_id,
            })
            .into_response(),
            Err(err) => error_response(err),
        },
        Some(other) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown action '{}'", other),
            }),
        )
            .into_response(),
        None => match store.apply_update(&code, &body) {
            Ok(record) => Json(record).into_response(),
            Err(err) => error_response(err),
        },
    }
}

async fn delete_room(State(store): State<Arc<RoomStore>>, Path(code): Path<String>) -> Response {
    store.delete(&code);
    Json(json!({ "message": "Room deleted" })).into_response()
}
