use std::sync::Arc;
use warp::Filter;

use crate::config::Config;
use crate::rooms::RoomRegistry;
use crate::websocket::ConnectionManager;

pub mod config;
pub mod rooms;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    rooms: Arc<RoomRegistry>,
    config: Arc<Config>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map(move || connection_manager.clone());
    let rooms_filter = warp::any().map(move || rooms.clone());
    let config_filter = warp::any().map(move || config.clone());

    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(rooms_filter)
        .and(config_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, rooms, config| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, rooms, config))
        });

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    websocket.or(health).with(warp::log("relay_server"))
}
