//! HTTP server for the logistics API.
//!
//! Every route lives under `/api` and answers with the `ActionResult`
//! envelope.

use crate::apis;
use axum::{
	extract::State,
	response::Json,
	routing::{get, post},
	Router,
};
use logistics_config::ApiConfig;
use logistics_core::LogisticsEngine;
use logistics_types::ActionResult;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::CorsLayer, limit::RequestBodyLimitLayer, map_response_body::MapResponseBodyLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<LogisticsEngine>,
}

/// Builds the API router with its middleware stack.
pub fn router(api_config: &ApiConfig, engine: Arc<LogisticsEngine>) -> Router {
	let api = Router::new()
		.route("/health", get(handle_health))
		.route("/shipments", post(apis::shipment::create))
		.route("/shipments/{id}", get(apis::shipment::get))
		.route("/shipments/{id}/status", post(apis::shipment::transition))
		.route("/shipments/{id}/history", get(apis::shipment::history))
		.route("/shipments/{id}/estimate", post(apis::shipment::estimate))
		.route("/pickups", post(apis::pickup::create))
		.route("/pickups/{id}", get(apis::pickup::get))
		.route("/pickups/{id}/status", post(apis::pickup::transition))
		.route("/pickups/{id}/history", get(apis::pickup::history))
		.route("/purchases", post(apis::purchase::create))
		.route("/purchases/{id}", get(apis::purchase::get))
		.route("/purchases/{id}/status", post(apis::purchase::transition))
		.route("/purchases/{id}/history", get(apis::purchase::history))
		.route("/quotes", post(apis::quote::create))
		.route(
			"/tariffs",
			get(apis::tariff::list).put(apis::tariff::upsert),
		);

	Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(MapResponseBodyLayer::new(axum::body::Body::new))
				.layer(RequestBodyLimitLayer::new(api_config.max_request_size))
				.layer(CorsLayer::permissive()),
		)
		.with_state(AppState { engine })
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<LogisticsEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Logistics API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/health requests.
async fn handle_health(State(state): State<AppState>) -> Json<ActionResult<Value>> {
	let config = state.engine.config();
	Json(ActionResult::ok(json!({
		"status": "ok",
		"service": config.service.id,
		"currency": config.pricing.currency,
	})))
}
