#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod password;
mod route;
#[cfg(test)]
mod test;
mod token;

use argon2::Argon2;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::Error;

use config::Config;
use token::TokenService;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the database connection pool, the hash configuration and the
/// token service. Everything here is built once from the startup
/// configuration and immutable afterwards.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub tokens: TokenService,
}

fn router(state: State) -> Router {
	Router::new()
		.merge(route::auth::routes())
		.nest("/users", route::users::routes())
		.nest("/post", route::posts::routes())
		.nest("/vote", route::votes::routes())
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt::init();
	dotenvy::dotenv().ok();

	let config = Config::from_env();

	let database = Database::connect(&config.database_url())
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		tokens: TokenService::new(
			&config.secret_key,
			config.algorithm,
			config.access_token_expire_minutes,
		),
	};

	let app = router(state);

	let port = std::env::var("PORT").map_or_else(
		|_| 3000,
		|port| port.parse().expect("PORT must be a number"),
	);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(listener, app).await.unwrap();
}
