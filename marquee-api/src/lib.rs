use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod password;
pub mod reservations;
pub mod sessions;
pub mod showtimes;
pub mod state;
pub mod users;

pub use state::AppState;

use middleware::{admin_auth_middleware, customer_auth_middleware};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let customer = from_fn_with_state(state.clone(), customer_auth_middleware);
    let admin = from_fn_with_state(state.clone(), admin_auth_middleware);

    Router::new()
        .nest("/v1/auth", auth::routes())
        .nest("/v1/movies", catalog::routes())
        .nest("/v1/showtimes", showtimes::routes())
        .nest("/v1/tickets", reservations::ticket_routes())
        .nest("/v1/sessions", sessions::routes().route_layer(customer.clone()))
        .nest("/v1/reservations", reservations::routes().route_layer(customer.clone()))
        .nest("/v1/users", users::routes().route_layer(customer))
        .nest("/v1/admin", admin::routes().route_layer(admin))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
