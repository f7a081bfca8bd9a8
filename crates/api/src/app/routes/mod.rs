use axum::{routing::get, Router};

pub mod bookings;
pub mod products;
pub mod reviews;
pub mod system;
pub mod users;

use crate::middleware::AuthState;

/// Router for every collection endpoint.
///
/// Paths are absolute because bookings span two prefixes (`/allBookings`
/// and `/bookings`). Optional authentication is attached per route.
pub fn router(auth: AuthState) -> Router {
    Router::new()
        .route("/", get(system::root))
        .merge(products::router())
        .merge(bookings::router(auth.clone()))
        .merge(reviews::router())
        .merge(users::router(auth))
}
