use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `PUT /bookings/updateBooking/:id` body. A missing `status` is `null`.
#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    #[serde(default)]
    pub status: JsonValue,
}

/// `PUT /users/admin` body. A missing `email` is `null`.
#[derive(Debug, Deserialize)]
pub struct MakeAdminRequest {
    #[serde(default)]
    pub email: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AdminStatus {
    pub admin: bool,
}
