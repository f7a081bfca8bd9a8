use axum::http::StatusCode;

pub const ROOT_MESSAGE: &str = "Running Server PiPiLiCa Shop";

pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
