//! `pipilica-api`: HTTP gateway over the shop's document collections.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
