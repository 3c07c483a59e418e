use axum::extract::{FromRequest, FromRequestParts, Path};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON request body whose rejections render as `{ "error": ... }`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// `{id}` path segment.
#[derive(Deserialize, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct Id(pub Uuid);
