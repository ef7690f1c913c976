//! Image upload.

use actix_web::{HttpRequest, HttpResponse, http::header, web};

use grove_core::ports::ImageUpload;

use super::mapping;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Store the request body as an image. The body is the raw file and
/// `Content-Type` its media type.
///
/// POST /api/upload/image
pub async fn upload_image(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let stored = state
        .uploads
        .upload(
            Some(&identity.actor()),
            ImageUpload {
                content_type,
                bytes: body.to_vec(),
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(mapping::upload(stored)))
}
