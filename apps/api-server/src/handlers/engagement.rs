//! Hearts and comments on published posts.

use actix_web::{HttpResponse, web};

use grove_shared::dto::{CommentRequest, HeartRequest, HeartResponse};

use super::mapping;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/heart
pub async fn toggle_heart(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<HeartRequest>,
) -> AppResult<HttpResponse> {
    let toggle = state
        .engagement
        .toggle_heart(Some(&identity.actor()), body.post_id)
        .await?;

    Ok(HttpResponse::Ok().json(HeartResponse {
        is_hearted: toggle.is_hearted,
        hearts_count: toggle.hearts,
    }))
}

/// POST /api/posts/comment
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let view = state
        .engagement
        .add_comment(Some(&identity.actor()), body.post_id, &body.content)
        .await?;

    Ok(HttpResponse::Created().json(mapping::comment(view)))
}
