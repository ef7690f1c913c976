//! Moderation endpoints. Every route requires an administrator; the role
//! check happens in the services.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use grove_shared::dto::{ApproveRequest, PostResponse, RejectRequest};

use super::mapping;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/admin/posts
pub async fn list_posts(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let queue = state.posts.moderation_queue(Some(&identity.actor())).await?;
    let posts: Vec<PostResponse> = queue.into_iter().map(mapping::summary).collect();
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /api/admin/posts/approve
pub async fn approve(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ApproveRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .moderation
        .approve(Some(&identity.actor()), body.post_id)
        .await?;
    Ok(HttpResponse::Ok().json(mapping::post(post, None, None)))
}

/// POST /api/admin/posts/reject
pub async fn reject(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<RejectRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .moderation
        .reject(Some(&identity.actor()), body.post_id, &body.reason)
        .await?;
    Ok(HttpResponse::Ok().json(mapping::post(post, None, None)))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .moderation
        .delete(Some(&identity.actor()), post_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
