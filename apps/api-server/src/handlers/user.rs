//! The signed-in author's own posts.

use actix_web::{HttpResponse, web};

use super::mapping;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Every post of the caller, in any state, with totals.
///
/// GET /api/user/posts
pub async fn dashboard(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let dashboard = state.posts.author_dashboard(Some(&identity.actor())).await?;
    Ok(HttpResponse::Ok().json(mapping::dashboard(dashboard)))
}
