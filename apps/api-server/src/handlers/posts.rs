//! Post submission and public reads.

use actix_web::{HttpResponse, web};

use grove_core::services::{NewPost, PageRequest};
use grove_shared::dto::{ListQuery, SubmitPostRequest};

use super::mapping;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Published posts, newest first.
///
/// GET /api/posts?page=&limit=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.limit);
    let page = state.posts.list_published(request).await?;
    Ok(HttpResponse::Ok().json(mapping::post_list(page)))
}

/// Submit a post for review.
///
/// POST /api/posts
pub async fn submit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<SubmitPostRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let post = state
        .posts
        .submit(
            Some(&identity.actor()),
            NewPost {
                title: body.title,
                content: body.content,
                cover_image_url: body.cover_image,
                cover_image_id: body.cover_image_id,
                tags: body.tags,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(mapping::post(post, None, None)))
}

/// A published post with comments and the viewer's heart state.
///
/// GET /api/posts/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let detail = state
        .posts
        .get_published(&slug, viewer.actor().as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(mapping::detail(detail)))
}
