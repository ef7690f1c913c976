//! Conversions from service read models to wire DTOs.

use grove_core::domain::{Post, User};
use grove_core::ports::StoredImage;
use grove_core::services::{
    AuthorDashboard, AuthorProfile, CommentView, Page, PostDetail, PostSummary,
};
use grove_shared::dto::{
    AuthorResponse, AuthorStatsResponse, CommentResponse, DashboardResponse, PaginationResponse,
    PostDetailResponse, PostListResponse, PostResponse, UploadResponse, UserResponse,
};

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        image: user.image.clone(),
        role: user.role.to_string(),
        posts_count: user.posts_count,
        hearts_received: user.hearts_received,
        created_at: user.created_at,
    }
}

fn author(profile: Option<AuthorProfile>) -> Option<AuthorResponse> {
    profile.map(|p| AuthorResponse {
        id: p.id,
        name: p.name,
        image: p.image,
    })
}

pub fn post(post: Post, author_profile: Option<AuthorProfile>, comment_count: Option<u64>) -> PostResponse {
    let status = post.status().to_string();
    let rejection_reason = post.moderation.rejection_reason().map(String::from);
    let published_at = post.moderation.published_at();

    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        excerpt: post.excerpt,
        cover_image: post.cover_image.map(|c| c.url),
        status,
        reading_time: post.reading_time,
        hearts: post.hearts,
        tags: post.tags,
        author: author(author_profile),
        comment_count,
        rejection_reason,
        published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn summary(summary: PostSummary) -> PostResponse {
    post(summary.post, summary.author, Some(summary.comment_count))
}

pub fn comment(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.comment.id,
        content: view.comment.content,
        author: author(view.author),
        created_at: view.comment.created_at,
    }
}

pub fn detail(detail: PostDetail) -> PostDetailResponse {
    let comment_count = detail.comments.len() as u64;
    PostDetailResponse {
        post: post(detail.post, detail.author, Some(comment_count)),
        comments: detail.comments.into_iter().map(comment).collect(),
        is_hearted: detail.is_hearted,
    }
}

pub fn post_list(page: Page<PostSummary>) -> PostListResponse {
    PostListResponse {
        posts: page.items.into_iter().map(summary).collect(),
        pagination: PaginationResponse {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages,
        },
    }
}

pub fn dashboard(dashboard: AuthorDashboard) -> DashboardResponse {
    DashboardResponse {
        posts: dashboard.posts.into_iter().map(summary).collect(),
        stats: AuthorStatsResponse {
            total_posts: dashboard.stats.total_posts,
            total_hearts: dashboard.stats.total_hearts,
            total_comments: dashboard.stats.total_comments,
        },
    }
}

pub fn upload(image: StoredImage) -> UploadResponse {
    UploadResponse {
        url: image.url,
        delete_id: image.delete_id,
        width: image.width,
        height: image.height,
    }
}
