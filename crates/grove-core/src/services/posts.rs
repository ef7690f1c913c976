//! Post lifecycle: submission and the read side of posts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveTime, Offset, TimeDelta, Utc};
use url::Url;
use uuid::Uuid;

use crate::content;
use crate::domain::{Actor, CoverImage, Moderation, Post, PostStatus};
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::{
    CommentRepository, HeartRepository, MediaStore, PostRepository, UserRepository,
};

use super::views::{
    AuthorDashboard, AuthorProfile, AuthorStats, CommentView, Page, PageRequest, PostDetail,
    PostSummary, SitemapEntry, profiles_by_id, summarize,
};
use super::{char_len, require_admin, require_user};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MIN_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 50_000;

/// Inserts retried when a concurrent submission takes the probed slug first.
const SLUG_INSERT_ATTEMPTS: u32 = 3;

/// Submission quota settings.
#[derive(Debug, Clone, Copy)]
pub struct PostingPolicy {
    /// Maximum submissions per author per calendar day.
    pub daily_limit: u32,
    /// Offset whose midnight starts a quota day.
    pub day_offset: FixedOffset,
}

impl Default for PostingPolicy {
    fn default() -> Self {
        Self {
            daily_limit: 5,
            day_offset: Local::now().offset().fix(),
        }
    }
}

/// Start of the calendar day containing `now`, as seen from `offset`.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    (midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// A post as submitted by its author.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    /// Delete handle returned by the image upload. It must name the image at
    /// `cover_image_url`; the stored handle is always derived from the URL.
    pub cover_image_id: Option<String>,
    pub tags: Vec<String>,
}

impl NewPost {
    /// Check field constraints, reporting every failing field at once.
    fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        let title_len = char_len(self.title.trim());
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_len) {
            errors.push(FieldError::new(
                "title",
                format!(
                    "Title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"
                ),
            ));
        }

        let content_len = char_len(&self.content);
        if !(CONTENT_MIN_CHARS..=CONTENT_MAX_CHARS).contains(&content_len) {
            errors.push(FieldError::new(
                "content",
                format!(
                    "Content must be between {CONTENT_MIN_CHARS} and {CONTENT_MAX_CHARS} characters"
                ),
            ));
        }

        if let Some(url) = &self.cover_image_url {
            let valid = Url::parse(url)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                errors.push(FieldError::new("cover_image", "Cover image must be a URL"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

/// Submission and read queries for posts.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    hearts: Arc<dyn HeartRepository>,
    comments: Arc<dyn CommentRepository>,
    media: Arc<dyn MediaStore>,
    policy: PostingPolicy,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        hearts: Arc<dyn HeartRepository>,
        comments: Arc<dyn CommentRepository>,
        media: Arc<dyn MediaStore>,
        policy: PostingPolicy,
    ) -> Self {
        Self {
            posts,
            users,
            hearts,
            comments,
            media,
            policy,
        }
    }

    /// Cover of a new post. Only images served by our media host get a delete
    /// handle, and a client-supplied handle has to match it.
    fn cover_image(&self, input: &NewPost) -> Result<Option<CoverImage>, DomainError> {
        let Some(url) = input.cover_image_url.clone() else {
            return Ok(None);
        };
        let delete_id = self.media.delete_id_for(&url);

        let claimed = input
            .cover_image_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(claimed) = claimed {
            if delete_id.as_deref() != Some(claimed) {
                return Err(DomainError::Validation(vec![FieldError::new(
                    "cover_image_id",
                    "Cover image id does not match the cover image URL",
                )]));
            }
        }

        Ok(Some(CoverImage { url, delete_id }))
    }

    /// Submit a post for moderation.
    pub async fn submit(&self, actor: Option<&Actor>, input: NewPost) -> Result<Post, DomainError> {
        let actor = require_user(actor)?;
        input.validate()?;
        let cover_image = self.cover_image(&input)?;

        let since = start_of_day(Utc::now(), self.policy.day_offset);
        let today = self
            .posts
            .count_by_author_since(actor.user_id, since)
            .await?;
        if today >= u64::from(self.policy.daily_limit) {
            tracing::info!(author_id = %actor.user_id, today, "Daily post quota reached");
            return Err(DomainError::QuotaExceeded {
                limit: self.policy.daily_limit,
            });
        }

        let title = input.title.trim().to_string();
        let base_slug = content::slugify(&title);
        let excerpt = content::excerpt(&input.content);
        let reading_time = content::reading_time(&input.content);
        let tags: Vec<String> = input
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        for _ in 0..SLUG_INSERT_ATTEMPTS {
            let slug = self.unique_slug(&base_slug).await?;
            let now = Utc::now();
            let post = Post {
                id: Uuid::new_v4(),
                author_id: actor.user_id,
                title: title.clone(),
                slug,
                content: input.content.clone(),
                excerpt: excerpt.clone(),
                cover_image: cover_image.clone(),
                moderation: Moderation::Pending,
                reading_time,
                hearts: 0,
                tags: tags.clone(),
                created_at: now,
                updated_at: now,
            };

            match self.posts.insert(post).await {
                Ok(saved) => {
                    tracing::info!(
                        post_id = %saved.id,
                        author_id = %saved.author_id,
                        slug = %saved.slug,
                        "Post submitted for review"
                    );
                    return Ok(saved);
                }
                Err(RepoError::ForeignKey(_)) => {
                    return Err(DomainError::not_found("user", actor.user_id));
                }
                Err(RepoError::Constraint(reason)) => {
                    tracing::debug!(base_slug = %base_slug, %reason, "Slug taken during insert, probing again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Duplicate(format!(
            "could not allocate a unique slug for '{base_slug}'"
        )))
    }

    /// First free slug among `base`, `base-1`, `base-2`, ...
    async fn unique_slug(&self, base: &str) -> Result<String, DomainError> {
        let mut attempt = 0;
        loop {
            let candidate = content::slug_candidate(base, attempt);
            if !self.posts.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    /// Published posts, newest first.
    pub async fn list_published(&self, request: PageRequest) -> Result<Page<PostSummary>, DomainError> {
        let request = request.normalized();
        let posts = self
            .posts
            .list_published(request.offset(), request.limit)
            .await?;
        let total = self.posts.count_by_status(PostStatus::Published).await?;

        Ok(Page::new(self.summaries(posts).await?, request, total))
    }

    /// A published post by slug, with comments and the viewer's heart state.
    pub async fn get_published(
        &self,
        slug: &str,
        viewer: Option<&Actor>,
    ) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| DomainError::not_found("post", slug))?;

        let comments = self.comments.list_for_post(post.id).await?;

        let mut user_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        user_ids.push(post.author_id);
        let profiles = self.profiles(user_ids).await?;

        let is_hearted = match viewer {
            Some(viewer) => self.hearts.exists(viewer.user_id, post.id).await?,
            None => false,
        };

        let comments = comments
            .into_iter()
            .map(|comment| CommentView {
                author: profiles.get(&comment.author_id).cloned(),
                comment,
            })
            .collect();

        Ok(PostDetail {
            author: profiles.get(&post.author_id).cloned(),
            post,
            comments,
            is_hearted,
        })
    }

    /// The caller's own posts in every state, with totals.
    pub async fn author_dashboard(&self, actor: Option<&Actor>) -> Result<AuthorDashboard, DomainError> {
        let actor = require_user(actor)?;
        let posts = self.posts.find_by_author(actor.user_id).await?;
        let posts = self.summaries(posts).await?;

        let stats = AuthorStats {
            total_posts: posts.len() as u64,
            total_hearts: posts.iter().map(|s| s.post.hearts).sum(),
            total_comments: posts.iter().map(|s| s.comment_count).sum(),
        };

        Ok(AuthorDashboard { posts, stats })
    }

    /// Every post, newest first, for the admin dashboard.
    pub async fn moderation_queue(
        &self,
        actor: Option<&Actor>,
    ) -> Result<Vec<PostSummary>, DomainError> {
        require_admin(self.users.as_ref(), actor).await?;
        let posts = self.posts.list_all().await?;
        self.summaries(posts).await
    }

    /// Slugs and modification times of every published post.
    pub async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, DomainError> {
        let total = self.posts.count_by_status(PostStatus::Published).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let posts = self.posts.list_published(0, total).await?;
        Ok(posts
            .into_iter()
            .map(|p| SitemapEntry {
                slug: p.slug,
                updated_at: p.updated_at,
            })
            .collect())
    }

    async fn summaries(&self, posts: Vec<Post>) -> Result<Vec<PostSummary>, DomainError> {
        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let profiles = self
            .profiles(posts.iter().map(|p| p.author_id).collect())
            .await?;
        let counts = self.comments.count_for_posts(&post_ids).await?;

        Ok(summarize(posts, &profiles, &counts))
    }

    async fn profiles(
        &self,
        mut user_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, AuthorProfile>, DomainError> {
        let mut seen = HashSet::new();
        user_ids.retain(|id| seen.insert(*id));
        if user_ids.is_empty() {
            return Ok(Default::default());
        }

        let users = self.users.find_many(&user_ids).await?;
        Ok(profiles_by_id(&users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_post() -> NewPost {
        NewPost {
            title: "A valid title".to_string(),
            content: "x".repeat(CONTENT_MIN_CHARS),
            ..Default::default()
        }
    }

    #[test]
    fn validate_accepts_boundaries() {
        assert!(valid_post().validate().is_ok());

        let post = NewPost {
            title: "abc".to_string(),
            content: "x".repeat(CONTENT_MAX_CHARS),
            ..Default::default()
        };
        assert!(post.validate().is_ok());
    }

    #[test]
    fn validate_lists_all_failing_fields() {
        let post = NewPost {
            title: "  ab  ".to_string(),
            content: "too short".to_string(),
            cover_image_url: Some("not a url".to_string()),
            ..Default::default()
        };

        match post.validate() {
            Err(DomainError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["title", "content", "cover_image"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_non_http_cover() {
        let post = NewPost {
            cover_image_url: Some("ftp://example.com/a.png".to_string()),
            ..valid_post()
        };
        assert!(matches!(post.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let post = NewPost {
            title: "é".repeat(TITLE_MAX_CHARS),
            ..valid_post()
        };
        assert!(post.validate().is_ok());
    }

    #[test]
    fn start_of_day_uses_offset_midnight() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        // 2024-03-10 23:30 UTC is 2024-03-11 01:30 at +02:00
        let now = DateTime::parse_from_rfc3339("2024-03-10T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let start = start_of_day(now, offset);

        assert_eq!(start.to_rfc3339(), "2024-03-10T22:00:00+00:00");
    }

    #[test]
    fn start_of_day_in_utc() {
        let now = DateTime::parse_from_rfc3339("2024-03-10T15:45:12Z")
            .unwrap()
            .with_timezone(&Utc);

        let start = start_of_day(now, FixedOffset::east_opt(0).unwrap());

        assert_eq!(start.to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }
}
