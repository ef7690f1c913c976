//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use grove_core::domain::{CoverImage, Moderation, PostStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text")]
    pub excerpt: String,
    pub cover_image_url: Option<String>,
    pub cover_image_id: Option<String>,
    pub status: Status,
    pub reading_time: i32,
    pub hearts: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Pending => Status::Pending,
            PostStatus::Published => Status::Published,
            PostStatus::Rejected => Status::Rejected,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::heart::Entity")]
    Heart,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::heart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Heart.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
///
/// Status columns that disagree with the status fall back to the row's
/// timestamps rather than failing the read.
impl From<Model> for grove_core::domain::Post {
    fn from(model: Model) -> Self {
        let moderation = match model.status {
            Status::Pending => Moderation::Pending,
            Status::Published => Moderation::Published {
                published_at: model.published_at.unwrap_or(model.updated_at).into(),
            },
            Status::Rejected => Moderation::Rejected {
                reason: model.rejection_reason.unwrap_or_default(),
            },
        };

        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            cover_image: model.cover_image_url.map(|url| CoverImage {
                url,
                delete_id: model.cover_image_id,
            }),
            moderation,
            reading_time: model.reading_time,
            hearts: model.hearts,
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<grove_core::domain::Post> for ActiveModel {
    fn from(post: grove_core::domain::Post) -> Self {
        let status = post.status();
        let published_at = post.moderation.published_at().map(Into::into);
        let rejection_reason = post.moderation.rejection_reason().map(String::from);
        let (cover_image_url, cover_image_id) = match post.cover_image {
            Some(cover) => (Some(cover.url), cover.delete_id),
            None => (None, None),
        };

        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            slug: Set(post.slug),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            cover_image_url: Set(cover_image_url),
            cover_image_id: Set(cover_image_id),
            status: Set(status.into()),
            reading_time: Set(post.reading_time),
            hearts: Set(post.hearts),
            tags: Set(serde_json::json!(post.tags)),
            rejection_reason: Set(rejection_reason),
            published_at: Set(published_at),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
