//! Application state - shared across all handlers.

use std::sync::Arc;

use grove_core::ports::{
    CommentRepository, HeartRepository, Mailer, MediaStore, Notifier, PostRepository,
    TokenService, UserRepository,
};
use grove_core::services::{
    AccountService, EngagementService, ModerationService, PostService, PostingPolicy,
    UploadService,
};
use grove_infra::{InMemoryMediaStore, InMemoryStore, JwtTokenService, LogMailer, QueuedNotifier};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub moderation: Arc<ModerationService>,
    pub engagement: Arc<EngagementService>,
    pub accounts: Arc<AccountService>,
    pub uploads: Arc<UploadService>,
    pub tokens: Arc<dyn TokenService>,
    pub site_url: String,
    pub gateway_secret: Option<String>,
}

/// Port implementations the services are built from.
pub struct Adapters {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub hearts: Arc<dyn HeartRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub media: Arc<dyn MediaStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Adapters {
    /// Repositories backed by an in-memory store.
    pub fn in_memory(
        store: &InMemoryStore,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            hearts: Arc::new(store.hearts()),
            comments: Arc::new(store.comments()),
            media,
            notifier,
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let media = Self::media_store(config);
        let notifier: Arc<dyn Notifier> = Arc::new(QueuedNotifier::start(
            config.notify.clone(),
            Self::mailer(config),
        ));

        let adapters = Self::repositories(config, media, notifier).await;
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        tracing::info!("Application state initialized");

        Self::assemble(
            adapters,
            tokens,
            config.posting,
            config.site_url.clone(),
            config.gateway_secret.clone(),
        )
    }

    /// Wire services over the given adapters.
    pub fn assemble(
        adapters: Adapters,
        tokens: Arc<dyn TokenService>,
        posting: PostingPolicy,
        site_url: String,
        gateway_secret: Option<String>,
    ) -> Self {
        let Adapters {
            users,
            posts,
            hearts,
            comments,
            media,
            notifier,
        } = adapters;

        Self {
            posts: Arc::new(PostService::new(
                posts.clone(),
                users.clone(),
                hearts.clone(),
                comments.clone(),
                media.clone(),
                posting,
            )),
            moderation: Arc::new(ModerationService::new(
                posts.clone(),
                users.clone(),
                hearts.clone(),
                media.clone(),
                notifier,
            )),
            engagement: Arc::new(EngagementService::new(posts, users.clone(), hearts, comments)),
            accounts: Arc::new(AccountService::new(users)),
            uploads: Arc::new(UploadService::new(media)),
            tokens,
            site_url,
            gateway_secret,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(
        config: &AppConfig,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Adapters {
        use grove_infra::database::{
            PostgresCommentRepository, PostgresHeartRepository, PostgresPostRepository,
            PostgresUserRepository,
        };

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Adapters::in_memory(&InMemoryStore::new(), media, notifier);
        };

        match grove_infra::connect(db_config).await {
            Ok(conn) => Adapters {
                users: Arc::new(PostgresUserRepository::new(conn.clone())),
                posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                hearts: Arc::new(PostgresHeartRepository::new(conn.clone())),
                comments: Arc::new(PostgresCommentRepository::new(conn)),
                media,
                notifier,
            },
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Adapters::in_memory(&InMemoryStore::new(), media, notifier)
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(
        _config: &AppConfig,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Adapters {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        Adapters::in_memory(&InMemoryStore::new(), media, notifier)
    }

    fn media_store(config: &AppConfig) -> Arc<dyn MediaStore> {
        #[cfg(feature = "cloudinary")]
        if let Some(cloudinary) = config.cloudinary.clone() {
            match grove_infra::CloudinaryMediaStore::new(cloudinary) {
                Ok(store) => return Arc::new(store),
                Err(e) => tracing::error!(error = %e, "Cloudinary unavailable. Using in-memory media store."),
            }
        }

        tracing::warn!("Image host not configured. Uploads are kept in memory.");
        Arc::new(InMemoryMediaStore::new(format!("{}/media", config.site_url)))
    }

    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        #[cfg(feature = "smtp")]
        if let Some(smtp) = config.smtp.as_ref() {
            match grove_infra::SmtpMailer::new(smtp, config.site_url.clone()) {
                Ok(mailer) => return Arc::new(mailer),
                Err(e) => tracing::error!(error = %e, "SMTP unavailable. Emails will be logged."),
            }
        }

        tracing::warn!("SMTP not configured. Emails will be logged, not sent.");
        Arc::new(LogMailer::new(config.site_url.clone()))
    }
}

#[cfg(test)]
impl AppState {
    /// State over in-memory adapters, returning the store for seeding.
    pub fn in_memory(gateway_secret: Option<&str>) -> (Self, InMemoryStore) {
        let store = InMemoryStore::new();
        let site_url = "http://localhost:3000".to_string();
        let media: Arc<dyn MediaStore> = Arc::new(InMemoryMediaStore::default());
        let notifier: Arc<dyn Notifier> = Arc::new(QueuedNotifier::start(
            grove_infra::NotifyQueueConfig::default(),
            Arc::new(LogMailer::new(site_url.clone())),
        ));
        let tokens: Arc<dyn TokenService> =
            Arc::new(JwtTokenService::new(grove_infra::JwtConfig::default()));

        let state = Self::assemble(
            Adapters::in_memory(&store, media, notifier),
            tokens,
            PostingPolicy::default(),
            site_url,
            gateway_secret.map(String::from),
        );
        (state, store)
    }
}
