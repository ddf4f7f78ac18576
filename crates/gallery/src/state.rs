use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    config::GalleryConfig,
    photos::{PhotoService, ThumbnailService},
    storage::{BlobStore, LocalBlobStore},
};

#[derive(Clone)]
pub struct AppState {
    config: GalleryConfig,
    photos: PhotoService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: GalleryConfig) -> Self {
        let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
            config.media.root.clone(),
            config.media.url_prefix.clone(),
        ));
        let photos = PhotoService::new(pool, store, ThumbnailService::new(config.thumbnail));

        Self { config, photos }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn photos(&self) -> &PhotoService {
        &self.photos
    }

    /// Absolute URL for a stored blob. Media URLs that are already absolute pass through.
    pub fn blob_url(&self, path: &str) -> String {
        let url = self.photos.store().url(path);
        if url.starts_with("http://") || url.starts_with("https://") {
            return url;
        }
        format!(
            "{}/{}",
            self.config.server_public_base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}
