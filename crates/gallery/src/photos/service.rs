use std::sync::Arc;

use api_types::Photo;
use bytes::Bytes;
use sqlx::SqlitePool;
use tracing::instrument;
use utils::filename::{sanitize_filename, thumbnail_name};
use uuid::Uuid;

use super::thumbnail::{ThumbnailError, ThumbnailService};
use crate::{
    db::photos::{NewPhoto, PHOTO_LIST_LIMIT, PhotoRepository, PhotoRepositoryError},
    storage::{BlobStore, BlobStoreError},
};

pub const ORIGINALS_PREFIX: &str = "uploads";
pub const THUMBNAILS_PREFIX: &str = "uploads/thumbs";

/// One uploaded file, as received from the client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub data: Bytes,
    /// Display name; the filename is used when absent.
    pub name: Option<String>,
    pub owner_id: Option<i64>,
}

impl PhotoUpload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            name: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("photo not found")]
    NotFound,
    #[error("thumbnail generation failed: {0}")]
    Thumbnail(#[from] ThumbnailError),
    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
    #[error(transparent)]
    Repository(#[from] PhotoRepositoryError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Owns the photo lifecycle: store, record, thumbnail, and cleanup on delete.
#[derive(Clone)]
pub struct PhotoService {
    pool: SqlitePool,
    store: Arc<dyn BlobStore>,
    thumbnails: ThumbnailService,
}

impl PhotoService {
    pub fn new(pool: SqlitePool, store: Arc<dyn BlobStore>, thumbnails: ThumbnailService) -> Self {
        Self {
            pool,
            store,
            thumbnails,
        }
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Store the original, persist the record, then attach a thumbnail.
    ///
    /// Only a failure to store the original or persist the record is an error.
    /// Thumbnail failures are logged and the record is returned without one.
    #[instrument(name = "photo_service.create", skip(self, upload), fields(filename = %upload.filename, size = upload.data.len()))]
    pub async fn create(&self, upload: PhotoUpload) -> Result<Photo, PhotoError> {
        let size_bytes = upload.data.len() as i64;
        let blob_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(&upload.filename));
        let original_path = self
            .store
            .save(ORIGINALS_PREFIX, &blob_name, upload.data)
            .await?;

        let new = NewPhoto {
            owner_id: upload.owner_id,
            original_path: original_path.clone(),
            name: upload.name.unwrap_or(upload.filename),
            size_bytes,
        };

        let photo = match PhotoRepository::create(&self.pool, new).await {
            Ok(photo) => photo,
            Err(e) => {
                self.remove_blob(&original_path).await;
                return Err(e.into());
            }
        };

        if photo.thumbnail_path.is_some() {
            return Ok(photo);
        }

        match self.ensure_thumbnail(&photo).await {
            Ok(photo) => Ok(photo),
            Err(e) => {
                tracing::warn!(photo_id = photo.id, error = %e, "Thumbnail generation failed");
                Ok(photo)
            }
        }
    }

    /// Create one photo per upload. Failed items are logged and left out.
    pub async fn create_batch(&self, uploads: Vec<PhotoUpload>) -> Vec<Photo> {
        let mut created = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let filename = upload.filename.clone();
            match self.create(upload).await {
                Ok(photo) => created.push(photo),
                Err(e) => {
                    tracing::error!(filename = %filename, error = %e, "Failed to create photo");
                }
            }
        }

        created
    }

    /// Generate and attach a thumbnail if the photo has none.
    ///
    /// The thumbnail is fully written before the record is touched, and the record
    /// update only applies while the field is still empty. If another writer won,
    /// our blob is removed and the stored record is returned.
    #[instrument(name = "photo_service.ensure_thumbnail", skip(self, photo), fields(photo_id = photo.id))]
    pub async fn ensure_thumbnail(&self, photo: &Photo) -> Result<Photo, PhotoError> {
        if photo.thumbnail_path.is_some() {
            return Ok(photo.clone());
        }

        let original = self.store.read(&photo.original_path).await?;
        let thumbnails = self.thumbnails;
        let thumbnail =
            tokio::task::spawn_blocking(move || thumbnails.generate(&original)).await??;

        let thumbnail_path = self
            .store
            .save(
                THUMBNAILS_PREFIX,
                &thumbnail_name(&photo.original_path),
                Bytes::from(thumbnail.bytes),
            )
            .await?;

        let attached =
            match PhotoRepository::set_thumbnail_if_absent(&self.pool, photo.id, &thumbnail_path)
                .await
            {
                Ok(attached) => attached,
                Err(e) => {
                    self.remove_blob(&thumbnail_path).await;
                    return Err(e.into());
                }
            };

        match attached {
            Some(photo) => {
                tracing::debug!(
                    thumbnail_path = %thumbnail_path,
                    width = thumbnail.width,
                    height = thumbnail.height,
                    "Attached thumbnail"
                );
                Ok(photo)
            }
            None => {
                self.remove_blob(&thumbnail_path).await;
                PhotoRepository::find_by_id(&self.pool, photo.id)
                    .await?
                    .ok_or(PhotoError::NotFound)
            }
        }
    }

    pub async fn find(&self, id: i64) -> Result<Photo, PhotoError> {
        PhotoRepository::find_by_id(&self.pool, id)
            .await?
            .ok_or(PhotoError::NotFound)
    }

    pub async fn list_recent(&self) -> Result<Vec<Photo>, PhotoError> {
        Ok(PhotoRepository::list_recent(&self.pool, PHOTO_LIST_LIMIT).await?)
    }

    /// Remove the blobs, then the record.
    ///
    /// Blob removal is best-effort so a half-deleted photo can always be deleted again.
    #[instrument(name = "photo_service.delete", skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), PhotoError> {
        let photo = self.find(id).await?;

        self.remove_blob(&photo.original_path).await;
        if let Some(thumbnail_path) = &photo.thumbnail_path {
            self.remove_blob(thumbnail_path).await;
        }

        PhotoRepository::delete(&self.pool, photo.id).await?;
        Ok(())
    }

    async fn remove_blob(&self, path: &str) {
        match self.store.delete(path).await {
            Ok(()) => {}
            Err(BlobStoreError::NotFound(_)) => {
                tracing::debug!(blob_path = %path, "Blob already missing");
            }
            Err(e) => {
                tracing::warn!(blob_path = %path, error = %e, "Failed to delete blob");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        db::connect_in_memory,
        photos::thumbnail::{ThumbnailConfig, tests::png_bytes},
        storage::LocalBlobStore,
    };

    async fn service() -> (tempfile::TempDir, PhotoService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/media");
        (dir, service_with_store(Arc::new(store)).await)
    }

    async fn service_with_store(store: Arc<dyn BlobStore>) -> PhotoService {
        let pool = connect_in_memory().await.unwrap();
        PhotoService::new(pool, store, ThumbnailService::new(ThumbnailConfig::default()))
    }

    /// Local store whose `save` fails whenever `fails(prefix, filename)` holds.
    struct FlakyStore {
        inner: LocalBlobStore,
        fails: fn(&str, &str) -> bool,
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn save(
            &self,
            prefix: &str,
            filename: &str,
            data: Bytes,
        ) -> Result<String, BlobStoreError> {
            if (self.fails)(prefix, filename) {
                return Err(BlobStoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(prefix, filename, data).await
        }

        async fn read(&self, path: &str) -> Result<Bytes, BlobStoreError> {
            self.inner.read(path).await
        }

        async fn delete(&self, path: &str) -> Result<(), BlobStoreError> {
            self.inner.delete(path).await
        }

        async fn exists(&self, path: &str) -> Result<bool, BlobStoreError> {
            self.inner.exists(path).await
        }

        fn url(&self, path: &str) -> String {
            self.inner.url(path)
        }
    }

    fn flaky(dir: &tempfile::TempDir, fails: fn(&str, &str) -> bool) -> Arc<dyn BlobStore> {
        Arc::new(FlakyStore {
            inner: LocalBlobStore::new(dir.path(), "/media"),
            fails,
        })
    }

    fn files_in(dir: &std::path::Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
                .count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_batch_skips_item_whose_original_cannot_be_stored() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_store(flaky(&dir, |_, filename| {
            filename.ends_with("_fail.txt")
        }))
        .await;

        let uploads = vec![
            PhotoUpload::new("a.txt", Bytes::from_static(b"a")),
            PhotoUpload::new("fail.txt", Bytes::from_static(b"b")),
            PhotoUpload::new("c.txt", Bytes::from_static(b"c")),
        ];
        let created = service.create_batch(uploads).await;

        let names: Vec<_> = created.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "c.txt"]);
        assert_eq!(service.list_recent().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_original() {
        let (dir, service) = service().await;
        service.pool.close().await;

        let result = service
            .create(PhotoUpload::new("a.png", png_bytes(10, 10)))
            .await;

        assert!(matches!(result, Err(PhotoError::Repository(_))));
        assert_eq!(files_in(&dir.path().join(ORIGINALS_PREFIX)), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_store_failure_leaves_thumbnail_unset() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with_store(flaky(&dir, |prefix, _| prefix == THUMBNAILS_PREFIX)).await;

        let photo = service
            .create(PhotoUpload::new("a.png", png_bytes(20, 20)))
            .await
            .unwrap();
        assert!(photo.thumbnail_path.is_none());
        assert!(service.find(photo.id).await.unwrap().thumbnail_path.is_none());
        assert!(service.store().exists(&photo.original_path).await.unwrap());

        assert!(matches!(
            service.ensure_thumbnail(&photo).await,
            Err(PhotoError::Store(_))
        ));
        assert_eq!(files_in(&dir.path().join(THUMBNAILS_PREFIX)), 0);
    }

    #[tokio::test]
    async fn test_create_stores_original_and_bounded_thumbnail() {
        let (_dir, service) = service().await;

        let photo = service
            .create(PhotoUpload::new("holiday.png", png_bytes(900, 600)))
            .await
            .unwrap();

        assert_eq!(photo.name, "holiday.png");
        assert!(photo.original_path.starts_with("uploads/"));
        assert!(photo.original_path.ends_with("_holiday.png"));
        assert_eq!(photo.size_bytes, png_bytes(900, 600).len() as i64);

        let thumbnail_path = photo.thumbnail_path.clone().unwrap();
        assert!(thumbnail_path.starts_with("uploads/thumbs/"));
        assert!(thumbnail_path.ends_with("_holiday_thumb.jpg"));

        let bytes = service.store().read(&thumbnail_path).await.unwrap();
        let thumb = image::load_from_memory(&bytes).unwrap();
        assert!(thumb.width() <= 400 && thumb.height() <= 400);
        assert_eq!((thumb.width(), thumb.height()), (400, 267));
    }

    #[tokio::test]
    async fn test_display_name_overrides_filename() {
        let (_dir, service) = service().await;
        let mut upload = PhotoUpload::new("IMG_0001.png", png_bytes(10, 10));
        upload.name = Some(String::new());

        let photo = service.create(upload).await.unwrap();
        assert_eq!(photo.name, "");
    }

    #[tokio::test]
    async fn test_thumbnail_is_not_regenerated() {
        let (dir, service) = service().await;
        let photo = service
            .create(PhotoUpload::new("a.png", png_bytes(20, 20)))
            .await
            .unwrap();
        let first = photo.thumbnail_path.clone().unwrap();

        let again = service.ensure_thumbnail(&photo).await.unwrap();
        assert_eq!(again.thumbnail_path.as_deref(), Some(first.as_str()));

        // A stale copy without the thumbnail loses the race and cleans up after itself.
        let mut stale = photo.clone();
        stale.thumbnail_path = None;
        let raced = service.ensure_thumbnail(&stale).await.unwrap();
        assert_eq!(raced.thumbnail_path.as_deref(), Some(first.as_str()));

        let thumbs = std::fs::read_dir(dir.path().join(THUMBNAILS_PREFIX))
            .unwrap()
            .count();
        assert_eq!(thumbs, 1);
    }

    #[tokio::test]
    async fn test_batch_with_corrupt_file_keeps_going() {
        let (_dir, service) = service().await;

        let uploads = vec![
            PhotoUpload::new("one.png", png_bytes(30, 30)),
            PhotoUpload::new("broken.jpg", Bytes::from_static(b"not really a jpeg")),
            PhotoUpload::new("three.png", png_bytes(30, 30)),
        ];
        let created = service.create_batch(uploads).await;

        assert_eq!(created.len(), 3);
        assert!(created[0].thumbnail_path.is_some());
        assert!(created[1].thumbnail_path.is_none());
        assert!(created[2].thumbnail_path.is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_blobs_then_record() {
        let (_dir, service) = service().await;
        let photo = service
            .create(PhotoUpload::new("a.png", png_bytes(20, 20)))
            .await
            .unwrap();
        let thumbnail_path = photo.thumbnail_path.clone().unwrap();

        service.delete(photo.id).await.unwrap();

        assert!(matches!(service.find(photo.id).await, Err(PhotoError::NotFound)));
        assert!(!service.store().exists(&photo.original_path).await.unwrap());
        assert!(!service.store().exists(&thumbnail_path).await.unwrap());
        assert!(matches!(service.delete(photo.id).await, Err(PhotoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_blobs() {
        let (_dir, service) = service().await;
        let photo = service
            .create(PhotoUpload::new("a.png", png_bytes(20, 20)))
            .await
            .unwrap();
        service.store().delete(&photo.original_path).await.unwrap();

        service.delete(photo.id).await.unwrap();
        assert!(matches!(service.find(photo.id).await, Err(PhotoError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_recent_caps_at_limit() {
        let (_dir, service) = service().await;
        for i in 0..150 {
            service
                .create(PhotoUpload::new(format!("{i}.txt"), Bytes::from_static(b"x")))
                .await
                .unwrap();
        }

        let listed = service.list_recent().await.unwrap();
        assert_eq!(listed.len(), PHOTO_LIST_LIMIT as usize);
        assert_eq!(listed[0].name, "149.txt");
        assert!(listed.windows(2).all(|w| w[0].id > w[1].id));
    }
}
