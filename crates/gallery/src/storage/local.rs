use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use rand::{Rng, distr::Alphanumeric};
use tokio::{fs, io::AsyncWriteExt};

use super::{BlobStore, BlobStoreError};

const MAX_NAME_ATTEMPTS: usize = 16;
const RANDOM_SUFFIX_LEN: usize = 7;

/// Blob store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobStoreError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(BlobStoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn write_new(&self, path: &str, data: &[u8]) -> Result<bool, BlobStoreError> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&full_path).await {
                tracing::warn!(
                    blob_path = %path,
                    error = %cleanup,
                    "Failed to remove partially written blob"
                );
            }
            return Err(e.into());
        }

        Ok(true)
    }
}

/// `name.ext` -> `name_<random>.ext`
fn alternative_name(filename: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();

    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{suffix}.{ext}"),
        _ => format!("{filename}_{suffix}"),
    }
}

fn join_path(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{prefix}/{filename}")
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        prefix: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<String, BlobStoreError> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(BlobStoreError::InvalidPath(filename.to_string()));
        }
        let mut candidate = filename.to_string();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = join_path(prefix, &candidate);
            if self.write_new(&path, &data).await? {
                tracing::debug!(blob_path = %path, size = data.len(), "Stored blob");
                return Ok(path);
            }
            candidate = alternative_name(filename);
        }

        Err(BlobStoreError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free blob name for {filename}"),
        )))
    }

    async fn read(&self, path: &str) -> Result<Bytes, BlobStoreError> {
        let full_path = self.resolve(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), BlobStoreError> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BlobStoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobStoreError> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(&full_path).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), path)
    }
}
