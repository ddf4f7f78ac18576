use std::{env, path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::photos::thumbnail::{
    DEFAULT_THUMBNAIL_JPEG_QUALITY, DEFAULT_THUMBNAIL_MAX_DIMENSION, ThumbnailConfig,
};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub server_public_base_url: String,
    pub media: MediaConfig,
    pub max_upload_bytes: usize,
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory blobs are written below.
    pub root: PathBuf,
    /// URL prefix blobs are served under.
    pub url_prefix: String,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        let url_prefix = env::var("MEDIA_URL").unwrap_or_else(|_| "/media".to_string());

        tracing::info!(root = %root, url_prefix = %url_prefix, "Media config loaded");

        Self {
            root: PathBuf::from(root),
            url_prefix,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|_| ConfigError::InvalidVar(name)),
        _ => Ok(default),
    }
}

impl ThumbnailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_dimension = parse_var("THUMBNAIL_MAX_DIMENSION", DEFAULT_THUMBNAIL_MAX_DIMENSION)?;
        if max_dimension == 0 {
            return Err(ConfigError::InvalidVar("THUMBNAIL_MAX_DIMENSION"));
        }

        let jpeg_quality = parse_var("THUMBNAIL_JPEG_QUALITY", DEFAULT_THUMBNAIL_JPEG_QUALITY)?;
        if !(1..=100).contains(&jpeg_quality) {
            return Err(ConfigError::InvalidVar("THUMBNAIL_JPEG_QUALITY"));
        }

        Ok(Self {
            max_dimension,
            jpeg_quality,
        })
    }
}

impl GalleryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://gallery.db?mode=rwc".to_string());
        if database_url.is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }

        let listen_addr =
            env::var("SERVER_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let server_public_base_url = env::var("SERVER_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let media = MediaConfig::from_env();
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let thumbnail = ThumbnailConfig::from_env()?;

        tracing::info!(
            listen_addr = %listen_addr,
            max_upload_bytes,
            thumbnail_max_dimension = thumbnail.max_dimension,
            thumbnail_jpeg_quality = thumbnail.jpeg_quality,
            "Gallery config loaded"
        );

        Ok(Self {
            database_url,
            listen_addr,
            server_public_base_url,
            media,
            max_upload_bytes,
            thumbnail,
        })
    }
}
