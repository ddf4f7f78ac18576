pub mod service;
pub mod thumbnail;

pub use service::{PhotoError, PhotoService, PhotoUpload};
pub use thumbnail::{ThumbnailConfig, ThumbnailService};
