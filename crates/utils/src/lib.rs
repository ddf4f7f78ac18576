pub mod filename;
pub mod sentry;
