use gallery::{Server, config::GalleryConfig, init_tracing, sentry_init_once};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sentry_init_once();
    init_tracing();

    let config = GalleryConfig::from_env()?;
    Server::run(config).await
}
