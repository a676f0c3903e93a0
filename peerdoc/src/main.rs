use peerdoc::{
    config::NodeConfig,
    node::{self, NodeError},
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<(), NodeError> {
    init_tracing();

    let config = NodeConfig::from_env()?;
    if let Err(err) = node::run(config).await {
        tracing::error!("node exited with error: {err}");
        return Err(err);
    }

    Ok(())
}
