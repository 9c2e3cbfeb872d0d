use anyhow::Context;
use session_verifier::tracing_config::{init_tracing, root_span, TracingConfig};
use session_verifier::{default, CustomData, MemoryStore, RedisStore, TokenStore, Verifier, VerifierConfig};
use std::env;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&TracingConfig::from_env())?;

    let config = VerifierConfig::from_env()?;
    let span = root_span(&config.source_name);

    run(config).instrument(span).await
}

async fn run(config: VerifierConfig) -> anyhow::Result<()> {
    info!("Starting session verifier demo");

    let store: Arc<dyn TokenStore> = match env::var("REDIS_URL") {
        Ok(url) => Arc::new(
            RedisStore::new(&url)
                .await
                .context("connecting to Redis")?,
        ),
        Err(_) => {
            warn!("REDIS_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    default::init_default_verifier(Verifier::<u64>::new(config, store)?)?;

    let identity = 1u64;
    let mut data = CustomData::new();
    data.insert("foo".to_string(), serde_json::json!("bar"));

    let token = default::create_token(&identity, data).await?;
    info!(token_len = token.len(), "Created token");

    let verified = default::verify_token::<u64>(&token).await?;
    info!(
        session_id = %verified.claims.session_id,
        refreshed = verified.is_refreshed(),
        "Verified token"
    );

    let authorized = default::is_token_authorized::<u64>(&token).await.is_some();
    info!(authorized, "Checked authorization");

    default::destroy_token(&identity, &verified.claims.session_id).await?;
    let authorized = default::is_token_authorized::<u64>(&token).await.is_some();
    info!(authorized, "Checked authorization after destroy");

    default::destroy_all_tokens(&identity).await?;
    info!("Session verifier demo finished");

    Ok(())
}
