//! Cachete demo
//!
//! Memoizes a slow function twice to show the cache hit, then caches a few
//! tagged prices and invalidates them together.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachete::{start_sweeper, Cache, Config, Expiration};

fn expensive_function((word, n): (String, i32)) -> Result<String, std::io::Error> {
    thread::sleep(Duration::from_secs(2));
    Ok(format!("Processed: {word}, {n}"))
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Start the background sweeper on a tokio runtime
/// 4. Run the memoization and tag invalidation demos
/// 5. Stop the sweeper
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachete=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_tag_lifetime={}s, sweep_interval={}s",
        config.default_tag_lifetime, config.sweep_interval
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .context("failed to build tokio runtime")?;

    let cache = Cache::new();
    let sweeper = {
        let _guard = runtime.enter();
        start_sweeper(cache.clone(), config.sweep_interval())
    };

    // Memoization
    let started = Instant::now();
    let args = ("input".to_string(), 42);
    let first = cache
        .memoize_call(
            Expiration::fixed_for(Duration::from_secs(10)),
            expensive_function,
            args.clone(),
        )
        .context("first calculation failed")?;
    info!("First calculation took {:?}", started.elapsed());

    let started = Instant::now();
    let second = cache
        .memoize_call(
            Expiration::fixed_for(Duration::from_secs(10)),
            expensive_function,
            args,
        )
        .context("second calculation failed")?;
    info!("Second calculation took {:?}", started.elapsed());
    info!("Result: {} (same as first: {})", second, first == second);

    // Tag invalidation
    let expiration = config.expiration();
    cache.set(Expiration::with_tag(&expiration, "prices"), "BTCUSDT", 42_000u64);
    cache.set(Expiration::with_tag(&expiration, "prices"), "ETHUSDT", 2_500u64);
    info!(
        "Cached {} prices, BTCUSDT={:?}",
        cache.tagged_len("prices"),
        cache.get::<u64>("BTCUSDT")
    );

    let removed = cache.delete_by_tag("prices");
    info!(
        "Invalidated {} prices, BTCUSDT={:?}",
        removed,
        cache.get::<u64>("BTCUSDT")
    );

    info!("Stats: {}", serde_json::to_string(&cache.stats())?);

    runtime.block_on(sweeper.stop());
    info!("Demo complete");
    Ok(())
}
