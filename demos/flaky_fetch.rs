//! # Example: flaky_fetch
//!
//! Drives a [`RequestQueue`](backoff_queue::RequestQueue) through [`QueueDriver`] while a
//! worker "fetches" each active payload. Every URL fails a few times before it succeeds,
//! so the queue pushes it back with growing delay and promotes the next one in between.
//!
//! ## Flow
//! ```text
//! main
//!   ├─► QueueDriver::spawn(token)       (LogWriter attached)
//!   ├─► handle.schedule(url) × 3
//!   └─► loop on started.recv()
//!         ├─► snapshot()                (which payload is active?)
//!         ├─► fetch(url) → Err          ─► retry_active(floor)
//!         └─► fetch(url) → Ok           ─► release_active()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example flaky_fetch --features logging
//! ```

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Context;
use backoff_queue::{
    BackoffPolicy, JitterPolicy, LogWriter, QueueConfig, QueueDriver, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Number of failures each URL produces before it succeeds.
const FAILURES: [(&str, u32); 3] = [
    ("https://a.example/feed", 0),
    ("https://b.example/feed", 2),
    ("https://c.example/feed", 1),
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Backoff: 50ms, 100ms, 200ms ... capped at 1s, with equal jitter.
    let cfg = QueueConfig {
        backoff: BackoffPolicy {
            first: Duration::from_millis(50),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
            ..BackoffPolicy::default()
        },
        ..QueueConfig::default()
    };

    // 2. Spawn the driver with a logging subscriber.
    let token = CancellationToken::new();
    let mut q = QueueDriver::new(cfg)
        .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
        .spawn::<String>(token.clone());

    // 3. Schedule the work.
    let mut remaining: HashMap<String, u32> = FAILURES
        .iter()
        .map(|(url, n)| ((*url).to_string(), *n))
        .collect();
    for url in remaining.keys() {
        q.handle.schedule(url.clone()).await?;
    }

    // 4. Work on whatever becomes active until everything is released.
    let mut done = 0;
    while done < FAILURES.len() {
        q.started.recv().await.context("driver stopped early")?;
        let snap = q.handle.snapshot().await?;
        let url = snap.active.context("start signal without active request")?;
        let attempt = snap.active_failure_count.unwrap_or_default() + 1;

        let left = remaining.entry(url.clone()).or_default();
        if *left > 0 {
            *left -= 1;
            println!("[fetch] {url} attempt {attempt}: 503");
            q.handle.retry_active(Duration::from_millis(20)).await?;
        } else {
            println!("[fetch] {url} attempt {attempt}: 200");
            q.handle.release_active().await?;
            done += 1;
        }
    }

    // 5. Stop the driver; the listener drains the subscriber queues.
    token.cancel();
    q.join.await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("[main] done.");
    Ok(())
}
