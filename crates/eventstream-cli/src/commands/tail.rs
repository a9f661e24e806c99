//! Tail command - print events from a long-lived stream

use anyhow::{Context, Result};
use eventstream_client::{ChannelSubscriber, Credentials, EventStream, SessionEvent, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use crate::output::OutputContext;

/// Stream events until Ctrl+C (or until `max_events` events were printed)
pub async fn tail(
    config: StreamConfig,
    url: Url,
    credentials: Credentials,
    max_events: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let retry_ms = config.retry_interval_ms;
    let stream = EventStream::with_http(config).context("Failed to create event stream")?;

    ctx.info(&format!("Connecting to {} as {}...", url, credentials.username()));
    ctx.info("Press Ctrl+C to stop");

    let (subscriber, mut notifications) = ChannelSubscriber::new();
    stream.connect(url, credentials, subscriber);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut received = 0u64;

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    ctx.info("Stream closed");
                    break;
                };
                // Status is updated before the subscriber hears about the error
                let reconnect_ms = stream.status().is_active().then_some(retry_ms);
                ctx.print_notification(&notification, reconnect_ms);

                if matches!(notification, SessionEvent::Event(_)) {
                    received += 1;
                    if max_events.is_some_and(|max| received >= max) {
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {
                // Check running flag periodically
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }

    ctx.info("\nDisconnecting...");
    stream.disconnect();
    ctx.success(&format!("Disconnected after {} event(s)", received));

    Ok(())
}
