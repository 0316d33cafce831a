//! Publish through an in-process channel session.
//!
//! A consumer task plays the role of a transport: it inspects each transfer
//! and decides whether to acknowledge or fail it.
//!
//! Run: cargo run --example channel_session

use bytes::Bytes;
use tracing_subscriber::EnvFilter;
use uavcan_tx::{
    OutputSessionSpecifier, PayloadMetadata, Publisher, PublisherConfig, SessionError,
    channel_session,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = PublisherConfig::new().with_max_fragment_size(8);
    let (session, mut transfers) = channel_session(
        OutputSessionSpecifier::message(config.subject),
        PayloadMetadata::new(config.payload_bound),
        4,
    );

    let consumer = tokio::spawn(async move {
        while let Some(pending) = transfers.recv().await {
            let transfer = &pending.transfer;
            println!(
                "Transfer {} ({}): {} fragments, {:?}",
                transfer.transfer_id(),
                transfer.priority(),
                transfer.fragment_count(),
                String::from_utf8_lossy(&transfer.payload())
            );

            if transfer.payload().starts_with(b"drop") {
                pending.fail(SessionError::Closed);
            } else {
                pending.acknowledge();
            }
        }
    });

    let publisher = Publisher::new(session, config)?;
    for text in ["hello, subject 73", "drop this one", "goodbye"] {
        match publisher.publish_raw(Bytes::from_static(text.as_bytes())).await {
            Ok(ack) => println!("  -> acknowledged as transfer {}", ack.transfer_id),
            Err(e) => println!("  -> failed: {e}"),
        }
    }

    drop(publisher);
    consumer.await?;
    Ok(())
}
