//! Publish a long string as one fragmented transfer.
//!
//! The content is wrapped in an ethernet-frame-shaped payload and sent on
//! subject 73 in 1000-byte fragments at low priority, with one second to
//! complete.
//!
//! Run: cargo run --example publish_string
//! Or send to a specific receiver: cargo run --example publish_string -- 127.0.0.1:9382
//!
//! Set `RUST_LOG=uavcan_tx=trace` to see every frame.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use uavcan_tx::{
    EtherType, MacAddress, Payload, Priority, Publisher, PublisherConfig, SubjectId,
};

const SONG: &str = concat!(
    "I am the very model of a modern Major-Gineral, ",
    "I've information vegetable, animal, and mineral, ",
    "I know the kings of England, and I quote the fights historical ",
    "From Marathon to Waterloo, in order categorical; ",
    "I'm very well acquainted, too, with matters mathematical, ",
    "I understand equations, both the simple and quadratical, ",
    "About binomial theorem I'm teeming with a lot o' news, ",
    "With many cheerful facts about the square of the hypotenuse. ",
    "I'm very good at integral and differential calculus; ",
    "I know the scientific names of beings animalculous: ",
    "In short, in matters vegetable, animal, and mineral, ",
    "I am the very model of a modern Major-Gineral. ",
    "I know our mythic history, King Arthur's and Sir Caradoc's; ",
    "I answer hard acrostics, I've a pretty taste for paradox, ",
    "I quote in elegiacs all the crimes of Heliogabalus, ",
    "In conics I can floor peculiarities parabolous; ",
    "I can tell undoubted Raphaels from Gerard Dows and Zoffanies, ",
    "I know the croaking chorus from The Frogs of Aristophanes! ",
    "Then I can hum a fugue of which I've heard the music's din afore, ",
    "And whistle all the airs from that infernal nonsense Pinafore. ",
    "Then I can write a washing bill in Babylonic cuneiform, ",
    "And tell you ev'ry detail of Caractacus's uniform: ",
    "In short, in matters vegetable, animal, and mineral, ",
    "I am the very model of a modern Major-Gineral. ",
    "In fact, when I know what is meant by \"mamelon\" and \"ravelin\", ",
    "When I can tell at sight a Mauser rifle from a javelin, ",
    "When such affairs as sorties and surprises I'm more wary at, ",
    "And when I know precisely what is meant by \"commissariat\", ",
    "When I have learnt what progress has been made in modern gunnery, ",
    "When I know more of tactics than a novice in a nunnery - ",
    "In short, when I've a smattering of elemental strategy - ",
    "You'll say a better Major-General has never sat a gee. ",
    "For my military knowledge, though I'm plucky and adventury, ",
    "Has only been brought down to the beginning of the century; ",
    "But still, in matters vegetable, animal, and mineral, ",
    "I am the very model of a modern Major-Gineral.",
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let payload = Payload::builder()
        .destination(MacAddress([0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5]))
        .source(MacAddress([0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5]))
        .ether_type(EtherType::IPV4)
        .content(SONG.as_bytes())
        .build()?;

    let mut config = PublisherConfig::new()
        .with_local_addr(Ipv4Addr::new(127, 0, 0, 5))
        .with_subject(SubjectId::new(73)?)
        .with_max_fragment_size(1000)
        .with_priority(Priority::Low)
        .with_send_timeout(Duration::from_secs(1));

    if let Some(remote) = std::env::args().nth(1) {
        let remote: SocketAddr = remote.parse()?;
        config = config.with_local_addr(Ipv4Addr::LOCALHOST).with_remote(remote);
    }

    let publisher = Publisher::udp(config).await?;
    println!(
        "Publishing {} bytes from {} to {}",
        payload.len(),
        publisher.session().local_addr()?,
        publisher.session().destination()
    );

    let ack = publisher.publish(&payload).await?;
    println!(
        "Transfer {} accepted: {} fragments, {} bytes",
        ack.transfer_id, ack.fragments, ack.bytes
    );

    Ok(())
}
