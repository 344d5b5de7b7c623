//! Relay demo over a synthetic source
//!
//! Run with: cargo run --example synthetic_relay
//!
//! Set `RUST_LOG=rtsp_relay=debug` to watch supervisors connect, sessions
//! end and viewers come and go.
//!
//! The synthetic transport emits 25 fps video with a keyframe every second.
//! Dialing a URL containing "dead" fails, and a URL containing "stall"
//! stops sending keyframes after five seconds so the keyframe timeout kicks
//! in.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::{interval, sleep};

use rtsp_relay::config::{RelayConfig, StreamConfig, SupervisorConfig};
use rtsp_relay::error::TransportError;
use rtsp_relay::media::{CodecData, CodecType, Packet};
use rtsp_relay::transport::{Connection, ConnectionFeed, DialOptions, Transport};
use rtsp_relay::Relay;

const FPS: u64 = 25;

struct SyntheticTransport;

impl Transport for SyntheticTransport {
    async fn dial(&self, options: DialOptions) -> Result<Connection, TransportError> {
        if options.url.contains("dead") {
            return Err(TransportError::Connect(format!(
                "{}: connection refused",
                options.url
            )));
        }

        let mut codecs = vec![CodecData::video(CodecType::H264, 0, 1280, 720)];
        if !options.disable_audio {
            codecs.push(CodecData::audio(CodecType::Aac, 1, 44100, 2));
        }

        let (connection, feed) = Connection::channel(codecs, 256);
        let stall_after = options
            .url
            .contains("stall")
            .then(|| Duration::from_secs(5));
        tokio::spawn(generate(feed, stall_after));

        Ok(connection)
    }
}

async fn generate(feed: ConnectionFeed, stall_after: Option<Duration>) {
    let mut ticker = interval(Duration::from_millis(1000 / FPS));
    let mut frame: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = feed.closed() => return,
        }

        let timestamp = Duration::from_millis(frame * 1000 / FPS);
        let stalled = stall_after.is_some_and(|after| timestamp >= after);
        let is_keyframe = frame % FPS == 0 && !stalled;

        let payload = Bytes::from(vec![if is_keyframe { 0x65 } else { 0x41 }; 512]);
        let packet = Packet::video(0, timestamp, payload, is_keyframe)
            .with_duration(Duration::from_millis(1000 / FPS));

        if feed.try_send_packet(packet).is_err() {
            return;
        }
        frame += 1;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtsp_relay=info".parse()?),
        )
        .init();

    let config = RelayConfig::default()
        .stream("lobby", StreamConfig::new("rtsp://synthetic/lobby"))
        .stream("stalling", StreamConfig::new("rtsp://synthetic/stall"))
        .stream("offline", StreamConfig::new("rtsp://synthetic/dead"))
        .stream(
            "garage",
            StreamConfig::new("rtsp://synthetic/garage")
                .on_demand(true)
                .disable_audio(true)
                .viewer_check_interval_secs(3),
        )
        .supervisor(SupervisorConfig::default().keyframe_timeout(Duration::from_secs(5)));

    let relay = Relay::from_config(config, SyntheticTransport).await;
    relay.serve_streams().await;

    // Watch the on-demand stream for a few seconds
    let mut viewer = relay.subscribe("garage").await?;
    let mut received = 0u64;
    let mut keyframes = 0u64;
    let watch = sleep(Duration::from_secs(5));
    tokio::pin!(watch);

    loop {
        tokio::select! {
            _ = &mut watch => break,
            packet = viewer.recv() => match packet {
                Some(packet) => {
                    received += 1;
                    if packet.is_keyframe {
                        keyframes += 1;
                    }
                }
                None => break,
            },
        }
    }
    println!("garage: received {} packets ({} keyframes)", received, keyframes);

    // Leave; the garage stream stops at its next viewer check
    drop(viewer);
    sleep(Duration::from_secs(12)).await;

    let registry = relay.registry();
    for name in registry.stream_names().await {
        if let Some(stats) = registry.stream_stats(&name).await {
            println!(
                "{:<10} running={:<5} sessions={:<3} forwarded={:<5} last_error={}",
                name,
                stats.running,
                stats.sessions_started,
                stats.packets_forwarded,
                stats
                    .last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "-".into()),
            );
        }
    }

    relay.shutdown().await;
    Ok(())
}
