//! Relay orchestration: always-on startup, lazy on-demand start, shutdown

mod common;

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::sleep;

use rtsp_relay::{Error, Relay, RelayConfig, StreamConfig};

use common::{keyframe, video_codecs, ScriptedTransport};

fn config() -> RelayConfig {
    RelayConfig::default()
        .stream("lobby", StreamConfig::new("rtsp://lobby/live").disable_audio(true))
        .stream(
            "garage",
            StreamConfig::new("rtsp://garage/live")
                .on_demand(true)
                .viewer_check_interval_secs(5),
        )
}

#[tokio::test(start_paused = true)]
async fn serve_streams_starts_always_on_only() {
    let transport = ScriptedTransport::new();
    let relay = Relay::from_config(config(), transport.clone()).await;

    assert_eq!(relay.serve_streams().await, 1);
    assert!(relay.registry().is_running("lobby").await);
    assert!(!relay.registry().is_running("garage").await);

    // Serving twice does not start a second supervisor
    assert_eq!(relay.serve_streams().await, 0);

    sleep(Duration::from_millis(100)).await;
    let options = transport.last_options().unwrap();
    assert_eq!(options.url, "rtsp://lobby/live");
    assert!(options.disable_audio);
    assert_eq!(options.dial_timeout, Duration::from_secs(10));

    relay.shutdown().await;
    assert!(!relay.registry().is_running("lobby").await);
    assert_eq!(relay.active_supervisors().await, 0);
}

#[tokio::test(start_paused = true)]
async fn run_if_not_run_ignores_always_on() {
    let transport = ScriptedTransport::new();
    // Keeps the garage session (and its claim) alive until the first viewer check
    let _feed = transport.push_connection(video_codecs());
    let relay = Relay::from_config(config(), transport).await;

    assert!(!relay.run_if_not_run("lobby").await);
    assert!(!relay.run_if_not_run("missing").await);
    assert!(relay.run_if_not_run("garage").await);
    assert!(!relay.run_if_not_run("garage").await);

    relay.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn subscribe_starts_on_demand_stream() {
    let transport = ScriptedTransport::new();
    let feed = transport.push_connection(video_codecs());
    let relay = Relay::from_config(config(), transport.clone()).await;

    let mut viewer = relay.subscribe("garage").await.unwrap();
    let second = relay.subscribe("garage").await.unwrap();
    assert_eq!(relay.active_supervisors().await, 1);
    assert_eq!(relay.registry().viewer_count("garage").await, 2);

    feed.send_packet(keyframe()).await.unwrap();
    let packet = viewer.recv().await.unwrap();
    assert!(packet.is_keyframe);
    assert_eq!(viewer.stream_name(), "garage");

    assert_eq!(relay.registry().wait_codecs("garage").await, Some(video_codecs()));
    assert_eq!(transport.dial_count(), 1);

    // Everyone leaves; the next viewer check stops the stream
    drop(viewer);
    drop(second);
    sleep(Duration::from_secs(6)).await;

    assert!(feed.is_closed());
    assert!(!relay.registry().is_running("garage").await);
    assert_eq!(relay.active_supervisors().await, 0);
    assert_eq!(
        relay.registry().last_error("garage").await,
        Some(Error::NoViewer)
    );

    // A new viewer brings it back
    let _feed = transport.push_connection(video_codecs());
    let _viewer = relay.subscribe("garage").await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.dial_count(), 2);
    assert!(relay.registry().is_running("garage").await);

    relay.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn subscribe_unknown_stream() {
    let relay = Relay::from_config(config(), ScriptedTransport::new()).await;

    let result = relay.subscribe("attic").await;
    assert!(matches!(result, Err(Error::StreamNotFound(name)) if name == "attic"));
    assert_eq!(relay.active_supervisors().await, 0);
}

#[tokio::test(start_paused = true)]
async fn run_until_shutdown_releases_everything() {
    let transport = ScriptedTransport::new();
    let feed = transport.push_connection(video_codecs());
    let relay = Relay::from_config(config(), transport).await;
    let registry = relay.registry().clone();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        relay
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    sleep(Duration::from_secs(1)).await;
    assert!(registry.is_running("lobby").await);
    assert!(!feed.is_closed());

    stop_tx.send(()).unwrap();
    server.await.unwrap();

    assert!(feed.is_closed());
    assert!(!registry.is_running("lobby").await);
}
