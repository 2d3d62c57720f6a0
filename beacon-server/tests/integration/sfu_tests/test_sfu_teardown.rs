use anyhow::Result;
use tokio::sync::broadcast;

use beacon_server::RegistryEvent;

use crate::integration::{create_test_server, init_tracing};
use crate::utils::{connect_player, connect_sfu, connect_streamer, subscribe};

/// Everything published so far, without waiting.
fn collect(events: &mut broadcast::Receiver<RegistryEvent>) -> Vec<RegistryEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn removals(events: &[RegistryEvent], id: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RegistryEvent::Removed(removed) if removed == id))
        .count()
}

#[tokio::test]
async fn test_sfu_close_leaves_both_registries_once() -> Result<()> {
    init_tracing();
    let server = create_test_server();
    let mut streamer_events = server.subscribe_streamer_events();
    let mut player_events = server.subscribe_player_events();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let mut sfu = connect_sfu(&server).await?;
    let sfu_player_id = subscribe(&sfu, &mut streamer, "Foo").await?;
    let mut player = connect_player(&server).await?;
    subscribe(&player, &mut sfu, "SFU").await?;

    sfu.close().await?;
    sfu.close().await?;

    streamer.expect("playerDisconnected").await?;
    player.expect("streamerDisconnected").await?;

    let snapshot = server.snapshot().await?;
    assert!(snapshot.streamer("SFU").is_none());
    assert!(snapshot.player(&sfu_player_id).is_none());
    assert!(snapshot.streamer("Foo").unwrap().subscribers.is_empty());

    assert_eq!(removals(&collect(&mut streamer_events), "SFU"), 1);
    assert_eq!(removals(&collect(&mut player_events), &sfu_player_id), 1);

    Ok(())
}

#[tokio::test]
async fn test_upstream_disconnect_tears_down_sfu() -> Result<()> {
    init_tracing();
    let server = create_test_server();
    let mut streamer_events = server.subscribe_streamer_events();
    let mut player_events = server.subscribe_player_events();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let mut sfu = connect_sfu(&server).await?;
    let sfu_player_id = subscribe(&sfu, &mut streamer, "Foo").await?;
    let mut player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut sfu, "SFU").await?;

    streamer.close().await?;

    assert_eq!(sfu.expect_close().await?, "Upstream streamer disconnected");
    player.expect("streamerDisconnected").await?;

    // The SFU's own transport close arrives afterwards and changes nothing.
    sfu.close().await?;

    let snapshot = server.snapshot().await?;
    assert!(snapshot.streamers.is_empty());
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.player(&player_id).unwrap().subscribed_to, None);

    let streamer_events = collect(&mut streamer_events);
    assert_eq!(removals(&streamer_events, "Foo"), 1);
    assert_eq!(removals(&streamer_events, "SFU"), 1);
    assert_eq!(removals(&collect(&mut player_events), &sfu_player_id), 1);

    Ok(())
}
