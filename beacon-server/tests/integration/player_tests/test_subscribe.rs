use anyhow::Result;

use beacon_core::{Role, SignalMessage};
use beacon_server::{ConnectOptions, OutboundFrame};

use crate::integration::{create_test_server, init_tracing};
use crate::utils::{TestPeer, connect_player, connect_streamer, offer, subscribe};

#[tokio::test]
async fn test_subscribe_notifies_streamer() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let player = connect_player(&server).await?;

    player
        .send(SignalMessage::Subscribe {
            streamer_id: "Foo".to_owned(),
        })
        .await?;

    match streamer.expect("playerConnected").await? {
        SignalMessage::PlayerConnected {
            player_id,
            data_channel,
            sfu,
            send_offer,
        } => {
            assert_eq!(player_id, "Player0");
            assert!(data_channel);
            assert!(!sfu);
            assert!(send_offer);
        }
        other => panic!("Unexpected {:?}", other),
    }

    let snapshot = server.snapshot().await?;
    assert_eq!(snapshot.streamer("Foo").unwrap().subscribers, vec!["Player0"]);

    Ok(())
}

#[tokio::test]
async fn test_offer_to_receive_disables_send_offer() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let mut player = TestPeer::connect_with(
        &server,
        Role::Player,
        ConnectOptions {
            offer_to_receive: true,
        },
    )
    .await?;
    player.expect("config").await?;

    player
        .send(SignalMessage::Subscribe {
            streamer_id: "Foo".to_owned(),
        })
        .await?;

    match streamer.expect("playerConnected").await? {
        SignalMessage::PlayerConnected { send_offer, .. } => assert!(!send_offer),
        other => panic!("Unexpected {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_subscribe_to_missing_streamer_fails() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let mut player = connect_player(&server).await?;
    player
        .send(SignalMessage::Subscribe {
            streamer_id: "Nope".to_owned(),
        })
        .await?;

    player.expect("subscribeFailed").await?;
    let snapshot = server.snapshot().await?;
    assert_eq!(snapshot.players[0].subscribed_to, None);

    Ok(())
}

#[tokio::test]
async fn test_resubscribe_cycle_does_not_leak() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut streamer, "Foo").await?;

    for _ in 0..3 {
        player.send(SignalMessage::Unsubscribe).await?;
        match streamer.expect("playerDisconnected").await? {
            SignalMessage::PlayerDisconnected { player_id: id } => assert_eq!(id, player_id),
            other => panic!("Unexpected {:?}", other),
        }

        assert_eq!(subscribe(&player, &mut streamer, "Foo").await?, player_id);
    }

    let snapshot = server.snapshot().await?;
    assert_eq!(snapshot.streamer("Foo").unwrap().subscribers, vec![player_id]);

    // Unsubscribing when not subscribed is a no-op.
    player.send(SignalMessage::Unsubscribe).await?;
    player.send(SignalMessage::Unsubscribe).await?;
    let frames = streamer.drain().await?;
    assert_eq!(frames.len(), 1);
    assert!(matches!(
        &frames[0],
        OutboundFrame::Message(SignalMessage::PlayerDisconnected { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_switching_streamers_unsubscribes_first() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut foo, _) = connect_streamer(&server, "Foo").await?;
    let (mut bar, _) = connect_streamer(&server, "Bar").await?;
    let player = connect_player(&server).await?;
    subscribe(&player, &mut foo, "Foo").await?;

    player
        .send(SignalMessage::Subscribe {
            streamer_id: "Bar".to_owned(),
        })
        .await?;

    foo.expect("playerDisconnected").await?;
    bar.expect("playerConnected").await?;

    let snapshot = server.snapshot().await?;
    assert!(snapshot.streamer("Foo").unwrap().subscribers.is_empty());
    assert_eq!(snapshot.streamer("Bar").unwrap().subscribers.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_list_streamers_returns_every_id() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (_foo, _) = connect_streamer(&server, "Foo").await?;
    let (_bar, _) = connect_streamer(&server, "Bar").await?;
    let mut player = connect_player(&server).await?;

    player.send(SignalMessage::ListStreamers).await?;
    match player.expect("streamerList").await? {
        SignalMessage::StreamerList { ids } => assert_eq!(ids, vec!["Foo", "Bar"]),
        other => panic!("Unexpected {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_player_close_unsubscribes() -> Result<()> {
    init_tracing();
    let server = create_test_server();
    let mut events = server.subscribe_player_events();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut streamer, "Foo").await?;

    player.close().await?;
    streamer.expect("playerDisconnected").await?;

    let snapshot = server.snapshot().await?;
    assert!(snapshot.players.is_empty());
    assert!(snapshot.streamer("Foo").unwrap().subscribers.is_empty());

    assert_eq!(events.recv().await?, beacon_server::RegistryEvent::Added(player_id.clone()));
    assert_eq!(events.recv().await?, beacon_server::RegistryEvent::Removed(player_id));

    Ok(())
}

/// Assert `msg` is an offer stamped for `player_id`.
fn assert_offer_from(msg: SignalMessage, player_id: &str) {
    match msg {
        SignalMessage::Offer(payload) => {
            assert_eq!(payload.player_id.as_deref(), Some(player_id));
            assert_eq!(payload.get("sdp").and_then(|v| v.as_str()), Some("v=0 late"));
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_offer_after_unsubscribe_falls_back_to_first_streamer() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut foo, _) = connect_streamer(&server, "Foo").await?;
    let (mut bar, _) = connect_streamer(&server, "Bar").await?;
    let player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut bar, "Bar").await?;

    player.send(SignalMessage::Unsubscribe).await?;
    bar.expect("playerDisconnected").await?;

    player.send(offer("v=0 late")).await?;

    match foo.expect("playerConnected").await? {
        SignalMessage::PlayerConnected { player_id: id, .. } => assert_eq!(id, player_id),
        other => panic!("Unexpected {:?}", other),
    }
    assert_offer_from(foo.expect("offer").await?, &player_id);

    // The previous streamer must not see the late offer.
    assert!(bar.drain().await?.is_empty());

    let snapshot = server.snapshot().await?;
    assert_eq!(snapshot.player(&player_id).unwrap().subscribed_to.as_deref(), Some("Foo"));
    assert!(snapshot.streamer("Bar").unwrap().subscribers.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_offer_after_switch_reaches_new_streamer_only() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut foo, _) = connect_streamer(&server, "Foo").await?;
    let (mut bar, _) = connect_streamer(&server, "Bar").await?;
    let player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut foo, "Foo").await?;

    player
        .send(SignalMessage::Subscribe {
            streamer_id: "Bar".to_owned(),
        })
        .await?;
    player.send(offer("v=0 late")).await?;

    match bar.expect("playerConnected").await? {
        SignalMessage::PlayerConnected { player_id: id, .. } => assert_eq!(id, player_id),
        other => panic!("Unexpected {:?}", other),
    }
    assert_offer_from(bar.expect("offer").await?, &player_id);

    let frames = foo.drain().await?;
    assert_eq!(frames.len(), 1);
    assert!(matches!(
        &frames[0],
        OutboundFrame::Message(SignalMessage::PlayerDisconnected { player_id: id }) if *id == player_id
    ));

    Ok(())
}
