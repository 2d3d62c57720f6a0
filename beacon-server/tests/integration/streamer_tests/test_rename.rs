use anyhow::Result;

use beacon_core::SignalMessage;
use beacon_server::RegistryEvent;

use crate::integration::{create_test_server, init_tracing};
use crate::utils::{connect_player, connect_streamer, expect_confirm, offer, subscribe};

#[tokio::test]
async fn test_rename_is_propagated_to_subscribers() -> Result<()> {
    init_tracing();
    let server = create_test_server();
    let mut events = server.subscribe_streamer_events();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let mut player = connect_player(&server).await?;
    let player_id = subscribe(&player, &mut streamer, "Foo").await?;

    streamer
        .send(SignalMessage::EndpointId {
            id: "Bar".to_owned(),
        })
        .await?;

    assert_eq!(expect_confirm(&mut streamer).await?, "Bar");
    match player.expect("streamerIdChanged").await? {
        SignalMessage::StreamerIdChanged { new_id } => assert_eq!(new_id, "Bar"),
        other => panic!("Unexpected {:?}", other),
    }

    let snapshot = server.snapshot().await?;
    assert!(snapshot.streamer("Foo").is_none());
    assert_eq!(snapshot.player(&player_id).unwrap().subscribed_to.as_deref(), Some("Bar"));

    assert_eq!(events.recv().await?, RegistryEvent::Added("Foo".into()));
    assert_eq!(
        events.recv().await?,
        RegistryEvent::Renamed {
            from: "Foo".into(),
            to: "Bar".into()
        }
    );

    // The subscription follows the new id.
    player.send(offer("v=0")).await?;
    match streamer.expect("offer").await? {
        SignalMessage::Offer(payload) => assert_eq!(payload.player_id.as_deref(), Some(player_id.as_str())),
        other => panic!("Unexpected {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_rename_onto_taken_id_is_sanitized() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (_foo, _) = connect_streamer(&server, "Foo").await?;
    let (mut bar, _) = connect_streamer(&server, "Bar").await?;

    bar.send(SignalMessage::EndpointId {
        id: "Foo".to_owned(),
    })
    .await?;
    assert_eq!(expect_confirm(&mut bar).await?, "Foo1");

    let snapshot = server.snapshot().await?;
    let ids: Vec<_> = snapshot.streamers.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["Foo", "Foo1"]);

    Ok(())
}

#[tokio::test]
async fn test_rename_to_same_id_sends_no_notification() -> Result<()> {
    init_tracing();
    let server = create_test_server();

    let (mut streamer, _) = connect_streamer(&server, "Foo").await?;
    let mut player = connect_player(&server).await?;
    subscribe(&player, &mut streamer, "Foo").await?;

    streamer
        .send(SignalMessage::EndpointId {
            id: "Foo".to_owned(),
        })
        .await?;

    assert_eq!(expect_confirm(&mut streamer).await?, "Foo");
    assert!(player.drain().await?.is_empty());

    Ok(())
}
