//! End-to-end runs of the audio service over real collaborators

use crate::fixtures::{config, World, SURFACE};
use minstrel_core::domain::audio::{AudioCategory, PlayerId, SurfaceId};
use minstrel_core::domain::config::ManagerConfig;
use minstrel_core::domain::messages::{AudioEvent, ClientMessage, PlayAudio, SaveProfile, SetProfile};
use minstrel_core::domain::profile::{AudioProfile, PROFILE_STORAGE_KEY};
use minstrel_core::domain::storage::PlayerStorage;
use minstrel_core::{AudioService, AudioServiceHandle, ServiceError};
use minstrel_infra::GizmoState;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn start(world: &World, config: ManagerConfig) -> (AudioServiceHandle, JoinHandle<()>) {
    AudioService::start(
        config,
        world.storage.clone(),
        world.clients.clone(),
        world.gizmos.clone(),
    )
}

async fn next_push(rx: &mut mpsc::UnboundedReceiver<ClientMessage>) -> AudioProfile {
    let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no profile push within the settling window")
        .expect("client channel closed");
    let ClientMessage::SetProfile(SetProfile { profile, .. }) = message;
    profile
}

#[tokio::test]
async fn test_session_round_trip() {
    let world = World::new();
    let (service, task) = start(&world, config());
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    service
        .send(AudioEvent::PlayerEnterWorld { player: p.clone() })
        .await
        .unwrap();
    assert_eq!(next_push(&mut rx).await, AudioProfile::current_default());

    let edited = AudioProfile::current_default()
        .with_volume(AudioCategory::Music, 20)
        .with_volume(AudioCategory::Ui, 80);
    service
        .send(AudioEvent::SetProfile(SetProfile {
            player: p.clone(),
            profile: edited,
        }))
        .await
        .unwrap();
    service
        .send(AudioEvent::PlayerExitWorld { player: p.clone() })
        .await
        .unwrap();

    assert_eq!(service.shutdown().await.unwrap(), 0);
    task.await.unwrap();
    assert_eq!(world.stored_profile(&p).await, Some(edited));
    assert!(rx.try_recv().is_err());

    // Second session on a new service restores the edit
    let (service, task) = start(&world, config());
    let mut rx = world.clients.connect(&p);
    service
        .send(AudioEvent::PlayerEnterWorld { player: p.clone() })
        .await
        .unwrap();
    assert_eq!(next_push(&mut rx).await, edited);
    service.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_events_from_json_lines() {
    let world = World::new();
    let song = world.register("song");
    let (service, task) = start(&world, config());
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    let enter: AudioEvent =
        serde_json::from_str(r#"{"type":"PlayerEnterWorld","player":"p"}"#).unwrap();
    service.send(enter).await.unwrap();
    next_push(&mut rx).await;

    let lines = [
        r#"{"type":"SetProfile","player":"p","profile":{"schemaVersion":1,"musicVolume":120}}"#,
        r#"{"type":"PlayAudio","player":"p","audioHandleRef":"song","category":"Music"}"#,
        r#"{"type":"PlayerFocusUi","player":"p","target":"audio-settings"}"#,
        r#"{"type":"SaveProfile","player":"p"}"#,
    ];
    for line in lines {
        service.send(serde_json::from_str(line).unwrap()).await.unwrap();
    }

    assert_eq!(service.shutdown().await.unwrap(), 1);
    task.await.unwrap();

    let stored = world.stored_profile(&p).await.unwrap();
    assert_eq!(stored.music_volume.value(), 100);
    assert_eq!(world.gizmos.volume(&song), Some(1.0));
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Paused));
}

#[tokio::test]
async fn test_focus_round_trip_through_service() {
    let world = World::new();
    let song = world.register("song");
    let (service, task) = start(&world, config());
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    service
        .send(AudioEvent::PlayerEnterWorld { player: p.clone() })
        .await
        .unwrap();
    next_push(&mut rx).await;

    let surface = SurfaceId::new(SURFACE);
    let events = [
        AudioEvent::PlayAudio(PlayAudio {
            player: p.clone(),
            audio_handle_ref: song.clone(),
            category: AudioCategory::Ambient,
        }),
        AudioEvent::PlayerFocusUi {
            player: p.clone(),
            target: surface.clone(),
        },
        AudioEvent::PlayerUnfocusUi {
            player: p.clone(),
            target: surface,
        },
    ];
    for event in events {
        service.send(event).await.unwrap();
    }

    service.shutdown().await.unwrap();
    task.await.unwrap();
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Playing));
    assert!((world.gizmos.volume(&song).unwrap() - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_join_music_starts_after_push() {
    let world = World::new();
    let theme = world.register("theme");
    let (service, task) = start(
        &world,
        ManagerConfig {
            join_music: Some("theme".to_string()),
            ..config()
        },
    );
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    service
        .send(AudioEvent::PlayerEnterWorld { player: p.clone() })
        .await
        .unwrap();
    next_push(&mut rx).await;

    service.shutdown().await.unwrap();
    task.await.unwrap();
    assert_eq!(world.gizmos.state(&theme, &p), Some(GizmoState::Playing));
}

#[tokio::test]
async fn test_shutdown_flushes_every_live_player() {
    let world = World::new();
    let (service, task) = start(&world, config());
    let players: Vec<PlayerId> = ["a", "b", "c"].into_iter().map(PlayerId::new).collect();

    for player in &players {
        let mut rx = world.clients.connect(player);
        service
            .send(AudioEvent::PlayerEnterWorld {
                player: player.clone(),
            })
            .await
            .unwrap();
        next_push(&mut rx).await;
    }
    service
        .send(AudioEvent::SaveProfile(SaveProfile {
            player: players[0].clone(),
        }))
        .await
        .unwrap();

    assert_eq!(service.shutdown().await.unwrap(), players.len());
    task.await.unwrap();

    for player in &players {
        assert_eq!(
            world.stored_profile(player).await,
            Some(AudioProfile::current_default())
        );
    }
    assert!(matches!(
        service
            .send(AudioEvent::PlayerExitWorld {
                player: players[0].clone()
            })
            .await,
        Err(ServiceError::Closed)
    ));
}

#[tokio::test]
async fn test_edit_during_settling_window_does_not_replace_saved_profile() {
    let world = World::new();
    let p = PlayerId::new("p");
    let saved = AudioProfile::current_default().with_volume(AudioCategory::Music, 12);
    world
        .storage
        .set(&p, PROFILE_STORAGE_KEY, &saved.to_bytes().unwrap())
        .await
        .unwrap();

    let (service, task) = start(
        &world,
        ManagerConfig {
            settle_delay_ms: 200,
            ..config()
        },
    );
    let mut rx = world.clients.connect(&p);

    let early = AudioProfile::current_default().with_volume(AudioCategory::Sfx, 5);
    service
        .send(AudioEvent::PlayerEnterWorld { player: p.clone() })
        .await
        .unwrap();
    service
        .send(AudioEvent::SetProfile(SetProfile {
            player: p.clone(),
            profile: early,
        }))
        .await
        .unwrap();

    assert_eq!(next_push(&mut rx).await, saved);

    service
        .send(AudioEvent::PlayerExitWorld { player: p.clone() })
        .await
        .unwrap();
    service.shutdown().await.unwrap();
    task.await.unwrap();
    assert_eq!(world.stored_profile(&p).await, Some(saved));
}
