//! Player lifecycle against file storage, the gizmo host and channel clients
//!
//! These tests drive the synchronizer directly so the store can be
//! inspected between events.

use crate::fixtures::{config, join, World, SURFACE};
use minstrel_core::domain::audio::{AudioCategory, PlayerId, SurfaceId, Volume};
use minstrel_core::domain::config::ManagerConfig;
use minstrel_core::domain::messages::{ClientLink, ClientMessage, PlayAudio, SetProfile};
use minstrel_core::domain::profile::{AudioProfile, CURRENT_SCHEMA_VERSION, PROFILE_STORAGE_KEY};
use minstrel_core::domain::router::PlayOutcome;
use minstrel_core::domain::storage::PlayerStorage;
use minstrel_core::domain::store::PlayerPhase;
use minstrel_infra::GizmoState;

fn edit(player: &PlayerId, profile: AudioProfile) -> SetProfile {
    SetProfile {
        player: player.clone(),
        profile,
    }
}

// ============================================================================
// JOIN
// ============================================================================

#[tokio::test]
async fn test_join_without_saved_data_pushes_defaults_once() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    sync.on_player_enter(&p);
    assert!(sync.is_join_pending(&p));
    assert_eq!(sync.phase(&p), PlayerPhase::Initializing);
    assert!(rx.try_recv().is_err());

    let ticket = tickets.recv().await.unwrap();
    let pushed = sync.complete_join(ticket).await.unwrap();

    let defaults = AudioProfile::current_default();
    assert_eq!(pushed, defaults);
    assert_eq!(pushed.schema_version, CURRENT_SCHEMA_VERSION);
    assert!(AudioCategory::ALL
        .iter()
        .all(|&c| pushed.volume(c) == Volume::new(50)));
    assert!(!pushed.is_muted);

    assert_eq!(
        rx.try_recv().unwrap(),
        ClientMessage::SetProfile(edit(&p, defaults))
    );
    assert!(rx.try_recv().is_err());
    assert!(sync.phase(&p).is_active());
}

#[tokio::test]
async fn test_push_reaches_only_the_joining_player() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    let q = PlayerId::new("q");
    let mut p_rx = world.clients.connect(&p);
    let mut q_rx = world.clients.connect(&q);

    join(&mut sync, &mut tickets, &p).await;

    assert!(p_rx.try_recv().is_ok());
    assert!(q_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_returning_player_gets_saved_profile() {
    let world = World::new();
    let p = PlayerId::new("p");
    let saved = AudioProfile::current_default()
        .with_volume(AudioCategory::Ambient, 12)
        .with_volume(AudioCategory::Notification, 0);

    {
        let (mut sync, mut tickets) = world.synchronizer(config());
        join(&mut sync, &mut tickets, &p).await;
        assert!(sync.set_profile(edit(&p, saved)).await);
        assert!(sync.on_player_exit(&p).await);
    }

    // A fresh server process reads what the previous one wrote
    let (mut sync, mut tickets) = world.synchronizer(config());
    let mut rx = world.clients.connect(&p);
    assert_eq!(join(&mut sync, &mut tickets, &p).await, saved);
    assert_eq!(
        rx.try_recv().unwrap(),
        ClientMessage::SetProfile(edit(&p, saved))
    );
}

#[tokio::test]
async fn test_stale_saved_profile_is_reset() {
    let world = World::new();
    let p = PlayerId::new("p");
    world
        .storage
        .set(&p, PROFILE_STORAGE_KEY, br#"{"version":0,"musicVolume":10}"#)
        .await
        .unwrap();

    let (mut sync, mut tickets) = world.synchronizer(config());
    let profile = join(&mut sync, &mut tickets, &p).await;

    assert_eq!(profile, AudioProfile::current_default());
}

#[tokio::test]
async fn test_unreadable_saved_profile_falls_back_to_defaults() {
    let world = World::new();
    let p = PlayerId::new("p");
    world
        .storage
        .set(&p, PROFILE_STORAGE_KEY, b"not json at all")
        .await
        .unwrap();

    let (mut sync, mut tickets) = world.synchronizer(config());
    assert_eq!(
        join(&mut sync, &mut tickets, &p).await,
        AudioProfile::current_default()
    );
}

#[tokio::test]
async fn test_leave_before_settling_discards_join() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(ManagerConfig {
        settle_delay_ms: 0,
        ..config()
    });
    let p = PlayerId::new("p");
    let mut rx = world.clients.connect(&p);

    sync.on_player_enter(&p);
    assert!(!sync.on_player_exit(&p).await);
    assert!(!sync.is_join_pending(&p));

    // Re-join; only the newest ticket may complete
    sync.on_player_enter(&p);
    loop {
        let ticket = tickets.recv().await.unwrap();
        if sync.complete_join(ticket).await.is_some() {
            break;
        }
    }
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
    assert!(world.stored_bytes(&p).await.is_none());
}

// ============================================================================
// EDITS
// ============================================================================

#[tokio::test]
async fn test_out_of_range_edit_is_clamped() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    let msg: SetProfile = serde_json::from_str(
        r#"{"player":"p","profile":{"schemaVersion":1,"musicVolume":120,"sfxVolume":-4}}"#,
    )
    .unwrap();
    assert!(sync.set_profile(msg).await);

    let stored = sync.store().get(&p).unwrap();
    assert_eq!(stored.music_volume.value(), 100);
    assert_eq!(stored.sfx_volume.value(), 0);
}

#[tokio::test]
async fn test_concurrent_edits_never_cross_write() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    let q = PlayerId::new("q");
    join(&mut sync, &mut tickets, &p).await;
    join(&mut sync, &mut tickets, &q).await;

    let p_profile = AudioProfile::current_default().with_volume(AudioCategory::Music, 10);
    let q_profile = AudioProfile::current_default().with_volume(AudioCategory::Music, 90);
    for round in 0..5 {
        let (first, second) = if round % 2 == 0 { (&p, &q) } else { (&q, &p) };
        let profile_for = |player: &PlayerId| if player == &p { p_profile } else { q_profile };
        sync.set_profile(edit(first, profile_for(first))).await;
        sync.set_profile(edit(second, profile_for(second))).await;
    }

    assert_eq!(sync.store().get(&p), Some(&p_profile));
    assert_eq!(sync.store().get(&q), Some(&q_profile));

    sync.flush_all().await;
    assert_eq!(world.stored_profile(&p).await, Some(p_profile));
    assert_eq!(world.stored_profile(&q).await, Some(q_profile));
}

#[tokio::test]
async fn test_persist_every_change_writes_immediately() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(ManagerConfig {
        persist_every_change: true,
        ..config()
    });
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;
    assert!(world.stored_bytes(&p).await.is_none());

    let profile = AudioProfile::current_default().with_volume(AudioCategory::Ui, 5);
    sync.set_profile(edit(&p, profile)).await;

    assert_eq!(world.stored_profile(&p).await, Some(profile));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[tokio::test]
async fn test_leave_after_edit_flushes_and_evicts() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    let profile = AudioProfile::current_default().with_volume(AudioCategory::Sfx, 77);
    sync.set_profile(edit(&p, profile)).await;
    assert!(world.stored_bytes(&p).await.is_none());

    assert!(sync.on_player_exit(&p).await);

    assert_eq!(world.stored_profile(&p).await, Some(profile));
    assert!(!sync.store().contains(&p));
    assert_eq!(sync.phase(&p), PlayerPhase::Unjoined);
}

#[tokio::test]
async fn test_save_profile_is_idempotent() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    assert!(sync.save_profile(&p).await);
    let first = world.stored_bytes(&p).await.unwrap();
    assert!(sync.save_profile(&p).await);
    let second = world.stored_bytes(&p).await.unwrap();

    assert_eq!(first, second);
    assert!(sync.store().contains(&p));
}

#[tokio::test]
async fn test_edit_after_leave_is_dropped() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;
    sync.on_player_exit(&p).await;

    let late = AudioProfile::current_default().with_volume(AudioCategory::Music, 1);
    assert!(!sync.set_profile(edit(&p, late)).await);
    assert!(!sync.save_profile(&p).await);

    assert!(sync.store().is_empty());
    assert_eq!(
        world.stored_profile(&p).await,
        Some(AudioProfile::current_default())
    );
}

// ============================================================================
// PLAYBACK
// ============================================================================

#[tokio::test]
async fn test_music_plays_at_profile_volume_and_pauses_on_focus() {
    let world = World::new();
    let song = world.register("song");
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    let profile = AudioProfile::current_default().with_volume(AudioCategory::Music, 30);
    sync.set_profile(edit(&p, profile)).await;

    let outcome = sync.play_audio(&PlayAudio {
        player: p.clone(),
        audio_handle_ref: song.clone(),
        category: AudioCategory::Music,
    });
    let PlayOutcome::Played { volume } = outcome else {
        panic!("expected the song to play, got {outcome:?}");
    };
    assert!((volume - 0.30).abs() < 1e-6);
    assert!((world.gizmos.volume(&song).unwrap() - 0.30).abs() < 1e-6);
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Playing));

    let surface = SurfaceId::new(SURFACE);
    assert_eq!(sync.on_focus_ui(&p, &surface), 1);
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Paused));

    assert_eq!(sync.on_unfocus_ui(&p, &surface), 1);
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Playing));
}

#[tokio::test]
async fn test_other_surfaces_leave_music_alone() {
    let world = World::new();
    let song = world.register("song");
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    sync.play_audio(&PlayAudio {
        player: p.clone(),
        audio_handle_ref: song.clone(),
        category: AudioCategory::Ambient,
    });

    assert_eq!(sync.on_focus_ui(&p, &SurfaceId::new("inventory")), 0);
    assert_eq!(world.gizmos.state(&song, &p), Some(GizmoState::Playing));
}

#[tokio::test]
async fn test_play_before_join_is_a_no_op() {
    let world = World::new();
    let song = world.register("song");
    let (mut sync, _tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");

    let outcome = sync.play_audio(&PlayAudio {
        player: p.clone(),
        audio_handle_ref: song.clone(),
        category: AudioCategory::Music,
    });

    assert_eq!(outcome, PlayOutcome::NotReady);
    assert!(sync.store().is_empty());
    assert_eq!(world.gizmos.state(&song, &p), None);
    assert_eq!(world.gizmos.volume(&song), Some(1.0));
}

#[tokio::test]
async fn test_unknown_handle_is_skipped() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    join(&mut sync, &mut tickets, &p).await;

    let outcome = sync.play_audio(&PlayAudio {
        player: p.clone(),
        audio_handle_ref: minstrel_core::domain::audio::AudioHandle::new("missing"),
        category: AudioCategory::Sfx,
    });
    assert_eq!(outcome, PlayOutcome::Skipped);
}

#[tokio::test]
async fn test_disconnected_client_does_not_block_join() {
    let world = World::new();
    let (mut sync, mut tickets) = world.synchronizer(config());
    let p = PlayerId::new("p");
    assert!(!world.clients.is_connected(&p));

    let profile = join(&mut sync, &mut tickets, &p).await;

    assert_eq!(profile, AudioProfile::current_default());
    assert!(sync.phase(&p).is_active());
    assert!(world
        .clients
        .send(&p, ClientMessage::SetProfile(edit(&p, profile)))
        .is_err());
}
