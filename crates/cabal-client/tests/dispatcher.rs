mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cabal_client::{
    Action, BackendError, ClientConfig, ClientError, MemoryBackend, MessageType, Screen,
    StateEvent,
};
use cabal_shared::Address;
use cabal_store::{CabalSettings, StateStore};

use common::{entry, Harness, RecordingHost};

fn notifying() -> CabalSettings {
    CabalSettings {
        enable_notifications: true,
        alias: String::new(),
    }
}

#[tokio::test]
async fn test_new_cabal_joins_default_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());

    let addr = h.add("alice").await;

    let session = h.dispatcher.sessions().get(&addr).unwrap();
    assert!(session.ready);
    assert_eq!(session.username, "alice");
    assert_eq!(session.view.channel, "default");
    assert_eq!(session.view.channels(), ["default"]);
    assert_eq!(h.dispatcher.sessions().current(), Some(&addr));

    let local: Vec<_> = session.view.users().values().filter(|u| u.local).collect();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].name.as_deref(), Some("alice"));
    assert!(local[0].online);

    assert!(h.store(&addr).is_watching("default"));

    let saved = StateStore::new(dir.path()).read().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].addr, addr);
    assert_eq!(saved[0].username, "alice");

    let events = h.ui_events();
    assert!(events.iter().any(|e| matches!(e, StateEvent::AddCabal(s) if s.addr == addr)));
    assert!(events
        .iter()
        .any(|e| matches!(e, StateEvent::ViewCabal { channel, .. } if channel == "default")));
}

#[tokio::test]
async fn test_invite_input_and_existing_cabal() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let known = Address::from_bytes(&[5; 32]);

    let addr = h
        .dispatcher
        .add_session(None, Some(format!("cabal://{known}/")), None, None)
        .await
        .unwrap();
    assert_eq!(addr, known);
    assert_eq!(
        h.dispatcher.sessions().get(&known).unwrap().username,
        "conspirator"
    );

    let again = h
        .dispatcher
        .add_session(Some(known.clone()), None, Some("bob".into()), None)
        .await
        .unwrap();
    assert_eq!(again, known);
    assert_eq!(h.dispatcher.sessions().len(), 1);
    assert_eq!(h.dispatcher.sessions().get(&known).unwrap().username, "bob");

    let fresh = h
        .dispatcher
        .add_session(None, Some("not an invite".into()), None, None)
        .await
        .unwrap();
    assert_ne!(fresh, known);
    assert_eq!(h.dispatcher.sessions().len(), 2);
}

#[tokio::test]
async fn test_channel_cycling_wraps() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;

    let store = h.store(&addr);
    store.inject_channel("random");
    store.inject_channel("zebra");
    h.pump().await;

    let channel = |h: &Harness| h.dispatcher.sessions().get(&addr).unwrap().view.channel.clone();
    assert_eq!(
        h.dispatcher.sessions().get(&addr).unwrap().view.channels(),
        ["default", "random", "zebra"]
    );

    h.dispatcher.view_next_channel(&addr).await.unwrap();
    assert_eq!(channel(&h), "random");
    h.dispatcher
        .dispatch(Action::ViewNextChannel { addr: addr.clone() })
        .await
        .unwrap();
    assert_eq!(channel(&h), "zebra");
    h.dispatcher.view_next_channel(&addr).await.unwrap();
    assert_eq!(channel(&h), "default");
    h.dispatcher.view_previous_channel(&addr).await.unwrap();
    assert_eq!(channel(&h), "zebra");

    h.dispatcher.leave_channel(&addr, "zebra").unwrap();
    assert_eq!(
        h.dispatcher.sessions().get(&addr).unwrap().view.channels().len(),
        3
    );
}

#[tokio::test]
async fn test_fetch_replaces_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;

    let store = h.store(&addr);
    store.inject_message(entry("feed-a", "default", 1, "one"));
    store.inject_message(entry("feed-a", "default", 2, "two"));
    store.inject_message(entry("feed-a", "default", 3, "three"));

    for _ in 0..2 {
        h.dispatcher
            .fetch_recent_messages(&addr, "default", 100)
            .await
            .unwrap();
        let messages = h.dispatcher.sessions().get(&addr).unwrap().view.messages("default");
        let texts: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(messages[0].author.as_deref(), Some("conspirator"));
    }

    h.dispatcher
        .fetch_recent_messages(&addr, "default", 2)
        .await
        .unwrap();
    let messages = h.dispatcher.sessions().get(&addr).unwrap().view.messages("default");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "two");
}

#[tokio::test]
async fn test_unread_counters_and_badge() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let a = h.add("alice").await;
    let b = h.add("bob").await;
    h.pump().await;

    // `a` is not current, so its current channel still counts.
    h.store(&a)
        .inject_message(entry("feed-x", "default", 10, "hi a"));
    h.pump().await;
    let view = &h.dispatcher.sessions().get(&a).unwrap().view;
    assert_eq!(view.unread("default"), 1);
    assert_eq!(view.all_unread(), 1);
    assert_eq!(h.host.last_badge(), Some(1));

    h.store(&b).inject_channel("random");
    h.pump().await;
    h.store(&b)
        .inject_message(entry("feed-y", "random", 11, "hi b"));
    h.pump().await;
    assert_eq!(h.dispatcher.sessions().get(&b).unwrap().view.unread("random"), 1);
    assert_eq!(h.host.last_badge(), Some(2));

    h.dispatcher.view_channel(&b, "random").await.unwrap();
    let view = &h.dispatcher.sessions().get(&b).unwrap().view;
    assert_eq!(view.unread("random"), 0);
    assert_eq!(view.all_unread(), 0);
    assert_eq!(h.host.last_badge(), Some(1));

    // Current channel of the current cabal: shown, not counted.
    h.ui_events();
    h.store(&b)
        .inject_message(entry("feed-y", "random", 12, "seen"));
    h.pump().await;
    assert_eq!(h.dispatcher.sessions().get(&b).unwrap().view.unread("random"), 0);
    let events = h.ui_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StateEvent::UpdateCabal(u)
            if u.messages.as_ref().and_then(|m| m.last()).map(|m| m.content.as_str()) == Some("seen")
    )));

    h.dispatcher.update_app_icon_badge(Some(7));
    assert_eq!(h.host.last_badge(), Some(7));
    assert_eq!(
        h.ui_events(),
        vec![StateEvent::UpdateWindowBadge { badge_count: 7 }]
    );
}

#[tokio::test]
async fn test_zero_badge_recomputes_total() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let a = h.add("alice").await;
    let _b = h.add("bob").await;
    h.pump().await;

    h.store(&a)
        .inject_message(entry("feed-x", "default", 10, "one"));
    h.store(&a)
        .inject_message(entry("feed-x", "default", 11, "two"));
    h.pump().await;
    assert_eq!(h.host.last_badge(), Some(2));
    h.ui_events();

    h.dispatcher.update_app_icon_badge(Some(0));
    assert_eq!(h.host.last_badge(), Some(2));
    assert_eq!(
        h.ui_events(),
        vec![StateEvent::UpdateWindowBadge { badge_count: 2 }]
    );
}

#[tokio::test]
async fn test_notifications_only_when_unfocused() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h
        .dispatcher
        .add_session(None, None, Some("alice".into()), Some(notifying()))
        .await
        .unwrap();
    h.pump().await;

    let store = h.store(&addr);
    store.inject_user("feed-c", Some("carol"));
    h.pump().await;
    store.inject_message(entry("feed-c", "default", 5, "ping"));
    h.pump().await;

    let notes = h.host.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "carol");
    assert_eq!(notes[0].body, "ping");
    assert_eq!(
        notes[0].on_click(),
        Action::ViewCabal {
            addr: addr.clone(),
            channel: Some("default".into())
        }
    );

    h.host.focused.store(true, Ordering::SeqCst);
    store.inject_message(entry("feed-c", "default", 6, "pong"));
    h.pump().await;
    assert_eq!(h.host.notifications().len(), 1);
}

#[tokio::test]
async fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = {
        let mut h = Harness::new(dir.path());
        let a = h.add("alice").await;
        let b = h
            .dispatcher
            .add_session(
                None,
                None,
                Some("bob".into()),
                Some(CabalSettings {
                    enable_notifications: true,
                    alias: "work".into(),
                }),
            )
            .await
            .unwrap();
        (a, b)
    };

    let mut h = Harness::new(dir.path());
    assert_eq!(h.dispatcher.load_from_disk().await.unwrap(), 2);

    let addrs: Vec<_> = h.dispatcher.sessions().iter().map(|s| s.addr.clone()).collect();
    assert_eq!(addrs, vec![a.clone(), b.clone()]);

    let bob = h.dispatcher.sessions().get(&b).unwrap();
    assert!(bob.ready);
    assert_eq!(bob.username, "bob");
    assert_eq!(bob.settings.alias, "work");
    assert!(bob.settings.enable_notifications);
    assert_eq!(h.dispatcher.sessions().get(&a).unwrap().username, "alice");

    let events = h.ui_events();
    assert_eq!(
        events.last(),
        Some(&StateEvent::ChangeScreen {
            screen: Screen::Main,
            addr: None
        })
    );
}

#[tokio::test]
async fn test_load_from_empty_dir_shows_add_screen() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(&dir.path().join("v1"));

    assert_eq!(h.dispatcher.load_from_disk().await.unwrap(), 0);
    assert!(h.dispatcher.sessions().is_empty());
    assert_eq!(
        h.ui_events(),
        vec![StateEvent::ChangeScreen {
            screen: Screen::AddCabal,
            addr: None
        }]
    );
}

#[tokio::test]
async fn test_remove_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let a = h.add("alice").await;
    let b = h.add("bob").await;
    let conn = h.store(&a).inject_peer("peer-1");
    h.pump().await;

    h.host.refuse.store(true, Ordering::SeqCst);
    assert!(!h.dispatcher.remove_session(&a).await.unwrap());
    assert_eq!(h.dispatcher.sessions().len(), 2);
    let prompts = h.host.prompts.lock().unwrap().clone();
    assert_eq!(
        prompts[0],
        format!(
            "Are you sure you want to remove this cabal ({}...) from Cabal Desktop?",
            a.short()
        )
    );

    h.host.refuse.store(false, Ordering::SeqCst);
    h.ui_events();
    assert!(h.dispatcher.remove_session(&a).await.unwrap());
    assert!(!conn.is_attached());
    assert!(!h.store(&a).is_watching("default"));
    assert_eq!(
        h.ui_events(),
        vec![
            StateEvent::DeleteCabal { addr: a.clone() },
            StateEvent::ViewCabal {
                addr: b.clone(),
                channel: "default".into()
            },
        ]
    );
    assert_eq!(h.dispatcher.sessions().current(), Some(&b));

    // Late events from the removed cabal are ignored.
    h.store(&a).inject_channel("late");
    h.pump().await;

    h.dispatcher.confirm_remove_session(&b).await.unwrap();
    assert_eq!(
        h.ui_events(),
        vec![
            StateEvent::DeleteCabal { addr: b.clone() },
            StateEvent::ChangeScreen {
                screen: Screen::AddCabal,
                addr: None
            },
        ]
    );
    assert!(StateStore::new(dir.path()).read().await.is_empty());
}

#[tokio::test]
async fn test_peer_presence() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;
    h.pump().await;
    let store = h.store(&addr);

    store.inject_peer("peer-1");
    h.pump().await;
    let users = h.dispatcher.sessions().get(&addr).unwrap().view.users();
    assert!(users["peer-1"].online);

    store.drop_peer("peer-1");
    store.drop_peer("ghost");
    h.pump().await;
    let users = h.dispatcher.sessions().get(&addr).unwrap().view.users();
    assert!(!users["peer-1"].online);
    assert!(!users.contains_key("ghost"));
}

#[tokio::test]
async fn test_user_updates_merge() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;
    h.pump().await;
    let store = h.store(&addr);
    let name = |h: &Harness| {
        h.dispatcher.sessions().get(&addr).unwrap().view.users()["feed-b"]
            .name
            .clone()
    };

    store.inject_user("feed-b", None);
    h.pump().await;
    assert_eq!(name(&h).as_deref(), Some("conspirator"));

    store.inject_user("feed-b", Some("dana"));
    h.pump().await;
    assert_eq!(name(&h).as_deref(), Some("dana"));

    store.inject_user("feed-b", None);
    h.pump().await;
    assert_eq!(name(&h).as_deref(), Some("dana"));

    let local: Vec<_> = h
        .dispatcher
        .sessions()
        .get(&addr)
        .unwrap()
        .view
        .users()
        .values()
        .filter(|u| u.local)
        .map(|u| u.key.clone())
        .collect();
    assert_eq!(local, vec![store.local_feed_key().to_string()]);
}

#[tokio::test]
async fn test_composer_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;
    h.pump().await;
    let store = h.store(&addr);

    h.dispatcher.submit_input(&addr, "/nick zed").await.unwrap();
    {
        let session = h.dispatcher.sessions().get(&addr).unwrap();
        assert_eq!(session.username, "zed");
        let last = session.view.messages("default").last().unwrap();
        assert_eq!(last.content, "Nick set to: zed");
        assert_eq!(last.kind, MessageType::LocalSystem);
    }

    h.dispatcher.submit_input(&addr, "/join dev").await.unwrap();
    assert_eq!(h.dispatcher.sessions().get(&addr).unwrap().view.channel, "dev");

    h.dispatcher.submit_input(&addr, "hello everyone").await.unwrap();
    h.dispatcher.submit_input(&addr, "/me waves").await.unwrap();
    let entries = store.entries("dev");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "hello everyone");
    assert_eq!(entries[0].kind, MessageType::Text);
    assert_eq!(entries[0].key, store.local_feed_key());
    assert_eq!(entries[1].kind, MessageType::Emote);

    h.dispatcher
        .submit_input(&addr, "/topic rust things")
        .await
        .unwrap();
    assert_eq!(store.topic("dev").as_deref(), Some("rust things"));
    assert_eq!(
        h.dispatcher.sessions().get(&addr).unwrap().view.topic("dev"),
        Some("rust things")
    );

    h.dispatcher.submit_input(&addr, "/bogus").await.unwrap();
    let last = h
        .dispatcher
        .sessions()
        .get(&addr)
        .unwrap()
        .view
        .messages("dev")
        .last()
        .unwrap()
        .content
        .clone();
    assert_eq!(last, "Unknown command: /bogus");

    h.dispatcher.submit_input(&addr, "   ").await.unwrap();
    assert_eq!(store.entries("dev").len(), 2);
    assert_eq!(h.dispatcher.list_commands().len(), 5);
}

#[tokio::test]
async fn test_topic_on_background_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = h.add("alice").await;
    h.pump().await;

    h.dispatcher.join_channel(&addr, "dev").await.unwrap();
    h.dispatcher.view_channel(&addr, "default").await.unwrap();
    h.ui_events();

    h.dispatcher
        .set_channel_topic(&addr, "dev", "rust")
        .await
        .unwrap();

    let events = h.ui_events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, StateEvent::UpdateCabal(u) if u.messages.is_some())));
    assert!(!events
        .iter()
        .any(|e| matches!(e, StateEvent::UpdateTopic { .. })));

    let view = &h.dispatcher.sessions().get(&addr).unwrap().view;
    assert_eq!(view.channel, "default");
    assert_eq!(view.topic("dev"), Some("rust"));
    let last = view.messages("dev").last().unwrap();
    assert_eq!(last.content, "Topic set to: rust");
    assert_eq!(last.kind, MessageType::LocalSystem);
    assert!(!view
        .messages("default")
        .iter()
        .any(|m| m.content == "Topic set to: rust"));
    assert_eq!(h.store(&addr).topic("dev").as_deref(), Some("rust"));

    // The same notice on the channel in view reaches the UI.
    h.dispatcher
        .set_channel_topic(&addr, "default", "general")
        .await
        .unwrap();
    let events = h.ui_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StateEvent::UpdateCabal(u)
            if u.messages.as_ref().and_then(|m| m.last()).map(|m| m.content.as_str())
                == Some("Topic set to: general")
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, StateEvent::UpdateTopic { topic, .. } if topic == "general")));
}

#[tokio::test]
async fn test_missing_local_key_skips_default_join() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = Address::from_bytes(&[11; 32]);
    h.backend.withhold_local_key(&addr);

    let result = h
        .dispatcher
        .add_session(Some(addr.clone()), None, Some("alice".into()), None)
        .await;
    assert!(matches!(
        result,
        Err(ClientError::Backend(BackendError::NotFound(_)))
    ));

    let session = h.dispatcher.sessions().get(&addr).unwrap();
    assert!(session.ready);
    assert!(session.view.channels().is_empty());
    assert!(session.view.local_key().is_none());
    assert!(!h.store(&addr).is_watching("default"));

    // Directory updates still flow while the own key is unknown.
    h.ui_events();
    h.store(&addr).inject_user("feed-z", Some("zoe"));
    h.pump().await;
    let session = h.dispatcher.sessions().get(&addr).unwrap();
    assert!(session.view.users().contains_key("feed-z"));
    assert!(h
        .ui_events()
        .iter()
        .any(|e| matches!(e, StateEvent::UpdateCabal(u) if u.users.is_some())));

    h.dispatcher.join_channel(&addr, "default").await.unwrap();
    assert!(h.store(&addr).is_watching("default"));
}

#[tokio::test]
async fn test_broken_store_stays_unready() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::new(dir.path());
    let addr = Address::from_bytes(&[9; 32]);
    h.backend.break_store(&addr);

    let result = h
        .dispatcher
        .add_session(Some(addr.clone()), None, None, None)
        .await;
    assert!(matches!(
        result,
        Err(ClientError::Backend(BackendError::NotReady(_)))
    ));

    let session = h.dispatcher.sessions().get(&addr).unwrap();
    assert!(!session.ready);

    h.store(&addr).inject_channel("random");
    h.pump().await;
    assert!(h
        .dispatcher
        .sessions()
        .get(&addr)
        .unwrap()
        .view
        .channels()
        .is_empty());

    let fetched = h
        .dispatcher
        .fetch_recent_messages(&addr, "default", 100)
        .await;
    assert!(matches!(fetched, Err(ClientError::NotReady(_))));

    let saved = StateStore::new(dir.path()).read().await;
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn test_spawned_client_handles_actions() {
    let dir = tempfile::tempdir().unwrap();
    let mut handle = cabal_client::spawn(
        ClientConfig::with_data_dir(dir.path()),
        Arc::new(MemoryBackend::new()),
        Arc::new(RecordingHost::default()),
    );

    handle.actions.send(Action::LoadFromDisk).unwrap();
    assert_eq!(
        handle.events.recv().await,
        Some(StateEvent::ChangeScreen {
            screen: Screen::AddCabal,
            addr: None
        })
    );

    handle.actions.send(Action::ShowEmojiPicker).unwrap();
    assert_eq!(handle.events.recv().await, Some(StateEvent::ShowEmojiPicker));

    drop(handle.actions);
    handle.task.await.unwrap();
}
