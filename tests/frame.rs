mod common;

use common::{fragile, init_tracing, logged, trimmer, Log, LogTransition, RecordingBackend};
use paging::{CacheMode, Frame, FrameHandle, FrameOptions, NavigationError, ScreenKey};
use parking_lot::Mutex;
use std::sync::Arc;

async fn frame_with(log: &Log, names: &[&'static str]) -> (Frame, Vec<ScreenKey>) {
    init_tracing();
    let frame = Frame::headless();
    frame.set_transition(Some(LogTransition::new(log)));
    for &name in names {
        assert!(frame.navigate(logged(name, log).0, None).await.unwrap());
    }
    log.take();
    let keys = frame.keys();
    (frame, keys)
}

#[tokio::test]
async fn backend_sees_visuals_input_and_back_button() {
    init_tracing();
    let log = Log::new();
    let backend = RecordingBackend { log: log.clone() };
    let options = FrameOptions {
        automatic_back_button: true,
        ..FrameOptions::default()
    };
    let frame = Frame::with_options(backend, options);

    frame.navigate(logged("A", &log).0, None).await.unwrap();
    let a = frame.current_record().unwrap().key();
    assert_eq!(
        log.take(),
        vec![
            "hit_test(false)".to_string(),
            "A.on_create".to_string(),
            "A.on_start".to_string(),
            "back_button(false)".to_string(),
            format!("insert(0, {})", a),
            "A.on_resume".to_string(),
            "hit_test(true)".to_string(),
        ]
    );

    frame.navigate(logged("B", &log).0, None).await.unwrap();
    let b = frame.current_record().unwrap().key();
    assert_eq!(
        log.take_matching("back_button"),
        vec!["back_button(true)".to_string()]
    );
    assert_eq!(frame.visuals(), vec![b]);

    frame.go_back().await.unwrap();
    let backend_calls: Vec<_> = log
        .take()
        .into_iter()
        .filter(|entry| !entry.starts_with('A') && !entry.starts_with('B'))
        .collect();
    assert_eq!(
        backend_calls,
        vec![
            "hit_test(false)".to_string(),
            "back_button(false)".to_string(),
            format!("remove({})", b),
            format!("insert(0, {})", a),
            "hit_test(true)".to_string(),
        ]
    );
}

#[tokio::test]
async fn transition_inserts_incoming_above_then_removes_outgoing() {
    init_tracing();
    let log = Log::new();
    let frame = Frame::new(RecordingBackend { log: log.clone() });
    frame.set_transition(Some(LogTransition::new(&log)));

    frame.navigate(logged("A", &log).0, None).await.unwrap();
    let a = frame.current_record().unwrap().key();
    frame.navigate(logged("B", &log).0, None).await.unwrap();
    let b = frame.current_record().unwrap().key();

    let visual_calls: Vec<_> = log
        .take()
        .into_iter()
        .filter(|entry| {
            entry.starts_with("insert") || entry.starts_with("remove") || entry == "<swap>"
        })
        .collect();
    assert_eq!(
        visual_calls,
        vec![
            format!("insert(0, {})", a),
            "<swap>".to_string(),
            format!("insert(1, {})", b),
            "<swap>".to_string(),
            format!("remove({})", a),
        ]
    );
}

#[tokio::test]
async fn move_to_top_renavigates_to_the_entry() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B", "C"]).await;

    assert!(frame.move_to_top(keys[0]).await.unwrap());
    assert_eq!(frame.keys(), vec![keys[1], keys[2], keys[0]]);
    assert_eq!(frame.current_index(), Some(2));
    assert_eq!(
        log.take(),
        vec!["C.on_pause", "A.on_start", "<swap>", "C.on_stop", "A.on_resume"]
    );

    // already on top
    assert!(frame.move_to_top(keys[0]).await.unwrap());
    assert!(log.take().is_empty());
}

#[tokio::test]
async fn move_to_top_of_unknown_key_does_nothing() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B"]).await;
    let other = Frame::headless();
    other.navigate(logged("X", &log).0, None).await.unwrap();
    let stranger = other.current_record().unwrap().key();
    log.take();

    assert!(!frame.move_to_top(stranger).await.unwrap());
    assert_eq!(frame.keys(), keys);
    assert!(log.take().is_empty());
}

#[tokio::test]
async fn move_to_top_rolls_back_when_the_screen_cannot_be_rebuilt() {
    init_tracing();
    let log = Log::new();
    let frame = Frame::headless();
    frame
        .navigate(fragile("A", &log, CacheMode::Disabled, 1), None)
        .await
        .unwrap();
    frame.navigate(logged("B", &log).0, None).await.unwrap();
    let keys = frame.keys();
    assert!(frame.entries()[0].is_released());
    log.take();

    let result = frame.move_to_top(keys[0]).await;
    assert!(matches!(result, Err(NavigationError::Factory { .. })));
    assert_eq!(frame.keys(), keys);
    assert_eq!(frame.current_index(), Some(1));
    assert_eq!(log.take(), vec!["B.on_pause", "B.on_resume"]);
    assert!(!frame.is_navigating());
}

#[tokio::test]
async fn move_to_top_renews_released_entries() {
    init_tracing();
    let log = Log::new();
    let frame = Frame::headless();
    frame.set_disable_cache(true);
    frame.navigate(logged("A", &log).0, None).await.unwrap();
    frame.navigate(logged("B", &log).0, None).await.unwrap();
    let keys = frame.keys();
    log.take();

    assert!(frame.move_to_top(keys[0]).await.unwrap());
    let moved = frame.keys();
    assert_eq!(moved.len(), 2);
    assert_eq!(moved[0], keys[1]);
    assert_ne!(moved[1], keys[0]);
    assert_eq!(
        log.take(),
        vec![
            "B.on_pause",
            "A.on_create",
            "A.on_start",
            "B.on_stop",
            "A.on_resume"
        ]
    );
}

#[tokio::test]
async fn clearing_the_forward_stack_waits_for_the_navigation() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B", "C"]).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handle = frame.handle();
    let lengths = Arc::clone(&seen);
    frame.on_navigating(move |_| {
        let frame = handle.upgrade().unwrap();
        frame.clear_forward_stack();
        lengths.lock().push(frame.entries().len());
    });

    assert!(frame.go_back().await.unwrap());
    assert_eq!(*seen.lock(), vec![3]);
    assert_eq!(frame.keys(), vec![keys[0], keys[1]]);
    assert!(!frame.can_go_forward());
}

#[tokio::test]
async fn clearing_the_back_stack_while_going_back_still_discards_the_popped_entry() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B", "C"]).await;

    let handle = frame.handle();
    frame.on_navigating(move |_| {
        if let Some(frame) = handle.upgrade() {
            frame.clear_back_stack();
        }
    });

    assert!(frame.go_back().await.unwrap());
    assert_eq!(frame.keys(), vec![keys[1]]);
    assert_eq!(frame.current_index(), Some(0));
    assert!(!frame.can_go_forward());
}

#[tokio::test]
async fn screens_may_trim_the_stack_while_being_created() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B"]).await;

    assert!(frame
        .navigate(trimmer("T", &log, "on_create", 0), None)
        .await
        .unwrap());

    let top = frame.current_record().unwrap().key();
    assert_eq!(frame.keys(), vec![keys[1], top]);
    assert_eq!(frame.current_index(), Some(1));
    assert_eq!(frame.visuals(), vec![top]);
    assert_eq!(
        log.take(),
        vec![
            "B.on_pause",
            "T.on_create",
            "T.remove_at(0) = Some(true)",
            "T.on_start",
            "<swap>",
            "B.on_stop",
            "T.on_resume"
        ]
    );
}

async fn frame_with_trimmer_on_top(log: &Log, index: usize) -> (Frame, Vec<ScreenKey>) {
    init_tracing();
    let frame = Frame::headless();
    frame.set_transition(Some(LogTransition::new(log)));
    frame.navigate(logged("A", log).0, None).await.unwrap();
    frame.navigate(logged("B", log).0, None).await.unwrap();
    frame
        .navigate(trimmer("C", log, "on_close", index), None)
        .await
        .unwrap();
    log.take();
    let keys = frame.keys();
    (frame, keys)
}

#[tokio::test]
async fn going_back_follows_the_target_when_entries_below_move() {
    let log = Log::new();
    let (frame, keys) = frame_with_trimmer_on_top(&log, 0).await;

    assert!(frame.go_back().await.unwrap());
    assert_eq!(frame.keys(), vec![keys[1]]);
    assert_eq!(frame.current_index(), Some(0));
    assert_eq!(frame.visuals(), vec![keys[1]]);
    assert_eq!(
        log.take(),
        vec![
            "C.on_close",
            "C.remove_at(0) = Some(true)",
            "B.on_restart",
            "<swap>",
            "C.on_destroy",
            "B.on_resume"
        ]
    );
}

#[tokio::test]
async fn going_back_to_a_removed_target_fails_without_committing() {
    let log = Log::new();
    let (frame, keys) = frame_with_trimmer_on_top(&log, 1).await;

    match frame.go_back().await {
        Err(NavigationError::TargetRemoved(key)) => assert_eq!(key, keys[1]),
        other => panic!("expected the target to be gone, got {:?}", other),
    }
    assert_eq!(frame.keys(), vec![keys[0], keys[2]]);
    assert_eq!(frame.current_index(), Some(1));
    assert_eq!(frame.visuals(), vec![keys[2]]);
    assert!(!frame.is_navigating());
    assert_eq!(
        log.take(),
        vec![
            "C.on_close",
            "C.remove_at(1) = Some(true)",
            "B.on_restart",
            "C.on_resume",
            "B.on_stop"
        ]
    );

    // A is still reachable
    assert!(frame.go_back().await.unwrap());
    assert_eq!(frame.keys(), vec![keys[0]]);
}

#[tokio::test]
async fn stack_administration() {
    let log = Log::new();
    let (frame, keys) = frame_with(&log, &["A", "B", "C", "D"]).await;

    assert!(matches!(
        frame.remove_at(3),
        Err(NavigationError::RemoveCurrent { index: 3 })
    ));
    assert!(!frame.remove_at(9).unwrap());

    assert!(frame.remove_at(1).unwrap());
    assert_eq!(frame.keys(), vec![keys[0], keys[2], keys[3]]);
    assert_eq!(frame.current_index(), Some(2));

    assert!(frame.remove(keys[0]).unwrap());
    assert!(!frame.remove(keys[0]).unwrap());
    assert_eq!(frame.current_index(), Some(1));

    frame.clear_back_stack();
    assert_eq!(frame.keys(), vec![keys[3]]);
    assert_eq!(frame.current_index(), Some(0));
    assert!(!frame.can_go_back());

    // nothing was shown or hidden
    assert!(log.take().is_empty());
}

#[tokio::test]
async fn find_nearest_scans_from_the_current_entry() {
    let log = Log::new();
    let (a, _) = logged("A", &log);
    let (b, _) = logged("B", &log);
    let frame = Frame::headless();
    frame.navigate(a.clone(), None).await.unwrap();
    frame.navigate(b, None).await.unwrap();
    frame.navigate(a.clone(), None).await.unwrap();
    let keys = frame.keys();

    assert_eq!(frame.find_nearest(&a).unwrap().key(), keys[2]);
    frame.go_back().await.unwrap();
    assert_eq!(frame.find_nearest(&a).unwrap().key(), keys[0]);
}

#[tokio::test]
async fn source_screen_type_navigates() {
    let log = Log::new();
    let (home, _) = logged("Home", &log);
    let frame = Frame::headless();
    assert!(frame.source_screen_type().is_none());

    assert!(frame.set_source_screen_type(home.clone()).await.unwrap());
    assert_eq!(frame.source_screen_type(), Some(home.clone()));
    assert_eq!(frame.current_record().unwrap().screen_type(), &home);
}

#[tokio::test]
async fn visibility_reaches_only_the_current_screen() {
    let log = Log::new();
    let (frame, _) = frame_with(&log, &["A", "B"]).await;
    let sender = frame.attach();
    assert!(frame.is_attached());

    sender.visibility_changed(false).unwrap();
    sender.visibility_changed(true).unwrap();
    assert!(log.take().is_empty());

    frame.poll();
    assert_eq!(
        log.take(),
        vec![
            "B.on_visibility_changed(false)",
            "B.on_pause",
            "B.on_visibility_changed(true)",
            "B.on_resume"
        ]
    );

    drop(sender);
    frame.poll();
    assert!(!frame.is_attached());
}

#[tokio::test]
async fn detaching_disconnects_the_sender() {
    let log = Log::new();
    let (frame, _) = frame_with(&log, &["A"]).await;
    let sender = frame.attach();
    frame.detach();
    assert!(sender.visibility_changed(true).is_err());
    frame.poll();
    assert!(log.take().is_empty());
}

#[tokio::test]
async fn finish_goes_back_or_closes_the_window() {
    init_tracing();
    let log = Log::new();
    let frame = Frame::new(RecordingBackend { log: log.clone() });
    let handle = frame.handle();
    frame.navigate(logged("A", &log).0, None).await.unwrap();
    frame.navigate(logged("B", &log).0, None).await.unwrap();
    log.take();

    assert!(handle.finish().await.unwrap());
    assert_eq!(frame.current_index(), Some(0));
    assert!(!log.take().contains(&"close".to_string()));

    assert!(handle.finish().await.unwrap());
    assert_eq!(log.take(), vec!["close"]);
    assert_eq!(frame.current_index(), Some(0));
}

#[tokio::test]
async fn handles_outliving_their_frame_are_detached() {
    let log = Log::new();
    let (a, _) = logged("A", &log);
    let frame = Frame::headless();
    let handle = frame.handle();
    assert!(handle.open(a.clone(), None).await.unwrap());
    assert_eq!(format!("{:?}", handle), "FrameHandle(attached)");

    drop(frame);
    assert!(handle.upgrade().is_none());
    assert!(!handle.can_go_back());
    assert!(matches!(
        handle.navigate(a, None).await,
        Err(NavigationError::Detached)
    ));
    assert!(matches!(
        FrameHandle::detached().go_back().await,
        Err(NavigationError::Detached)
    ));
}
