use anyhow::anyhow;

use pursuit_kernel::track::{
    ScriptedTracker, TrackComment, TrackPhase, TrackerConfig, TrackerReading, TrackerState,
};
use pursuit_kernel::{BoundingBox, Frame, PursuitConfig};

fn vga() -> Frame {
    Frame::filled(640, 480, 0)
}

fn hit() -> TrackerReading {
    TrackerReading::located(BoundingBox::new(200, 150, 60, 60), 0.95)
}

fn config(reinit: u64, max_missing: u64) -> TrackerConfig {
    TrackerConfig {
        reinit_interval_frames: reinit,
        max_frames_without_object: max_missing,
        ..TrackerConfig::default()
    }
}

#[test]
fn init_resets_both_anchors_to_current_frame() {
    let frame = vga();
    let script = (0..20)
        .map(|i| if i % 3 == 0 { Ok(hit()) } else { Ok(TrackerReading::missing()) })
        .collect();
    let mut state = TrackerState::new(ScriptedTracker::from_script(script), config(7, 100));

    for round in 0..5 {
        for _ in 0..round {
            state.update(&frame);
        }
        state.init(&frame, BoundingBox::new(10, 10, 20, 20));
        assert_eq!(state.last_seen_frame(), state.frame_count());
        assert_eq!(state.last_reinit_frame(), state.frame_count());
        assert_eq!(state.phase(), TrackPhase::Tracking);
    }
}

#[test]
fn goes_idle_exactly_after_max_missing_frames() {
    const K: u64 = 5;
    let frame = vga();
    let mut script = vec![Ok(hit())];
    script.extend((0..K + 1).map(|_| Ok(TrackerReading::missing())));
    let mut state = TrackerState::new(ScriptedTracker::from_script(script), config(1_000, K));

    state.init(&frame, BoundingBox::new(200, 150, 60, 60));
    assert!(state.update(&frame).skip_full_detection);

    for failure in 1..=K {
        let out = state.update(&frame);
        assert!(!out.skip_full_detection);
        assert!(state.is_tracking(), "went idle early at failure {}", failure);
    }
    state.update(&frame);
    assert_eq!(state.phase(), TrackPhase::Idle);
    assert_eq!(state.last_comment(), Some(TrackComment::Lost));
}

#[test]
fn tracker_errors_time_out_like_misses() {
    const K: u64 = 3;
    let frame = vga();
    let script = (0..10).map(|_| Err(anyhow!("tracker crashed"))).collect();
    let mut state = TrackerState::new(ScriptedTracker::from_script(script), config(1_000, K));
    state.init(&frame, BoundingBox::new(0, 0, 10, 10));
    for _ in 0..K {
        state.update(&frame);
        assert!(state.is_tracking());
    }
    state.update(&frame);
    assert!(!state.is_tracking());
}

#[test]
fn scheduled_reinit_fires_every_interval() {
    const R: u64 = 4;
    let frame = vga();
    let script = (0..40)
        .map(|i| match i % 5 {
            0 | 3 => Ok(TrackerReading::missing()),
            4 => Err(anyhow!("flaky")),
            _ => Ok(hit()),
        })
        .collect();
    let mut state = TrackerState::new(ScriptedTracker::from_script(script), config(R, 1_000));
    state.init(&frame, BoundingBox::new(200, 150, 60, 60));

    let mut fired = Vec::new();
    for _ in 0..24 {
        let out = state.update(&frame);
        if state.last_comment() == Some(TrackComment::ScheduledReinit) {
            assert!(!out.skip_full_detection);
            fired.push(state.frame_count());
        }
    }
    assert_eq!(fired, vec![4, 8, 12, 16, 20, 24]);
}

#[test]
fn reinit_schedule_restarts_from_manual_init() {
    let frame = vga();
    let mut state = TrackerState::new(ScriptedTracker::repeating(hit()), config(5, 1_000));
    state.init(&frame, BoundingBox::new(200, 150, 60, 60));
    for _ in 0..3 {
        state.update(&frame);
    }
    state.init(&frame, BoundingBox::new(200, 150, 60, 60));
    for _ in 0..4 {
        assert!(state.update(&frame).skip_full_detection);
    }
    assert!(!state.update(&frame).skip_full_detection);
    assert_eq!(state.last_reinit_frame(), 8);
}

#[test]
fn oversized_boxes_are_never_returned() {
    let frame = vga();
    let wide = TrackerReading::located(BoundingBox::new(0, 0, 487, 100), 1.0);
    let tall = TrackerReading::located(BoundingBox::new(0, 0, 100, 365), 1.0);
    let mut state = TrackerState::new(
        ScriptedTracker::from_script(vec![Ok(wide), Ok(tall)]),
        config(1_000, 1_000),
    );
    state.init(&frame, BoundingBox::new(0, 0, 10, 10));

    for _ in 0..2 {
        let out = state.update(&frame);
        assert!(out.bbox.is_none());
        assert!(!out.skip_full_detection);
        assert_eq!(state.last_comment(), Some(TrackComment::Diverged));
    }
}

#[test]
fn box_at_three_quarters_is_still_accepted() {
    let frame = vga();
    let edge = TrackerReading::located(BoundingBox::new(0, 0, 480, 360), 0.9);
    let mut state = TrackerState::new(ScriptedTracker::repeating(edge), config(1_000, 1_000));
    state.init(&frame, BoundingBox::new(0, 0, 10, 10));
    assert_eq!(state.update(&frame).bbox, Some(edge.bbox));
}

#[test]
fn score_exactly_at_threshold_is_accepted() {
    let frame = vga();
    let borderline = TrackerReading::located(BoundingBox::new(5, 5, 20, 20), 0.6);
    let mut state = TrackerState::new(ScriptedTracker::repeating(borderline), config(1_000, 1_000));
    state.init(&frame, BoundingBox::new(5, 5, 20, 20));
    assert!(state.update(&frame).skip_full_detection);
}

#[test]
fn lost_after_forty_silent_frames() {
    let frame = vga();
    let mut state = TrackerState::new(ScriptedTracker::from_script(Vec::new()), config(30, 40));

    // frame 1: idle, then seeded from a detection
    assert!(!state.update(&frame).skip_full_detection);
    state.init(&frame, BoundingBox::new(100, 100, 50, 50));
    assert_eq!(state.last_seen_frame(), 1);

    for frame_no in 2..=41u64 {
        state.update(&frame);
        assert_eq!(state.frame_count(), frame_no);
        assert!(state.is_tracking(), "idle too early at frame {}", frame_no);
    }

    let out = state.update(&frame);
    assert_eq!(state.frame_count(), 42);
    assert_eq!(state.phase(), TrackPhase::Idle);
    assert!(!out.skip_full_detection);

    for _ in 43..50 {
        let out = state.update(&frame);
        assert!(!out.skip_full_detection);
        assert!(out.bbox.is_none());
    }
}

#[test]
fn unbounded_intervals_never_fire() {
    let frame = vga();
    let cfg = PursuitConfig {
        tracker: TrackerConfig {
            reinit_interval_frames: u64::MAX,
            max_frames_without_object: u64::MAX,
            ..TrackerConfig::default()
        },
        ..PursuitConfig::default()
    };
    cfg.validate().unwrap();

    let mut state = TrackerState::new(ScriptedTracker::repeating(hit()), cfg.tracker);
    state.update(&frame);
    state.init(&frame, BoundingBox::new(200, 150, 60, 60));
    for _ in 0..10 {
        assert!(state.update(&frame).skip_full_detection);
    }

    let mut silent = TrackerState::new(ScriptedTracker::from_script(Vec::new()), cfg.tracker);
    silent.init(&frame, BoundingBox::new(200, 150, 60, 60));
    for _ in 0..100 {
        silent.update(&frame);
    }
    assert!(silent.is_tracking());
    assert_eq!(silent.last_comment(), Some(TrackComment::Missing));
}
