//! # Pipeline Loop Tests
//!
//! Runs the ingestion and render loops against scripted sources and a
//! recording panel. Intervals are shrunk to milliseconds and every loop is
//! stopped through its shutdown signal, so the tests terminate
//! deterministically without touching the network or a real panel.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use tide_panel_lib::display::MatrixPanel;
use tide_panel_lib::distribution::FetchError;
use tide_panel_lib::mailbox::LevelMailbox;
use tide_panel_lib::pipeline::{run_ingest, run_render, IngestError, LevelSource};
use tide_panel_lib::DiscreteLevel;

/// Panel double that records every frame it is asked to draw.
#[derive(Clone)]
struct RecordingPanel {
    dots: u8,
    frames: Arc<Mutex<Vec<Vec<(u8, u8)>>>>,
}

impl RecordingPanel {
    fn new(dots: u8) -> Self {
        Self {
            dots,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn frames(&self) -> Vec<Vec<(u8, u8)>> {
        self.frames.lock().unwrap().clone()
    }
}

impl MatrixPanel for RecordingPanel {
    fn resolution(&self) -> u8 {
        self.dots
    }

    fn draw_points(&mut self, points: &[(u8, u8)]) -> anyhow::Result<()> {
        self.frames.lock().unwrap().push(points.to_vec());
        Ok(())
    }

    fn draw_text(&mut self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Source that always yields the same level.
struct ConstSource(DiscreteLevel);

impl LevelSource for ConstSource {
    async fn current_level(&self) -> Result<DiscreteLevel, IngestError> {
        Ok(self.0)
    }
}

/// Source that fails every cycle, as if the station had no data.
struct FailingSource;

impl LevelSource for FailingSource {
    async fn current_level(&self) -> Result<DiscreteLevel, IngestError> {
        Err(FetchError::EmptySeries.into())
    }
}

#[tokio::test]
async fn ingest_publishes_the_discretized_level() {
    let mailbox = Arc::new(LevelMailbox::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_ingest(
        ConstSource(5),
        Arc::clone(&mailbox),
        Duration::from_millis(5),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(mailbox.take(), Some(5));
}

#[tokio::test]
async fn failed_cycles_leave_the_mailbox_untouched() {
    // Scenario: the fetch yields zero monthly collections. The loop must
    // log and carry on, and the previously published level must survive.
    let mailbox = Arc::new(LevelMailbox::new());
    mailbox.publish(3);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run_ingest(
        FailingSource,
        Arc::clone(&mailbox),
        Duration::from_millis(5),
        shutdown_rx,
    ));

    // Several failing cycles pass
    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(
        mailbox.take(),
        Some(3),
        "stale level must persist across failed ingestion cycles"
    );
}

#[tokio::test]
async fn ingest_failures_never_stop_the_loop() {
    let mailbox = Arc::new(LevelMailbox::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_ingest(
        FailingSource,
        Arc::clone(&mailbox),
        Duration::from_millis(2),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert!(
        !handle.is_finished(),
        "the ingestion loop must survive repeated failures"
    );

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn render_draws_nothing_before_the_first_ingest() {
    // Scenario: mailbox never written. The render loop idles and must not
    // issue a single draw call.
    let mailbox = Arc::new(LevelMailbox::new());
    let panel = RecordingPanel::new(8);
    let frames = panel.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_render(
        panel,
        Arc::clone(&mailbox),
        Duration::from_millis(5),
        Duration::from_millis(1),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(30)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    assert!(
        frames.frames().is_empty(),
        "no draw calls may be issued while the level is unknown"
    );
}

#[tokio::test]
async fn render_retains_the_level_after_draining_the_mailbox() {
    let mailbox = Arc::new(LevelMailbox::new());
    mailbox.publish(4);

    let panel = RecordingPanel::new(8);
    let frames = panel.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_render(
        panel,
        Arc::clone(&mailbox),
        Duration::from_millis(2),
        Duration::from_millis(1),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(40)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let frames = frames.frames();
    assert!(
        frames.len() >= 2,
        "a single publish must keep being redrawn, got {} frame(s)",
        frames.len()
    );
}

#[tokio::test]
async fn rendered_frames_respect_the_waterline() {
    // Level 2 on an 8-panel: the waterline sits at row 6, so no lit point
    // may appear in rows 0..6 no matter what the dithering does.
    let mailbox = Arc::new(LevelMailbox::new());
    mailbox.publish(2);

    let panel = RecordingPanel::new(8);
    let frames = panel.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(run_render(
        panel,
        Arc::clone(&mailbox),
        Duration::from_millis(2),
        Duration::from_millis(1),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(40)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let frames = frames.frames();
    assert!(!frames.is_empty());
    for frame in &frames {
        for &(column, row) in frame {
            assert!(
                row >= 6,
                "point ({column}, {row}) lit above the waterline for level 2"
            );
        }
    }
}

#[tokio::test]
async fn ingest_to_render_hand_off() {
    // Producer and consumer running together: the level published by the
    // ingestion loop ends up on the panel.
    let mailbox = Arc::new(LevelMailbox::new());
    let panel = RecordingPanel::new(8);
    let frames = panel.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ingest = tokio::spawn(run_ingest(
        ConstSource(8),
        Arc::clone(&mailbox),
        Duration::from_millis(5),
        shutdown_rx.clone(),
    ));
    let render = tokio::spawn(run_render(
        panel,
        Arc::clone(&mailbox),
        Duration::from_millis(2),
        Duration::from_millis(1),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).unwrap();
    ingest.await.unwrap();
    render.await.unwrap().unwrap();

    // Level 8 floods the panel; every frame should be busy
    let frames = frames.frames();
    assert!(!frames.is_empty(), "the published level must reach the panel");
    for frame in &frames {
        assert!(
            frame.len() > 8,
            "a full level should light well over one row, got {} points",
            frame.len()
        );
    }
}
