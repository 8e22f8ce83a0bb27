//! The timer-driven render loop.
//!
//! Runs on the caller's thread, independent of ingestion: every tick it
//! takes whatever record is newest, draws it and sleeps until the next tick.

use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::backend::Backend;
use tracing::{info, warn};

use crate::app::App;
use crate::data::DashboardFrame;
use crate::shutdown::Shutdown;
use crate::ui::Screen;

/// Longest single sleep, so shutdown is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Why the render loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Shutdown was requested (Ctrl+C).
    Interrupted,
    /// The telemetry source ended and its last record was drawn.
    SourceClosed,
    /// The telemetry source ended and reported why, e.g. a non-zero exit.
    SourceFailed,
}

impl ExitReason {
    pub fn exit_code(&self) -> u8 {
        match self {
            ExitReason::Interrupted | ExitReason::SourceClosed => 0,
            ExitReason::SourceFailed => 1,
        }
    }
}

/// Draw frames until shutdown or until the source closes, then restore the
/// screen. The screen is restored on error as well.
pub fn run_dashboard<B: Backend>(
    screen: &mut Screen<B>,
    app: &mut App,
    shutdown: &Shutdown,
    refresh: Duration,
) -> Result<ExitReason> {
    let result = render_loop(screen, app, shutdown, refresh);
    let restored = screen.restore();

    let reason = result?;
    restored?;
    info!(?reason, frames = app.frames_built, "render loop finished");
    Ok(reason)
}

fn render_loop<B: Backend>(
    screen: &mut Screen<B>,
    app: &mut App,
    shutdown: &Shutdown,
    refresh: Duration,
) -> Result<ExitReason> {
    if !app.reload_data() {
        app.ensure_header();
    }
    screen.draw(app)?;

    loop {
        if shutdown.is_triggered() {
            return Ok(ExitReason::Interrupted);
        }

        if app.reload_data() {
            screen.draw(app)?;
        }

        if app.is_finished() {
            return Ok(match app.source_error() {
                Some(err) => {
                    warn!(error = err, "telemetry source ended with an error");
                    ExitReason::SourceFailed
                }
                None => ExitReason::SourceClosed,
            });
        }

        pace(refresh, shutdown);
    }
}

/// Sleep for `interval`, waking early if shutdown fires.
fn pace(interval: Duration, shutdown: &Shutdown) {
    let deadline = Instant::now() + interval;
    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.is_triggered() {
            return;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

/// Wait for the first record and return the frame built from it.
///
/// `None` if the source closes or shutdown fires first.
pub fn first_frame(app: &mut App, shutdown: &Shutdown, poll: Duration) -> Option<DashboardFrame> {
    loop {
        if app.reload_data() {
            return app.frame.clone();
        }
        if app.is_finished() || shutdown.is_triggered() {
            return None;
        }
        pace(poll, shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{test_app, test_app_with};
    use crate::source::SampleRecord;
    use crate::ui::screen::tests::CursorCounting;
    use std::thread;

    const TICK: Duration = Duration::from_millis(10);

    fn screen() -> Screen<CursorCounting> {
        Screen::new(CursorCounting::new(72, 22)).unwrap()
    }

    fn screen_text(screen: &Screen<CursorCounting>) -> String {
        screen
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_interrupt_restores_once_and_exits_zero() {
        let (_tx, mut app) = test_app();
        let mut screen = screen();
        let shutdown = Shutdown::new();

        let trigger = shutdown.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.trigger();
        });

        let reason = run_dashboard(&mut screen, &mut app, &shutdown, TICK).unwrap();
        handle.join().unwrap();

        assert_eq!(reason, ExitReason::Interrupted);
        assert_eq!(reason.exit_code(), 0);
        assert_eq!(screen.backend().shown, 1);
        // A second restore does not touch the terminal again
        assert!(!screen.restore().unwrap());
        assert_eq!(screen.backend().shown, 1);
    }

    #[test]
    fn test_source_close_draws_final_record() {
        let (tx, mut app) = test_app();
        let mut screen = screen();

        tx.send_replace(Some(SampleRecord::new("CPU Power: 1500 mW\n")));
        tx.send_replace(Some(SampleRecord::new("CPU Power: 2500 mW\n")));
        drop(tx);

        let reason = run_dashboard(&mut screen, &mut app, &Shutdown::new(), TICK).unwrap();
        assert_eq!(reason, ExitReason::SourceClosed);
        assert_eq!(reason.exit_code(), 0);

        // Only the newest record was drawn
        assert_eq!(app.frames_built, 1);
        assert!(screen_text(&screen).contains("2.50 W"));
        assert_eq!(screen.backend().shown, 1);
    }

    #[test]
    fn test_waiting_frame_then_data() {
        let (tx, mut app) = test_app();
        let mut screen = screen();
        let shutdown = Shutdown::new();

        let producer = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                tx.send_replace(Some(SampleRecord::new("GPU Power: 800 mW\n")));
                thread::sleep(Duration::from_millis(50));
                shutdown.trigger();
            })
        };

        let reason = run_dashboard(&mut screen, &mut app, &shutdown, TICK).unwrap();
        producer.join().unwrap();

        assert_eq!(reason, ExitReason::Interrupted);
        assert_eq!(app.frames_built, 1);
        assert!(screen_text(&screen).contains("0.80 W"));
    }

    /// A source that has already stopped with a diagnostic.
    #[derive(Debug)]
    struct FailedSource;

    impl crate::source::RecordSource for FailedSource {
        fn poll(&mut self) -> Option<SampleRecord> {
            None
        }

        fn description(&self) -> &str {
            "failing source"
        }

        fn error(&self) -> Option<&str> {
            Some("must be invoked as the superuser (exit status: 1)")
        }

        fn is_closed(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_failed_source_exits_nonzero() {
        let mut app = test_app_with(Box::new(FailedSource));
        let mut screen = screen();

        let reason = run_dashboard(&mut screen, &mut app, &Shutdown::new(), TICK).unwrap();
        assert_eq!(reason, ExitReason::SourceFailed);
        assert_eq!(reason.exit_code(), 1);
        assert_eq!(screen.backend().shown, 1);
        assert!(screen_text(&screen).contains("superuser"));
    }

    #[test]
    fn test_first_frame() {
        let (tx, mut app) = test_app();
        tx.send_replace(Some(SampleRecord::new("CPU Power: 1500 mW\n")));

        let frame = first_frame(&mut app, &Shutdown::new(), TICK).unwrap();
        assert_eq!(frame.telemetry.power.combined_watts(), 1.5);
    }

    #[test]
    fn test_first_frame_gives_up_on_close_or_shutdown() {
        let (tx, mut app) = test_app();
        drop(tx);
        assert!(first_frame(&mut app, &Shutdown::new(), TICK).is_none());

        let (_tx, mut app) = test_app();
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(first_frame(&mut app, &shutdown, TICK).is_none());
    }
}
