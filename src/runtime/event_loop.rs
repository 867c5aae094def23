use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::{App, RunState};
use crate::batch::BatchWorker;
use crate::config;
use crate::convert::ConversionChain;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Handed to the worker when the batch starts; a chain runs at most once.
    chain: Option<ConversionChain>,
    worker: Option<BatchWorker>,
}

impl EventLoopState {
    pub fn new(chain: ConversionChain) -> Self {
        Self {
            chain: Some(chain),
            worker: None,
        }
    }
}

/// Main terminal event loop: drains worker events, draws, handles input.
/// Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    loop {
        pump_worker(app, state);

        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Spawn the worker if the app is ready to run.
pub fn start_batch(app: &mut App, state: &mut EventLoopState) {
    if !app.can_start() {
        return;
    }
    let Some(chain) = state.chain.take() else {
        return;
    };
    app.start();
    info!(files = app.files.len(), destination = %app.output.display(), "starting batch");
    state.worker = Some(BatchWorker::spawn(
        app.files.clone(),
        chain,
        app.output.clone(),
    ));
}

/// Apply every queued worker event; reap the worker once the run is over.
fn pump_worker(app: &mut App, state: &mut EventLoopState) {
    if let Some(worker) = &state.worker {
        for ev in worker.drain() {
            app.apply(ev);
        }
        if app.state == RunState::Completed {
            worker.join();
            state.worker = None;
        }
    }
}

/// Cancel a running batch and wait for the worker to finish its current file.
pub fn shutdown(app: &mut App, state: &mut EventLoopState) {
    let Some(worker) = state.worker.take() else {
        return;
    };
    if app.request_cancel() {
        worker.cancel();
        info!("cancellation requested on quit");
    }
    while let Some(ev) = worker.recv() {
        app.apply(ev);
    }
    worker.join();
}

fn request_cancel(app: &mut App, state: &EventLoopState) {
    if app.request_cancel() {
        if let Some(worker) = &state.worker {
            worker.cancel();
        }
        info!("cancellation requested");
    }
}

/// Handle a single key press. Returns `true` when the app should exit.
fn handle_key_event(key: KeyEvent, app: &mut App, state: &mut EventLoopState) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        shutdown(app, state);
        return true;
    }

    match key.code {
        KeyCode::Char('q') => {
            shutdown(app, state);
            return true;
        }
        KeyCode::Enter | KeyCode::Char('s') => start_batch(app, state),
        KeyCode::Esc if app.summary_window => app.toggle_summary_window(),
        KeyCode::Char('c') | KeyCode::Esc => request_cancel(app, state),
        KeyCode::Char('f') => app.toggle_summary_window(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('g') => app.follow_progress_on(),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::AudioFormat;
    use crate::convert::tests::{Behavior, FakeConverter, chain_of};
    use crate::library::SourceFile;
    use std::fs;
    use tempfile::tempdir;

    fn press(c: KeyCode) -> KeyEvent {
        KeyEvent::new(c, KeyModifiers::NONE)
    }

    fn setup(names: &[&str]) -> (tempfile::TempDir, App, EventLoopState) {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let files = names
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                fs::write(&p, b"ogg bytes").unwrap();
                SourceFile::new(p, 9)
            })
            .collect();
        let app = App::new(files, dir.path().to_path_buf(), out);
        let chain = chain_of(vec![FakeConverter::new(
            "fake-mp3",
            Some(AudioFormat::Mp3),
            Behavior::Write(b"ID3"),
        )]);
        (dir, app, EventLoopState::new(chain))
    }

    #[test]
    fn start_key_runs_the_batch_once() {
        let (_dir, mut app, mut state) = setup(&["a.ogg", "b.ogg"]);
        assert!(!handle_key_event(press(KeyCode::Char('s')), &mut app, &mut state));
        assert!(app.is_busy());
        assert!(state.worker.is_some());

        while app.state != RunState::Completed {
            pump_worker(&mut app, &mut state);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(state.worker.is_none());
        assert_eq!(app.report.as_ref().unwrap().succeeded(), 2);

        // A finished run cannot be restarted.
        handle_key_event(press(KeyCode::Enter), &mut app, &mut state);
        assert_eq!(app.state, RunState::Completed);
        assert!(state.worker.is_none());
    }

    #[test]
    fn quit_while_running_waits_for_the_worker() {
        let (_dir, mut app, mut state) = setup(&["a.ogg", "b.ogg", "c.ogg"]);
        handle_key_event(press(KeyCode::Enter), &mut app, &mut state);
        assert!(handle_key_event(press(KeyCode::Char('q')), &mut app, &mut state));

        assert_eq!(app.state, RunState::Completed);
        assert!(state.worker.is_none());
        let report = app.report.as_ref().unwrap();
        assert!(report.attempted() <= 3);
    }

    #[test]
    fn cancel_before_start_is_ignored() {
        let (_dir, mut app, mut state) = setup(&["a.ogg"]);
        handle_key_event(press(KeyCode::Char('c')), &mut app, &mut state);
        assert_eq!(app.state, RunState::Idle);
        assert!(handle_key_event(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app,
            &mut state
        ));
    }

    #[test]
    fn esc_closes_summary_before_cancelling() {
        let (_dir, mut app, mut state) = setup(&["a.ogg"]);
        app.state = RunState::Completed;
        app.summary_window = true;
        handle_key_event(press(KeyCode::Esc), &mut app, &mut state);
        assert!(!app.summary_window);
    }
}
