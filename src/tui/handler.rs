//! Async event loop for the playground shell.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;

use crate::assist::AssistSession;
use crate::config::Config;
use crate::llm::{ChatOptions, LlmClient};
use crate::runtime::PythonRuntime;
use crate::transcript::Entry;

use super::{
    app::{AiPanel, App, Focus, RuntimePhase},
    events::TuiEvent,
    ui::render_ui,
};

pub struct PlaygroundOptions {
    pub initial_source: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
}

/// Run the playground shell until the user quits.
pub async fn run_playground(cfg: &Config, opts: PlaygroundOptions) -> Result<()> {
    let client = LlmClient::from_config(cfg)?;
    let assist = AssistSession::new(
        client,
        ChatOptions {
            model: opts.model.clone(),
            temperature: opts.temperature,
            top_p: opts.top_p,
            max_tokens: 768,
        },
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&opts.initial_source, opts.model.clone());

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    // Bootstrap the runtime in the background; the loading screen renders
    // until RuntimeReady/RuntimeFailed lands.
    spawn_runtime_init(cfg.clone(), event_tx.clone());

    let result = run_app(&mut terminal, &mut app, assist, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn spawn_runtime_init(cfg: Config, event_tx: mpsc::UnboundedSender<TuiEvent>) {
    let out_tx = event_tx.clone();
    let err_tx = event_tx.clone();
    tokio::spawn(async move {
        let on_stdout: crate::runtime::OutputSink = Box::new(move |text: &str| {
            let _ = out_tx.send(TuiEvent::Output(Entry::stdout(text)));
        });
        let on_stderr: crate::runtime::OutputSink = Box::new(move |text: &str| {
            let _ = err_tx.send(TuiEvent::Output(Entry::stderr(text)));
        });
        match PythonRuntime::initialize(&cfg, on_stdout, on_stderr).await {
            Ok(rt) => {
                let _ = event_tx.send(TuiEvent::RuntimeReady(Arc::new(rt)));
            }
            Err(e) => {
                let _ = event_tx.send(TuiEvent::RuntimeFailed(e.to_string()));
            }
        }
    });
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut assist: AssistSession,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    // Spawn input handler
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if input_tx.send(TuiEvent::Key(key)).is_err() {
                    break; // Channel closed
                }
            }
        }
    });

    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        if let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, &mut assist, key, &event_tx) {
                        break;
                    }
                }
                TuiEvent::RuntimeReady(rt) => {
                    let banner = format!("{} environment loaded successfully.", rt.version());
                    app.phase = RuntimePhase::Ready(rt);
                    app.push_entry(Entry::system(banner));
                    app.update_status();
                }
                TuiEvent::RuntimeFailed(message) => {
                    app.phase = RuntimePhase::Failed(message);
                    app.status_message = "Python engine failed to initialize".into();
                }
                TuiEvent::Output(entry) => {
                    app.push_entry(entry);
                }
                TuiEvent::RunFinished(outcome) => {
                    app.finish_run(outcome);
                }
                TuiEvent::AssistReady { token, text } => {
                    // Stale responses lost the race; drop them.
                    if assist.is_current(token) && app.ai_panel == AiPanel::Loading {
                        app.ai_panel = AiPanel::Ready(text);
                    }
                }
            }
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    Ok(())
}

/// Handle one key press. Returns true when the shell should quit.
fn handle_key_event(
    app: &mut App,
    assist: &mut AssistSession,
    key: KeyEvent,
    event_tx: &mpsc::UnboundedSender<TuiEvent>,
) -> bool {
    // A failed bootstrap is terminal: only the quit keys work under the
    // fatal banner.
    if matches!(app.phase, RuntimePhase::Failed(_)) {
        return matches!(
            (key.code, key.modifiers.contains(KeyModifiers::CONTROL)),
            (KeyCode::Char('q'), true) | (KeyCode::Char('c'), true) | (KeyCode::Esc, _)
        );
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') => return app.handle_ctrl_c(),
            KeyCode::Char('r') => {
                start_run(app, event_tx);
                return false;
            }
            KeyCode::Char('o') => {
                start_optimize(app, assist, event_tx);
                return false;
            }
            KeyCode::Char('e') => {
                start_explain(app, assist, event_tx);
                return false;
            }
            KeyCode::Char('l') => {
                app.clear_console();
                app.update_status();
                return false;
            }
            _ => return false,
        }
    }

    match key.code {
        KeyCode::Esc => {
            app.ai_panel = AiPanel::Hidden;
        }
        KeyCode::BackTab => app.toggle_focus(),
        KeyCode::PageUp => app.scroll_console_up(),
        KeyCode::PageDown => app.scroll_console_down(),
        _ => match app.focus {
            Focus::Sidebar => match key.code {
                KeyCode::Up => app.sidebar_up(),
                KeyCode::Down => app.sidebar_down(),
                KeyCode::Enter => app.apply_selected_snippet(),
                KeyCode::Tab => app.toggle_focus(),
                _ => {}
            },
            Focus::Editor => match key.code {
                KeyCode::Char(c) => app.editor.insert_char(c),
                KeyCode::Enter => app.editor.insert_newline(),
                KeyCode::Backspace => app.editor.backspace(),
                KeyCode::Delete => app.editor.delete(),
                KeyCode::Left => app.editor.move_left(),
                KeyCode::Right => app.editor.move_right(),
                KeyCode::Up => app.editor.move_up(),
                KeyCode::Down => app.editor.move_down(),
                KeyCode::Home => app.editor.move_home(),
                KeyCode::End => app.editor.move_end(),
                KeyCode::Tab => {
                    for _ in 0..4 {
                        app.editor.insert_char(' ');
                    }
                }
                _ => {}
            },
        },
    }
    false
}

fn start_run(app: &mut App, event_tx: &mpsc::UnboundedSender<TuiEvent>) {
    let Some(runtime) = app.runtime().map(Arc::clone) else {
        return;
    };
    // The latch is only taken inside the spawned task, so the synchronous
    // flag must gate here or a second trigger in the same tick would log a
    // stray attempt marker. The latch stays as the authoritative backstop.
    if app.is_running || runtime.is_running() {
        // Defined Busy outcome at the API; at the UI a rejected attempt is
        // simply a no-op.
        app.status_message = "A script is already running".into();
        return;
    }

    let source = app.editor.text();

    app.is_running = true;
    app.ai_panel = AiPanel::Hidden;
    app.update_status();
    // Run-start marker precedes every entry the run produces.
    app.push_entry(Entry::system(format!(
        "--- Running Script at {} ---",
        Local::now().format("%H:%M:%S")
    )));

    let tx = event_tx.clone();
    tokio::spawn(async move {
        let outcome = runtime.run(&source).await;
        let _ = tx.send(TuiEvent::RunFinished(outcome));
    });
}

fn start_optimize(app: &mut App, assist: &mut AssistSession, tx: &mpsc::UnboundedSender<TuiEvent>) {
    let token = assist.begin();
    let session = assist.clone();
    let source = app.editor.text();
    app.ai_panel = AiPanel::Loading;

    let tx = tx.clone();
    tokio::spawn(async move {
        let text = session.suggest_optimizations(&source).await;
        let _ = tx.send(TuiEvent::AssistReady { token, text });
    });
}

fn start_explain(app: &mut App, assist: &mut AssistSession, tx: &mpsc::UnboundedSender<TuiEvent>) {
    // Not offered without a stderr entry; precondition, not a failure.
    let Some(last_error) = app.transcript.last_stderr() else {
        return;
    };
    let error = last_error.content.clone();
    let token = assist.begin();
    let session = assist.clone();
    let source = app.editor.text();
    app.ai_panel = AiPanel::Loading;

    let tx = tx.clone();
    tokio::spawn(async move {
        let text = session.explain_error(&source, &error).await;
        let _ = tx.send(TuiEvent::AssistReady { token, text });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::OutputSink;
    use crate::transcript::EntryKind;

    /// Runtime with no-op sinks; `None` skips the test when no interpreter
    /// is installed.
    async fn ready_runtime() -> Option<PythonRuntime> {
        let on_stdout: OutputSink = Box::new(|_| {});
        let on_stderr: OutputSink = Box::new(|_| {});
        match PythonRuntime::initialize(&Config::load(), on_stdout, on_stderr).await {
            Ok(rt) => Some(rt),
            Err(_) => {
                println!("no Python interpreter found, skipping");
                None
            }
        }
    }

    // The run task takes the latch only once it is polled; on a
    // current-thread runtime neither submission has run yet when the second
    // trigger arrives, so only the synchronous flag can suppress it.
    #[tokio::test]
    async fn second_trigger_in_the_same_tick_logs_one_marker() {
        let Some(rt) = ready_runtime().await else {
            return;
        };
        let mut app = App::new("print('hi')", "fake".into());
        app.phase = RuntimePhase::Ready(Arc::new(rt));

        let (tx, mut rx) = mpsc::unbounded_channel::<TuiEvent>();
        start_run(&mut app, &tx);
        start_run(&mut app, &tx);

        let markers = app
            .transcript
            .iter()
            .filter(|e| e.kind == EntryKind::System)
            .count();
        assert_eq!(markers, 1);
        assert!(app.is_running);

        // Exactly one run was submitted, and folding its outcome returns
        // the shell to idle.
        match rx.recv().await.expect("run outcome") {
            TuiEvent::RunFinished(outcome) => app.finish_run(outcome),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!app.is_running);
        assert!(rx.try_recv().is_err());
    }
}
