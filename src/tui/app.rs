//! Shell application state.

use std::sync::Arc;
use std::time::Instant;

use crate::runtime::PythonRuntime;
use crate::snippets::SNIPPETS;
use crate::transcript::{Entry, Transcript};

use super::editor::EditorBuffer;

/// Runtime bootstrap phase. `Failed` is terminal: the shell shows a blocking
/// banner and offers no retry.
#[derive(Debug)]
pub enum RuntimePhase {
    Initializing,
    Ready(Arc<PythonRuntime>),
    Failed(String),
}

/// Collapsible AI insight panel.
#[derive(Debug, Clone, PartialEq)]
pub enum AiPanel {
    Hidden,
    Loading,
    Ready(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Editor,
}

#[derive(Debug)]
pub struct App {
    pub editor: EditorBuffer,
    pub transcript: Transcript,
    pub phase: RuntimePhase,
    /// Mirrors the runtime's run latch for rendering; the latch itself is
    /// authoritative.
    pub is_running: bool,
    pub ai_panel: AiPanel,
    pub focus: Focus,
    pub sidebar_selected: usize,
    /// 0 means pinned to the bottom of the console.
    pub console_scroll: usize,
    pub status_message: String,
    pub model: String,
    /// Timestamp of last Ctrl+C press for double Ctrl+C detection.
    pub last_ctrl_c_time: Option<Instant>,
}

impl App {
    pub fn new(initial_source: &str, model: String) -> Self {
        Self {
            editor: EditorBuffer::from_text(initial_source),
            transcript: Transcript::new(),
            phase: RuntimePhase::Initializing,
            is_running: false,
            ai_panel: AiPanel::Hidden,
            focus: Focus::Editor,
            sidebar_selected: 0,
            console_scroll: 0,
            status_message: "Initializing Python engine...".into(),
            model,
            last_ctrl_c_time: None,
        }
    }

    pub fn runtime(&self) -> Option<&Arc<PythonRuntime>> {
        match &self.phase {
            RuntimePhase::Ready(rt) => Some(rt),
            _ => None,
        }
    }

    pub fn push_entry(&mut self, entry: Entry) {
        self.transcript.push(entry);
        self.scroll_to_bottom();
    }

    pub fn clear_console(&mut self) {
        self.transcript.clear();
        self.console_scroll = 0;
    }

    /// Explain-error is offered only while the transcript holds at least one
    /// stderr entry.
    pub fn can_explain(&self) -> bool {
        self.transcript.has_stderr()
    }

    /// Fold a finished run into the transcript: a non-empty final value adds
    /// one stdout entry, a failure adds exactly one stderr entry. A `Busy`
    /// rejection belongs to a suppressed attempt, not the run in flight, so
    /// it must neither log nor touch the running state.
    pub fn finish_run(&mut self, outcome: Result<Option<String>, crate::runtime::RuntimeError>) {
        if matches!(outcome, Err(crate::runtime::RuntimeError::Busy)) {
            return;
        }
        self.is_running = false;
        match outcome {
            Ok(Some(value)) => self.push_entry(Entry::stdout(value)),
            Ok(None) => {}
            Err(e) => self.push_entry(Entry::stderr(e.to_string())),
        }
        self.update_status();
    }

    pub fn sidebar_up(&mut self) {
        if self.sidebar_selected > 0 {
            self.sidebar_selected -= 1;
        }
    }

    pub fn sidebar_down(&mut self) {
        if self.sidebar_selected + 1 < SNIPPETS.len() {
            self.sidebar_selected += 1;
        }
    }

    /// Replace the editor buffer with the selected canned example.
    pub fn apply_selected_snippet(&mut self) {
        if let Some(snippet) = SNIPPETS.get(self.sidebar_selected) {
            self.editor.replace(snippet.code);
            self.status_message = format!("Loaded example: {}", snippet.name);
            self.focus = Focus::Editor;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Editor,
            Focus::Editor => Focus::Sidebar,
        };
    }

    pub fn scroll_console_up(&mut self) {
        self.console_scroll += 1;
    }

    pub fn scroll_console_down(&mut self) {
        if self.console_scroll > 0 {
            self.console_scroll -= 1;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.console_scroll = 0;
    }

    pub fn update_status(&mut self) {
        self.status_message = if self.is_running {
            "Running...".into()
        } else if self.can_explain() {
            "Ctrl+R run | Ctrl+O optimize | Ctrl+E explain error | Ctrl+L clear | Ctrl+Q quit".into()
        } else {
            "Ctrl+R run | Ctrl+O optimize | Ctrl+L clear | Ctrl+Q quit".into()
        };
    }

    /// Handle Ctrl+C press and detect double press for quit.
    /// Returns true if the shell should quit.
    pub fn handle_ctrl_c(&mut self) -> bool {
        const DOUBLE_CTRL_C_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

        let now = Instant::now();
        if let Some(last_time) = self.last_ctrl_c_time {
            if now.duration_since(last_time) <= DOUBLE_CTRL_C_TIMEOUT {
                self.last_ctrl_c_time = None;
                return true;
            }
        }
        self.last_ctrl_c_time = Some(now);
        self.status_message = "Press Ctrl+C again to quit".into();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::EntryKind;

    #[test]
    fn explain_is_gated_on_a_stderr_entry() {
        let mut app = App::new("", "fake".into());
        assert!(!app.can_explain());
        app.push_entry(Entry::stdout("fine"));
        assert!(!app.can_explain());
        app.push_entry(Entry::stderr("NameError: name 'x' is not defined"));
        assert!(app.can_explain());
        app.clear_console();
        assert!(!app.can_explain());
    }

    #[test]
    fn snippet_selection_replaces_the_buffer() {
        let mut app = App::new("original", "fake".into());
        app.focus = Focus::Sidebar;
        app.sidebar_down();
        app.apply_selected_snippet();
        assert_eq!(app.editor.text(), crate::snippets::SNIPPETS[1].code);
        assert_eq!(app.focus, Focus::Editor);
    }

    #[test]
    fn console_entries_keep_arrival_order() {
        let mut app = App::new("", "fake".into());
        app.push_entry(Entry::system("--- start ---"));
        app.push_entry(Entry::stdout("a"));
        app.push_entry(Entry::stderr("b"));
        let kinds: Vec<EntryKind> = app.transcript.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::System, EntryKind::Stdout, EntryKind::Stderr]
        );
    }

    #[test]
    fn failed_run_folds_into_one_stderr_entry() {
        use crate::runtime::RuntimeError;
        let mut app = App::new("", "fake".into());
        app.push_entry(Entry::system("--- Running Script at 12:00:00 ---"));
        app.is_running = true;
        app.finish_run(Err(RuntimeError::Execution(
            "ZeroDivisionError: division by zero".into(),
        )));
        assert!(!app.is_running);
        assert_eq!(app.transcript.len(), 2);
        let kinds: Vec<EntryKind> = app.transcript.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::System, EntryKind::Stderr]);
        assert_eq!(
            app.transcript.last_stderr().unwrap().content,
            "ZeroDivisionError: division by zero"
        );
    }

    #[test]
    fn quiet_run_adds_no_entries_beyond_the_marker() {
        let mut app = App::new("", "fake".into());
        app.push_entry(Entry::system("--- Running Script at 12:00:00 ---"));
        app.is_running = true;
        app.finish_run(Ok(None));
        assert_eq!(app.transcript.len(), 1);
    }

    #[test]
    fn final_value_becomes_one_stdout_entry() {
        let mut app = App::new("", "fake".into());
        app.is_running = true;
        app.finish_run(Ok(Some("42".into())));
        let entry = app.transcript.iter().next().unwrap();
        assert_eq!(entry.kind, EntryKind::Stdout);
        assert_eq!(entry.content, "42");
    }

    #[test]
    fn busy_rejection_leaves_the_active_run_untouched() {
        use crate::runtime::RuntimeError;
        let mut app = App::new("", "fake".into());
        app.is_running = true;
        app.finish_run(Err(RuntimeError::Busy));
        // The first run is still in flight; the rejection must not flip the
        // state to idle or log anything.
        assert!(app.is_running);
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn double_ctrl_c_quits() {
        let mut app = App::new("", "fake".into());
        assert!(!app.handle_ctrl_c());
        assert!(app.handle_ctrl_c());
    }
}
