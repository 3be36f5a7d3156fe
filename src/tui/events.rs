//! Internal event types for the playground shell.

use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::runtime::{PythonRuntime, RuntimeError};
use crate::transcript::Entry;

/// Events flowing through the shell's single event loop.
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input.
    Key(KeyEvent),
    /// Runtime bootstrap finished; the ready handle is owned by the shell
    /// from here on and shared into run tasks.
    RuntimeReady(Arc<PythonRuntime>),
    /// Runtime bootstrap failed. Fatal for the session.
    RuntimeFailed(String),
    /// One output chunk emitted by the script currently running.
    Output(Entry),
    /// The in-flight run completed.
    RunFinished(Result<Option<String>, RuntimeError>),
    /// An assistance response arrived. Commits only when `token` is still
    /// the latest issued request.
    AssistReady { token: u64, text: String },
}
