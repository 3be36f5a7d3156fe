//! Terminal shell for the playground: sidebar, editor, console, AI panel.

pub mod app;
pub mod editor;
pub mod events;
pub mod handler;
pub mod ui;

pub use handler::{run_playground, PlaygroundOptions};
