//! Montage Engine - editing facade and export pipeline
//!
//! [`Editor`] ties the timeline model, undo history, project
//! persistence, and the threaded export pipeline together behind one
//! API. Exports run on a worker thread and report through a channel of
//! [`ExportEvent`]s.

pub mod editor;
pub mod export;

pub use editor::Editor;
pub use export::{ExportEvent, ExportHandle, ExportStage};
