//! Montage Timeline - the editing data model
//!
//! Clips, segments, text overlays, the ordered timeline they compose
//! into, snapshot undo/redo, and versioned JSON project persistence.

pub mod clip;
pub mod history;
pub mod overlay;
pub mod project;
pub mod segment;
pub mod timeline;

pub use clip::ClipRef;
pub use history::{History, HISTORY_CAPACITY};
pub use overlay::TextOverlay;
pub use project::{LoadWarning, LoadedProject, ProjectFile, SourceResolver, PROJECT_VERSION};
pub use segment::Segment;
pub use timeline::Timeline;
