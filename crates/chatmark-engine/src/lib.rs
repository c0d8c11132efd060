pub mod error;
pub mod io;
pub mod models;
pub mod parsing;
pub mod render;
pub mod streaming;
pub mod view;

// Re-export key types for easier usage
pub use error::EngineError;
pub use io::{read_source, write_output};
pub use models::{Block, BlockKind, Document, Element, Link, ListMarker, Styling, Table};
pub use parsing::{ParseOptions, parse_markdown};
pub use render::{OutputFormat, render_blocks};
pub use streaming::{DocumentUpdater, Published, UpdateTicket};
pub use view::{ConsumeResult, NodeId, ReconcileReport, Reconciler, TrackRange};
