pub mod block;
pub mod coalesce;
pub mod document;
pub mod element;
pub mod table;

pub use block::{Block, BlockKind, ListKind, ListMarker, MAX_LIST_LEVEL, MAX_QUOTE_LEVEL};
pub use document::Document;
pub use element::{Element, Link, Styling};
pub use table::{Align, Table};
