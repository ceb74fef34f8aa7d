pub mod lock_queue;
pub mod panel_tree;
pub mod selection;

pub use panel_tree::{ColumnId, GroupId, LevelId, PanelTree, WrapperId};
pub use selection::{Selection, SelectionChanges};
