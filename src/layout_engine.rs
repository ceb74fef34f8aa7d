mod catalog;
mod columns;
mod error;
mod fit;
mod level;
mod manager;
mod panel;
mod persist;
pub mod scheduler;
mod wrapper;

pub use catalog::{DeclaredPanel, PanelCatalog};
pub use error::LayoutError;
pub use level::SelectorButton;
pub use manager::{MinimizeOrigin, PanelManager};
pub use panel::{Panel, PanelContext, PanelFactory, PanelRegistry};
pub use persist::{LAYOUT_VERSION, SavedColumn, SavedGroup, SavedLayout, SavedLevel, SavedPanel};
pub use scheduler::Debounce;
pub use wrapper::{LockedCallback, PanelWrapper};
