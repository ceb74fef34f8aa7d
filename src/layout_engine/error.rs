use thiserror::Error;

use crate::model::{GroupId, LevelId, WrapperId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("No panel registered under the name {0:?}")]
    UnknownPanel(String),
    #[error("Level {0:?} holds a single panel and is already occupied")]
    SinglePanelLevel(LevelId),
    #[error("Panel {panel:?} is not allowed at level {level:?}")]
    NotAllowed { level: LevelId, panel: String },
    #[error("Level {0:?} is not the last of its column and cannot be fully minimized")]
    NonTerminalLevel(LevelId),
    #[error("Group {0:?} is the last remaining group")]
    LastGroup(GroupId),
    #[error("Stale reference: {0}")]
    StaleId(String),
}

impl LayoutError {
    pub(crate) fn stale_group(id: GroupId) -> Self { Self::StaleId(format!("group {id:?}")) }

    pub(crate) fn stale_level(id: LevelId) -> Self { Self::StaleId(format!("level {id:?}")) }

    pub(crate) fn stale_wrapper(id: WrapperId) -> Self { Self::StaleId(format!("wrapper {id:?}")) }
}
