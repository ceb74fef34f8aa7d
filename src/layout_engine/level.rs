use serde::Serialize;
use tracing::{debug, error, warn};

use super::error::LayoutError;
use super::manager::PanelManager;
use super::panel::PanelContext;
use super::wrapper::PanelWrapper;
use crate::model::{GroupId, LevelId, WrapperId};

/// One toggle of a level's panel selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorButton {
    pub panel_name: String,
    pub active: bool,
}

impl PanelManager {
    /// Reconciles a level with the names its parent level allows.
    ///
    /// Wrappers whose name is no longer allowed are removed; if none remain,
    /// the first autoactivated name is opened. Returns whether a wrapper was
    /// added or removed.
    pub fn reset_with_names(
        &mut self,
        level: LevelId,
        allowed: &[String],
        autoactivated: &[String],
    ) -> Result<bool, LayoutError> {
        if self.tree.level(level).is_none() {
            return Err(LayoutError::stale_level(level));
        }
        let mut cx = PanelContext::new();
        Ok(self.resolve_level(level, allowed, autoactivated, &mut cx))
    }

    pub(super) fn resolve_level(
        &mut self,
        level: LevelId,
        allowed: &[String],
        autoactivated: &[String],
        cx: &mut PanelContext,
    ) -> bool {
        let Some(node) = self.tree.level(level) else {
            return false;
        };
        let disallowed: Vec<WrapperId> = node
            .wrappers()
            .iter()
            .copied()
            .filter(|&w| {
                self.tree
                    .wrapper(w)
                    .is_some_and(|w| !allowed.iter().any(|name| name == w.panel_name()))
            })
            .collect();

        let mut changed = !disallowed.is_empty();
        for wrapper in disallowed {
            debug!(panel = ?self.panel_name(wrapper), "panel no longer allowed");
            self.tree.remove_wrapper(wrapper);
        }

        let empty = self.tree.level(level).is_some_and(|l| l.wrappers().is_empty());
        if let (true, Some(first)) = (empty, autoactivated.first()) {
            match self.open_panel(level, first, cx) {
                Ok(_) => changed = true,
                Err(e) => error!(?level, "could not autoactivate {first}: {e}"),
            }
        }

        if let Some(node) = self.tree.level_mut(level) {
            node.allowed = allowed.to_vec();
        }
        if changed {
            self.update_level_minimize(level);
            self.mark_structure_changed();
        }
        changed
    }

    /// Creates and appends a wrapper without re-deriving the levels below.
    pub(super) fn open_panel(
        &mut self,
        level: LevelId,
        panel_name: &str,
        cx: &mut PanelContext,
    ) -> Result<WrapperId, LayoutError> {
        let node = self.tree.level(level).ok_or_else(|| LayoutError::stale_level(level))?;
        if node.is_single_panel() && !node.wrappers().is_empty() {
            return Err(LayoutError::SinglePanelLevel(level));
        }
        let panel = self.create_panel(level, panel_name, cx)?;
        let wrapper = self
            .tree
            .insert_wrapper(level, PanelWrapper::new(panel_name, panel))
            .ok_or_else(|| LayoutError::stale_level(level))?;
        debug!(?level, panel = panel_name, "panel opened");
        Ok(wrapper)
    }

    /// A level with an empty allowed set accepts no panel.
    fn check_allowed(&self, level: LevelId, panel_name: &str) -> Result<(), LayoutError> {
        let node = self.tree.level(level).ok_or_else(|| LayoutError::stale_level(level))?;
        if node.allowed_panel_names().iter().any(|n| n == panel_name) {
            Ok(())
        } else {
            Err(LayoutError::NotAllowed { level, panel: panel_name.to_string() })
        }
    }

    fn group_of(&self, level: LevelId) -> Result<GroupId, LayoutError> {
        self.tree.group_of_level(level).ok_or_else(|| LayoutError::stale_level(level))
    }

    /// Opens `panel_name` next to the level's existing panels and re-derives
    /// the levels below.
    pub fn add_panel(&mut self, level: LevelId, panel_name: &str) -> Result<WrapperId, LayoutError> {
        let group = self.group_of(level)?;
        let opened = self.check_allowed(level, panel_name).and_then(|()| {
            let mut cx = PanelContext::new();
            self.open_panel(level, panel_name, &mut cx)
        });
        let wrapper = match opened {
            Ok(wrapper) => wrapper,
            Err(e) => {
                warn!(?level, "add_panel({panel_name}) aborted: {e}");
                return Err(e);
            }
        };
        self.update_level_minimize(level);
        self.mark_structure_changed();
        self.relayout(group)?;
        Ok(wrapper)
    }

    /// Makes `panel_name` the only panel of the level, reusing an existing
    /// wrapper of that name.
    pub fn activate_one_panel(
        &mut self,
        level: LevelId,
        panel_name: &str,
    ) -> Result<WrapperId, LayoutError> {
        let group = self.group_of(level)?;
        let existing = self
            .level_wrappers(level)
            .iter()
            .copied()
            .find(|&w| self.panel_name(w) == Some(panel_name));

        let (keep, fresh) = match existing {
            Some(wrapper) => (Some(wrapper), None),
            None => {
                let mut cx = PanelContext::new();
                match self.create_panel(level, panel_name, &mut cx) {
                    Ok(panel) => (None, Some(panel)),
                    Err(e) => {
                        warn!(?level, "activate_one_panel({panel_name}) aborted: {e}");
                        return Err(e);
                    }
                }
            }
        };

        let others: Vec<_> = self
            .level_wrappers(level)
            .iter()
            .copied()
            .filter(|&w| Some(w) != keep)
            .collect();
        let mut changed = !others.is_empty();
        for wrapper in others {
            self.tree.remove_wrapper(wrapper);
        }

        let wrapper = match (keep, fresh) {
            (Some(wrapper), _) => wrapper,
            (None, panel) => {
                changed = true;
                panel
                    .and_then(|panel| self.tree.insert_wrapper(level, PanelWrapper::new(panel_name, panel)))
                    .ok_or_else(|| LayoutError::stale_level(level))?
            }
        };

        if changed {
            debug!(?level, panel = panel_name, "activated exclusively");
            self.update_level_minimize(level);
            self.mark_structure_changed();
            self.relayout(group)?;
        }
        Ok(wrapper)
    }

    /// Closes one panel and re-derives the levels below.
    pub fn remove_panel(&mut self, wrapper: WrapperId) -> Result<(), LayoutError> {
        let level = self.tree.level_of(wrapper).ok_or_else(|| LayoutError::stale_wrapper(wrapper))?;
        let group = self.group_of(level)?;
        self.tree.remove_wrapper(wrapper);
        self.update_level_minimize(level);
        self.mark_structure_changed();
        self.relayout(group)?;
        Ok(())
    }

    /// Selector action: closes `panel_name` if it is open, otherwise opens
    /// it (exclusively on single-panel levels). Returns whether it is now open.
    pub fn toggle_panel(&mut self, level: LevelId, panel_name: &str) -> Result<bool, LayoutError> {
        if let Err(e) = self.check_allowed(level, panel_name) {
            warn!(?level, "toggle_panel({panel_name}) aborted: {e}");
            return Err(e);
        }
        let existing = self
            .level_wrappers(level)
            .iter()
            .copied()
            .find(|&w| self.panel_name(w) == Some(panel_name));
        if let Some(wrapper) = existing {
            self.remove_panel(wrapper)?;
            return Ok(false);
        }
        let single_panel = self.tree.level(level).is_some_and(|l| l.is_single_panel());
        if single_panel {
            self.activate_one_panel(level, panel_name)?;
        } else {
            self.add_panel(level, panel_name)?;
        }
        Ok(true)
    }

    /// One button per allowed name, active when a wrapper of that name exists.
    pub fn selector(&self, level: LevelId) -> Vec<SelectorButton> {
        let Some(node) = self.tree.level(level) else {
            return Vec::new();
        };
        node.allowed_panel_names()
            .iter()
            .map(|name| SelectorButton {
                panel_name: name.clone(),
                active: node.wrappers().iter().any(|&w| self.panel_name(w) == Some(name)),
            })
            .collect()
    }

    /// Recomputes a level's aggregate minimize flag and, on change, lets the
    /// column collection relocate levels.
    pub(super) fn update_level_minimize(&mut self, level: LevelId) {
        let Some(node) = self.tree.level(level) else {
            return;
        };
        let minimized = !node.wrappers().is_empty()
            && node.wrappers().iter().all(|&w| self.is_panel_minimized(w));
        if node.is_minimized() == minimized {
            return;
        }
        if let Some(node) = self.tree.level_mut(level) {
            node.minimized = minimized;
        }
        self.on_level_minimize_changed(level, minimized);
    }
}
