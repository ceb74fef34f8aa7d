use tracing::{debug, error, instrument, trace};

use super::error::LayoutError;
use super::manager::PanelManager;
use super::panel::PanelContext;
use crate::model::{ColumnId, GroupId, LevelId, WrapperId};

impl PanelManager {
    pub fn columns(&self, group: GroupId) -> &[ColumnId] {
        self.tree.group(group).map(|g| g.columns()).unwrap_or(&[])
    }

    /// Levels of a group in drill-down order.
    pub fn levels(&self, group: GroupId) -> Vec<LevelId> { self.tree.flat_levels(group) }

    /// Wrappers of a group, depth first.
    pub fn wrappers(&self, group: GroupId) -> Vec<WrapperId> { self.tree.group_wrappers(group) }

    /// Derives the level chain of `group` from its root panel downwards.
    #[instrument(level = "debug", skip(self, cx))]
    pub(super) fn selection_pass(
        &mut self,
        group: GroupId,
        cx: &mut PanelContext,
    ) -> Result<bool, LayoutError> {
        if self.tree.group(group).is_none() {
            return Err(LayoutError::stale_group(group));
        }
        let root = self.settings.root_panel.clone();
        let mut allowed = vec![root.clone()];
        let mut autoactivated = vec![root];
        let mut changed = false;
        let mut pos = 0;

        while !allowed.is_empty() {
            let level = match self.tree.flat_levels(group).get(pos) {
                Some(&level) => level,
                None => {
                    let single_panel = self.settings.is_single_panel_level(pos);
                    let level = self
                        .tree
                        .push_level(group, single_panel)
                        .ok_or_else(|| LayoutError::stale_group(group))?;
                    trace!(pos, ?level, "level created");
                    self.mark_structure_changed();
                    changed = true;
                    level
                }
            };
            changed |= self.resolve_level(level, &allowed, &autoactivated, cx);
            (allowed, autoactivated) = self.next_level_names(level);
            pos += 1;
        }

        while self.tree.level_count(group) > pos {
            self.tree.remove_last_level(group);
            self.mark_structure_changed();
            changed = true;
        }
        if changed {
            debug!(levels = pos, columns = self.tree.column_count(group), "levels derived");
        }
        Ok(changed)
    }

    /// Names the panels of `level` offer to the next level: the ordered,
    /// deduplicated union of their allowed names, and of their autoactivated
    /// names restricted to those.
    pub fn next_level_names(&self, level: LevelId) -> (Vec<String>, Vec<String>) {
        let mut allowed: Vec<String> = Vec::new();
        let mut autoactivated: Vec<String> = Vec::new();
        for &wrapper in self.level_wrappers(level) {
            let Some(w) = self.tree.wrapper(wrapper) else { continue };
            for name in w.panel().allowed_panel_names() {
                if !allowed.contains(&name) {
                    allowed.push(name);
                }
            }
            for name in w.panel().autoactivated_panel_names() {
                if !autoactivated.contains(&name) {
                    autoactivated.push(name);
                }
            }
        }
        autoactivated.retain(|name| allowed.contains(name));
        (allowed, autoactivated)
    }

    /// Relocates levels after `level` became fully minimized or expanded.
    pub(super) fn on_level_minimize_changed(&mut self, level: LevelId, minimized: bool) {
        let Some(column) = self.tree.column_of(level) else {
            return;
        };
        if minimized {
            if self.tree.next_column(column).is_none() {
                return;
            }
            if !self.tree.is_terminal(level) {
                error!(?level, ?column, "minimized level is not last in its column, not relocating");
                return;
            }
            if let Some(target) = self.tree.merge_into_next_column(column) {
                debug!(?level, from = ?column, into = ?target, "column merged into next");
                self.mark_structure_changed();
            }
        } else if self.tree.take_merge_boundary(level) {
            if let Some(new_column) = self.tree.split_column_after(level) {
                debug!(?level, ?new_column, "merged column split after expanded level");
                self.mark_structure_changed();
            }
        }
    }
}
