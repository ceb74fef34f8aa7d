use tracing::{debug, info, instrument, trace};

use super::manager::{MinimizeOrigin, PanelManager};
use crate::model::{ColumnId, GroupId, LevelId, WrapperId};

impl PanelManager {
    pub fn wrapper_min_width(&self, wrapper: WrapperId) -> u32 {
        self.tree.wrapper(wrapper).map_or(0, |w| w.min_width(&self.settings))
    }

    pub fn wrapper_max_width(&self, wrapper: WrapperId) -> u32 {
        self.tree.wrapper(wrapper).map_or(0, |w| w.max_width(&self.settings))
    }

    pub fn wrapper_min_height(&self, wrapper: WrapperId) -> u32 {
        self.tree.wrapper(wrapper).map_or(0, |w| w.min_height(&self.settings))
    }

    /// Panels of a level sit side by side.
    pub fn level_min_width(&self, level: LevelId) -> u32 {
        self.level_wrappers(level).iter().map(|&w| self.wrapper_min_width(w)).sum()
    }

    pub fn level_max_width(&self, level: LevelId) -> u32 {
        self.level_wrappers(level).iter().map(|&w| self.wrapper_max_width(w)).sum()
    }

    pub fn level_min_height(&self, level: LevelId) -> u32 {
        self.level_wrappers(level).iter().map(|&w| self.wrapper_min_height(w)).max().unwrap_or(0)
    }

    fn column_levels(&self, column: ColumnId) -> &[LevelId] {
        self.tree.column(column).map(|c| c.levels()).unwrap_or(&[])
    }

    /// Levels of a column are stacked, so the widest one decides.
    pub fn column_min_width(&self, column: ColumnId) -> u32 {
        self.column_levels(column).iter().map(|&l| self.level_min_width(l)).max().unwrap_or(0)
    }

    pub fn column_max_width(&self, column: ColumnId) -> u32 {
        self.column_levels(column).iter().map(|&l| self.level_max_width(l)).max().unwrap_or(0)
    }

    pub fn column_min_height(&self, column: ColumnId) -> u32 {
        self.column_levels(column).iter().map(|&l| self.level_min_height(l)).sum()
    }

    pub fn group_min_width(&self, group: GroupId) -> u32 {
        self.columns(group).iter().map(|&c| self.column_min_width(c)).sum()
    }

    pub fn group_max_width(&self, group: GroupId) -> u32 {
        self.columns(group).iter().map(|&c| self.column_max_width(c)).sum()
    }

    pub fn group_min_height(&self, group: GroupId) -> u32 {
        self.columns(group).iter().map(|&c| self.column_min_height(c)).max().unwrap_or(0)
    }

    /// Width the whole layout needs with the current minimize state.
    pub fn min_width(&self) -> u32 { self.groups().iter().map(|&g| self.group_min_width(g)).sum() }

    pub fn max_width(&self) -> u32 { self.groups().iter().map(|&g| self.group_max_width(g)).sum() }

    pub fn min_height(&self) -> u32 {
        self.groups().iter().map(|&g| self.group_min_height(g)).max().unwrap_or(0)
    }

    /// First expanded panel, depth first, that may be minimized.
    pub fn next_panel_to_minimize(&self) -> Option<WrapperId> {
        self.tree
            .all_wrappers()
            .into_iter()
            .find(|&w| !self.is_panel_minimized(w) && self.can_minimize(w))
    }

    /// Deepest minimized panel.
    pub fn next_panel_to_unminimize(&self) -> Option<WrapperId> {
        self.tree.all_wrappers().into_iter().rev().find(|&w| self.is_panel_minimized(w))
    }

    /// Minimizes or restores panels until the layout fits `width`. Returns
    /// whether any panel changed.
    #[instrument(level = "debug", skip(self))]
    pub fn resize_base(&mut self, width: u32) -> bool {
        self.window_width = Some(width);
        let mut changed = self.grow_into(width);
        if self.fit_to_window && self.shrink_into(width) {
            changed = true;
            // Shrinking may free more room than needed.
            self.grow_into(width);
        }
        if !self.fit_to_window && self.min_width() <= width {
            info!(width, "layout fits again, fit to window enabled");
            self.fit_to_window = true;
        }
        debug!(width, needed = self.min_width(), changed, "resized");
        changed
    }

    fn grow_into(&mut self, width: u32) -> bool {
        let mut changed = false;
        while let Some(wrapper) = self.next_panel_to_unminimize() {
            if self.min_width_with_expanded(wrapper) > width {
                break;
            }
            match self.set_minimize_from(wrapper, false, MinimizeOrigin::Fit) {
                Ok(true) => changed = true,
                _ => break,
            }
            trace!(?wrapper, "unminimized to fill the window");
        }
        changed
    }

    /// Width the layout would need with `wrapper` expanded, counting the
    /// column split that expanding a merge boundary level causes.
    fn min_width_with_expanded(&self, wrapper: WrapperId) -> u32 {
        let total = self.min_width();
        let Some(level) = self.tree.level_of(wrapper) else {
            return total;
        };
        let Some(node) = self.tree.level(level) else {
            return total;
        };
        let expanded = self.tree.wrapper(wrapper).map_or(0, |w| w.expanded_min_width());
        let level_width = self.level_min_width(level) - self.wrapper_min_width(wrapper) + expanded;
        let width_of = |l: LevelId| if l == level { level_width } else { self.level_min_width(l) };
        let widest = |levels: &[LevelId]| levels.iter().map(|&l| width_of(l)).max().unwrap_or(0);

        let levels = self.column_levels(node.column());
        let column_width = match levels.iter().position(|&l| l == level) {
            Some(i) if node.is_minimized() && node.is_merge_boundary() && i + 1 < levels.len() => {
                let (head, tail) = levels.split_at(i + 1);
                widest(head) + widest(tail)
            }
            _ => widest(levels),
        };
        total - self.column_min_width(node.column()) + column_width
    }

    fn shrink_into(&mut self, width: u32) -> bool {
        let mut changed = false;
        while self.min_width() > width {
            let Some(wrapper) = self.next_panel_to_minimize() else {
                break;
            };
            match self.set_minimize_from(wrapper, true, MinimizeOrigin::Fit) {
                Ok(true) => changed = true,
                _ => break,
            }
            trace!(?wrapper, "minimized to fit the window");
        }
        changed
    }

    /// Recomputes group and column widths as percentages of their parent's
    /// minimum width.
    pub fn reset_percent_base(&mut self) {
        let groups = self.groups().to_vec();
        let total: u32 = groups.iter().map(|&g| self.group_min_width(g)).sum();
        for &group in &groups {
            let group_width = self.group_min_width(group);
            let columns = self.columns(group).to_vec();
            let column_shares: Vec<f64> = columns
                .iter()
                .map(|&c| share(self.column_min_width(c), group_width, columns.len()))
                .collect();
            for (column, percent) in columns.into_iter().zip(column_shares) {
                if let Some(node) = self.tree.column_mut(column) {
                    node.percent = percent;
                }
            }
            if let Some(node) = self.tree.group_mut(group) {
                node.percent = share(group_width, total, groups.len());
            }
        }
        trace!(total, "percentages reset");
    }

    /// Renders the layout as an indented tree for debugging.
    pub fn draw_tree(&self) -> String {
        let groups = self
            .groups()
            .iter()
            .enumerate()
            .map(|(i, &g)| self.group_ascii_tree(i, g))
            .collect();
        let root = ascii_tree::Tree::Node(
            format!("manager fit={} width={:?} min={}", self.fit_to_window, self.window_width, self.min_width()),
            groups,
        );
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &root);
        out
    }

    fn group_ascii_tree(&self, index: usize, group: GroupId) -> ascii_tree::Tree {
        let percent = self.tree.group(group).map_or(0.0, |g| g.percent());
        let columns = self
            .columns(group)
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let percent = self.tree.column(c).map_or(0.0, |c| c.percent());
                let levels = self.column_levels(c).iter().map(|&l| self.level_ascii_tree(l)).collect();
                node(format!("column {i} {percent:.1}% min={}", self.column_min_width(c)), levels)
            })
            .collect();
        node(format!("group {index} {percent:.1}% min={}", self.group_min_width(group)), columns)
    }

    fn level_ascii_tree(&self, level: LevelId) -> ascii_tree::Tree {
        let pos = self.tree.level_position(level).unwrap_or_default();
        let flags = match self.tree.level(level) {
            Some(l) if l.is_minimized() => " (minimized)",
            _ => "",
        };
        let wrappers = self
            .level_wrappers(level)
            .iter()
            .filter_map(|&w| self.tree.wrapper(w))
            .map(|w| {
                let mark = if w.is_minimized() { "▸" } else { "▾" };
                let lock = if w.is_locked() { " locked" } else { "" };
                ascii_tree::Tree::Leaf(vec![format!("{mark} {}{lock}", w.panel_name())])
            })
            .collect();
        node(format!("level {pos}{flags}"), wrappers)
    }
}

fn node(desc: String, children: Vec<ascii_tree::Tree>) -> ascii_tree::Tree {
    if children.is_empty() {
        ascii_tree::Tree::Leaf(vec![desc])
    } else {
        ascii_tree::Tree::Node(desc, children)
    }
}

/// `part` as a percentage of `whole`; an empty whole is split evenly.
fn share(part: u32, whole: u32, count: usize) -> f64 {
    if whole == 0 {
        100.0 / count.max(1) as f64
    } else {
        f64::from(part) * 100.0 / f64::from(whole)
    }
}

#[cfg(test)]
mod tests {
    use super::share;

    #[test]
    fn share_splits_evenly_when_empty() {
        assert_eq!(share(0, 0, 4), 25.0);
        assert_eq!(share(30, 120, 2), 25.0);
    }
}
