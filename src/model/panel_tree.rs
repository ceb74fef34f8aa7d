use slotmap::SlotMap;

use super::selection::Selection;
use crate::layout_engine::PanelWrapper;

slotmap::new_key_type! {
    /// An independent workspace holding its own columns and selection.
    pub struct GroupId;
    /// A vertical stack of levels inside a group.
    pub struct ColumnId;
    /// A slot inside a column holding side-by-side panels.
    pub struct LevelId;
    /// A panel wrapper inside a level.
    pub struct WrapperId;
}

#[derive(Debug, Default)]
pub struct GroupNode {
    pub(crate) columns: Vec<ColumnId>,
    pub(crate) selection: Selection,
    pub(crate) percent: f64,
}

impl GroupNode {
    pub fn columns(&self) -> &[ColumnId] { &self.columns }

    pub fn selection(&self) -> &Selection { &self.selection }

    /// Share of the manager's width, in percent.
    pub fn percent(&self) -> f64 { self.percent }
}

#[derive(Debug)]
pub struct ColumnNode {
    pub(crate) group: GroupId,
    pub(crate) levels: Vec<LevelId>,
    pub(crate) percent: f64,
}

impl ColumnNode {
    pub fn group(&self) -> GroupId { self.group }

    pub fn levels(&self) -> &[LevelId] { &self.levels }

    /// Share of the group's width, in percent.
    pub fn percent(&self) -> f64 { self.percent }
}

#[derive(Debug)]
pub struct LevelNode {
    pub(crate) column: ColumnId,
    pub(crate) wrappers: Vec<WrapperId>,
    pub(crate) allowed: Vec<String>,
    pub(crate) minimized: bool,
    pub(crate) single_panel: bool,
    pub(crate) merge_boundary: bool,
}

impl LevelNode {
    pub fn column(&self) -> ColumnId { self.column }

    pub fn wrappers(&self) -> &[WrapperId] { &self.wrappers }

    pub fn allowed_panel_names(&self) -> &[String] { &self.allowed }

    /// Cached aggregate: the level has wrappers and all of them are minimized.
    pub fn is_minimized(&self) -> bool { self.minimized }

    pub fn is_single_panel(&self) -> bool { self.single_panel }

    /// The level closed a column that was merged into the next one; expanding
    /// it again splits the column here.
    pub fn is_merge_boundary(&self) -> bool { self.merge_boundary }
}

#[derive(Debug)]
pub struct WrapperNode {
    pub(crate) level: LevelId,
    pub(crate) wrapper: PanelWrapper,
}

/// Arena owning every group, column, level and wrapper of a manager.
///
/// Children are owned through id lists; parent ids are lookups only.
/// Every structural edit keeps each column non-empty.
#[derive(Debug, Default)]
pub struct PanelTree {
    groups: SlotMap<GroupId, GroupNode>,
    group_order: Vec<GroupId>,
    columns: SlotMap<ColumnId, ColumnNode>,
    levels: SlotMap<LevelId, LevelNode>,
    wrappers: SlotMap<WrapperId, WrapperNode>,
}

impl PanelTree {
    pub fn new() -> Self { Self::default() }

    pub fn groups(&self) -> &[GroupId] { &self.group_order }

    pub fn group(&self, id: GroupId) -> Option<&GroupNode> { self.groups.get(id) }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut GroupNode> {
        self.groups.get_mut(id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&ColumnNode> { self.columns.get(id) }

    pub(crate) fn column_mut(&mut self, id: ColumnId) -> Option<&mut ColumnNode> {
        self.columns.get_mut(id)
    }

    pub fn level(&self, id: LevelId) -> Option<&LevelNode> { self.levels.get(id) }

    pub(crate) fn level_mut(&mut self, id: LevelId) -> Option<&mut LevelNode> {
        self.levels.get_mut(id)
    }

    pub fn wrapper(&self, id: WrapperId) -> Option<&PanelWrapper> {
        self.wrappers.get(id).map(|n| &n.wrapper)
    }

    pub(crate) fn wrapper_mut(&mut self, id: WrapperId) -> Option<&mut PanelWrapper> {
        self.wrappers.get_mut(id).map(|n| &mut n.wrapper)
    }

    pub fn group_index(&self, id: GroupId) -> Option<usize> {
        self.group_order.iter().position(|&g| g == id)
    }

    pub fn level_of(&self, wrapper: WrapperId) -> Option<LevelId> {
        self.wrappers.get(wrapper).map(|n| n.level)
    }

    pub fn column_of(&self, level: LevelId) -> Option<ColumnId> {
        self.levels.get(level).map(|n| n.column)
    }

    pub fn group_of_level(&self, level: LevelId) -> Option<GroupId> {
        self.column_of(level).and_then(|c| self.columns.get(c)).map(|c| c.group)
    }

    pub fn column_count(&self, group: GroupId) -> usize {
        self.groups.get(group).map_or(0, |g| g.columns.len())
    }

    /// Levels of a group in drill-down order, across column boundaries.
    pub fn flat_levels(&self, group: GroupId) -> Vec<LevelId> {
        let Some(group) = self.groups.get(group) else {
            return Vec::new();
        };
        group
            .columns
            .iter()
            .flat_map(|&c| self.columns[c].levels.iter().copied())
            .collect()
    }

    pub fn level_count(&self, group: GroupId) -> usize {
        self.groups
            .get(group)
            .map_or(0, |g| g.columns.iter().map(|&c| self.columns[c].levels.len()).sum())
    }

    pub fn level_position(&self, level: LevelId) -> Option<usize> {
        let group = self.group_of_level(level)?;
        self.flat_levels(group).iter().position(|&l| l == level)
    }

    /// Wrappers of a group, depth first: columns, then levels, then wrappers.
    pub fn group_wrappers(&self, group: GroupId) -> Vec<WrapperId> {
        self.flat_levels(group)
            .into_iter()
            .flat_map(|l| self.levels[l].wrappers.iter().copied())
            .collect()
    }

    pub fn all_wrappers(&self) -> Vec<WrapperId> {
        self.group_order.iter().flat_map(|&g| self.group_wrappers(g)).collect()
    }

    pub fn column_index(&self, column: ColumnId) -> Option<usize> {
        let group = self.columns.get(column)?.group;
        self.groups[group].columns.iter().position(|&c| c == column)
    }

    pub fn next_column(&self, column: ColumnId) -> Option<ColumnId> {
        let group = self.columns.get(column)?.group;
        let index = self.column_index(column)?;
        self.groups[group].columns.get(index + 1).copied()
    }

    /// True if `level` is the last level of its column.
    pub fn is_terminal(&self, level: LevelId) -> bool {
        self.column_of(level)
            .and_then(|c| self.columns[c].levels.last().copied())
            .is_some_and(|last| last == level)
    }

    pub fn add_group(&mut self) -> GroupId {
        let id = self.groups.insert(GroupNode::default());
        self.group_order.push(id);
        id
    }

    /// Removes a group and tears down every panel inside it.
    pub fn remove_group(&mut self, id: GroupId) -> bool {
        let Some(group) = self.groups.remove(id) else {
            return false;
        };
        self.group_order.retain(|&g| g != id);
        for column in group.columns {
            self.release_column(column);
        }
        true
    }

    /// Appends a level to the last column of `group`, creating the first
    /// column if the group has none.
    pub fn push_level(&mut self, group: GroupId, single_panel: bool) -> Option<LevelId> {
        let last = self.groups.get(group)?.columns.last().copied();
        match last {
            Some(column) => Some(self.attach_level(column, single_panel)),
            None => self.push_level_in_new_column(group, single_panel),
        }
    }

    /// Appends a new column holding a single new level.
    pub fn push_level_in_new_column(
        &mut self,
        group: GroupId,
        single_panel: bool,
    ) -> Option<LevelId> {
        if !self.groups.contains_key(group) {
            return None;
        }
        let column = self.columns.insert(ColumnNode {
            group,
            levels: Vec::new(),
            percent: 0.0,
        });
        self.groups[group].columns.push(column);
        Some(self.attach_level(column, single_panel))
    }

    fn attach_level(&mut self, column: ColumnId, single_panel: bool) -> LevelId {
        let level = self.levels.insert(LevelNode {
            column,
            wrappers: Vec::new(),
            allowed: Vec::new(),
            minimized: false,
            single_panel,
            merge_boundary: false,
        });
        self.columns[column].levels.push(level);
        level
    }

    /// Removes the last level of the group's last column, and that column if
    /// it ends up empty.
    pub fn remove_last_level(&mut self, group: GroupId) -> bool {
        let Some(&column) = self.groups.get(group).and_then(|g| g.columns.last()) else {
            return false;
        };
        let Some(level) = self.columns[column].levels.pop() else {
            return false;
        };
        self.release_level(level);
        if self.columns[column].levels.is_empty() {
            self.groups[group].columns.pop();
            self.columns.remove(column);
        }
        true
    }

    /// Moves every level of `column`, in order, to the front of the next
    /// column and deletes `column`. The last moved level is marked as the
    /// merge boundary. Returns the receiving column.
    pub fn merge_into_next_column(&mut self, column: ColumnId) -> Option<ColumnId> {
        let target = self.next_column(column)?;
        let group = self.columns[column].group;
        let moved = std::mem::take(&mut self.columns[column].levels);
        if let Some(&last) = moved.last() {
            self.levels[last].merge_boundary = true;
        }
        for &level in &moved {
            self.levels[level].column = target;
        }
        let tail = std::mem::replace(&mut self.columns[target].levels, moved);
        self.columns[target].levels.extend(tail);
        self.groups[group].columns.retain(|&c| c != column);
        self.columns.remove(column);
        Some(target)
    }

    /// Splits the column holding `level` so that a new column, inserted at
    /// the same position, receives every level up to and including `level`.
    /// Does nothing when `level` is already last in its column.
    pub fn split_column_after(&mut self, level: LevelId) -> Option<ColumnId> {
        let column = self.column_of(level)?;
        let index = self.columns[column].levels.iter().position(|&l| l == level)?;
        if index + 1 == self.columns[column].levels.len() {
            return None;
        }
        let group = self.columns[column].group;
        let column_index = self.column_index(column)?;

        let moved: Vec<_> = self.columns[column].levels.drain(..=index).collect();
        let new_column = self.columns.insert(ColumnNode {
            group,
            levels: Vec::new(),
            percent: 0.0,
        });
        for &l in &moved {
            self.levels[l].column = new_column;
        }
        self.columns[new_column].levels = moved;
        self.groups[group].columns.insert(column_index, new_column);
        Some(new_column)
    }

    /// Clears the merge boundary of `level`, returning whether it was set.
    pub fn take_merge_boundary(&mut self, level: LevelId) -> bool {
        self.levels.get_mut(level).is_some_and(|l| std::mem::take(&mut l.merge_boundary))
    }

    pub fn insert_wrapper(&mut self, level: LevelId, wrapper: PanelWrapper) -> Option<WrapperId> {
        if !self.levels.contains_key(level) {
            return None;
        }
        let id = self.wrappers.insert(WrapperNode { level, wrapper });
        self.levels[level].wrappers.push(id);
        Some(id)
    }

    /// Detaches a wrapper and tears its panel down.
    pub fn remove_wrapper(&mut self, id: WrapperId) -> bool {
        let Some(node) = self.wrappers.remove(id) else {
            return false;
        };
        if let Some(level) = self.levels.get_mut(node.level) {
            level.wrappers.retain(|&w| w != id);
        }
        node.wrapper.teardown();
        true
    }

    fn release_column(&mut self, column: ColumnId) {
        if let Some(node) = self.columns.remove(column) {
            for level in node.levels {
                self.release_level(level);
            }
        }
    }

    fn release_level(&mut self, level: LevelId) {
        if let Some(node) = self.levels.remove(level) {
            for wrapper in node.wrappers {
                if let Some(w) = self.wrappers.remove(wrapper) {
                    w.wrapper.teardown();
                }
            }
        }
    }

    /// Verifies ownership links and that no column is empty.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.group_order.len() != self.groups.len() {
            return Err("group order out of sync with group arena".to_string());
        }
        let mut columns = 0;
        let mut levels = 0;
        let mut wrappers = 0;
        for &g in &self.group_order {
            let group = self.groups.get(g).ok_or("ordered group missing from arena")?;
            for &c in &group.columns {
                let column = self.columns.get(c).ok_or("column missing from arena")?;
                columns += 1;
                if column.group != g {
                    return Err(format!("column {c:?} points at the wrong group"));
                }
                if column.levels.is_empty() {
                    return Err(format!("column {c:?} has no levels"));
                }
                for &l in &column.levels {
                    let level = self.levels.get(l).ok_or("level missing from arena")?;
                    levels += 1;
                    if level.column != c {
                        return Err(format!("level {l:?} points at the wrong column"));
                    }
                    for &w in &level.wrappers {
                        let wrapper = self.wrappers.get(w).ok_or("wrapper missing from arena")?;
                        wrappers += 1;
                        if wrapper.level != l {
                            return Err(format!("wrapper {w:?} points at the wrong level"));
                        }
                    }
                }
            }
        }
        if columns != self.columns.len() || levels != self.levels.len() {
            return Err("unreachable columns or levels in arena".to_string());
        }
        if wrappers != self.wrappers.len() {
            return Err("unreachable wrappers in arena".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::Panel;

    struct Blank;

    impl Panel for Blank {
        fn min_width(&self) -> u32 { 100 }
        fn max_width(&self) -> u32 { 100 }
        fn min_height(&self) -> u32 { 100 }
        fn allowed_panel_names(&self) -> Vec<String> { vec![] }
    }

    fn wrapper(name: &str) -> PanelWrapper { PanelWrapper::new(name, Box::new(Blank)) }

    /// Columns of a group as lists of level positions in `levels`.
    fn shape(tree: &PanelTree, group: GroupId, levels: &[LevelId]) -> Vec<Vec<usize>> {
        tree.group(group)
            .unwrap()
            .columns()
            .iter()
            .map(|&c| {
                tree.column(c)
                    .unwrap()
                    .levels()
                    .iter()
                    .map(|l| levels.iter().position(|x| x == l).unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn push_level_appends_to_last_column() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let l0 = tree.push_level(g, true).unwrap();
        let l1 = tree.push_level(g, false).unwrap();
        assert_eq!(tree.column_count(g), 1);
        assert_eq!(tree.flat_levels(g), vec![l0, l1]);
        assert!(tree.level(l0).unwrap().is_single_panel());
        assert!(tree.is_terminal(l1));
        assert!(!tree.is_terminal(l0));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_last_level_drops_empty_columns() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let l0 = tree.push_level(g, false).unwrap();
        tree.push_level_in_new_column(g, false).unwrap();
        assert_eq!(tree.column_count(g), 2);

        assert!(tree.remove_last_level(g));
        assert_eq!(tree.column_count(g), 1);
        assert_eq!(tree.flat_levels(g), vec![l0]);
        assert!(tree.remove_last_level(g));
        assert_eq!(tree.column_count(g), 0);
        assert!(!tree.remove_last_level(g));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn merge_then_split_restores_partition() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let l0 = tree.push_level(g, false).unwrap();
        let l1 = tree.push_level(g, false).unwrap();
        let l2 = tree.push_level_in_new_column(g, false).unwrap();
        let l3 = tree.push_level(g, false).unwrap();
        let levels = [l0, l1, l2, l3];
        assert_eq!(shape(&tree, g, &levels), vec![vec![0, 1], vec![2, 3]]);

        let first = tree.group(g).unwrap().columns()[0];
        let target = tree.merge_into_next_column(first).unwrap();
        assert_eq!(shape(&tree, g, &levels), vec![vec![0, 1, 2, 3]]);
        assert_eq!(tree.column_of(l0), Some(target));
        assert!(tree.level(l1).unwrap().is_merge_boundary());
        assert!(!tree.level(l0).unwrap().is_merge_boundary());
        assert_eq!(tree.level_count(g), 4);
        tree.check_invariants().unwrap();

        assert!(tree.take_merge_boundary(l1));
        assert!(!tree.take_merge_boundary(l1));
        tree.split_column_after(l1).unwrap();
        assert_eq!(shape(&tree, g, &levels), vec![vec![0, 1], vec![2, 3]]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn split_of_terminal_level_is_a_no_op() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        tree.push_level(g, false).unwrap();
        let l1 = tree.push_level(g, false).unwrap();
        assert!(tree.split_column_after(l1).is_none());
        assert_eq!(tree.column_count(g), 1);
    }

    #[test]
    fn merge_without_next_column_is_refused() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let l0 = tree.push_level(g, false).unwrap();
        let column = tree.column_of(l0).unwrap();
        assert!(tree.merge_into_next_column(column).is_none());
        assert_eq!(tree.column_count(g), 1);
    }

    #[test]
    fn wrappers_are_tracked_depth_first() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let l0 = tree.push_level(g, false).unwrap();
        let l1 = tree.push_level_in_new_column(g, false).unwrap();
        let b = tree.insert_wrapper(l1, wrapper("b")).unwrap();
        let a = tree.insert_wrapper(l0, wrapper("a")).unwrap();
        let c = tree.insert_wrapper(l1, wrapper("c")).unwrap();
        assert_eq!(tree.group_wrappers(g), vec![a, b, c]);
        assert_eq!(tree.level_of(c), Some(l1));
        assert_eq!(tree.level_position(l1), Some(1));

        assert!(tree.remove_wrapper(b));
        assert!(!tree.remove_wrapper(b));
        assert_eq!(tree.level(l1).unwrap().wrappers(), &[c]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_group_releases_everything() {
        let mut tree = PanelTree::new();
        let g = tree.add_group();
        let keep = tree.add_group();
        let l0 = tree.push_level(g, false).unwrap();
        tree.insert_wrapper(l0, wrapper("a")).unwrap();
        assert!(tree.remove_group(g));
        assert_eq!(tree.groups(), &[keep]);
        assert!(tree.all_wrappers().is_empty());
        tree.check_invariants().unwrap();
    }
}
