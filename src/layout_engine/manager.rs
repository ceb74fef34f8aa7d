use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::error::LayoutError;
use super::panel::{Panel, PanelContext, PanelFactory};
use super::scheduler::Debounce;
use crate::common::config::Settings;
use crate::model::{GroupId, LevelId, PanelTree, Selection, SelectionChanges, WrapperId};

/// Upper bound on derivation passes triggered by panels asking for a relayout.
const MAX_PASSES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinimizeOrigin {
    /// Explicit request from the user or an embedding UI.
    User,
    /// Issued by the window-fit reflow.
    Fit,
}

/// Root of the layout: owns every group and drives selection, minimize
/// propagation, window fit and percentage widths.
pub struct PanelManager {
    pub(super) tree: PanelTree,
    pub(super) factory: Box<dyn PanelFactory>,
    pub(super) settings: Settings,
    pub(super) fit_to_window: bool,
    pub(super) window_width: Option<u32>,
    pending_width: Option<u32>,
    resize: Debounce,
    reset_percent: Debounce,
    pub(super) percent_stale: bool,
    pub(super) structure_changed: bool,
}

impl PanelManager {
    /// Creates `settings.group_count` empty groups. Call
    /// [`change_selection`](Self::change_selection) or
    /// [`restore`](Self::restore) to populate them.
    pub fn new(settings: Settings, factory: impl PanelFactory + 'static) -> Self {
        let mut tree = PanelTree::new();
        for _ in 0..settings.group_count.max(1) {
            tree.add_group();
        }
        Self {
            tree,
            factory: Box::new(factory),
            fit_to_window: settings.fit_to_window,
            window_width: None,
            pending_width: None,
            resize: Debounce::new(settings.resize_debounce()),
            reset_percent: Debounce::new(settings.reset_percent_debounce()),
            percent_stale: false,
            structure_changed: false,
            settings,
        }
    }

    pub fn tree(&self) -> &PanelTree { &self.tree }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn groups(&self) -> &[GroupId] { self.tree.groups() }

    pub fn group_index(&self, group: GroupId) -> Option<usize> { self.tree.group_index(group) }

    pub fn fit_to_window(&self) -> bool { self.fit_to_window }

    pub fn window_width(&self) -> Option<u32> { self.window_width }

    pub fn group_selection(&self, group: GroupId) -> Option<&Selection> {
        self.tree.group(group).map(|g| g.selection())
    }

    /// The wrappers of a level, in display order.
    pub fn level_wrappers(&self, level: LevelId) -> &[WrapperId] {
        self.tree.level(level).map(|l| l.wrappers()).unwrap_or(&[])
    }

    pub fn is_panel_minimized(&self, wrapper: WrapperId) -> bool {
        self.tree.wrapper(wrapper).is_some_and(|w| w.is_minimized())
    }

    pub fn panel_name(&self, wrapper: WrapperId) -> Option<&str> {
        self.tree.wrapper(wrapper).map(|w| w.panel_name())
    }

    /// First wrapper of `group` showing `panel_name`, depth first.
    pub fn find_wrapper(&self, group: GroupId, panel_name: &str) -> Option<WrapperId> {
        self.tree
            .group_wrappers(group)
            .into_iter()
            .find(|&w| self.panel_name(w) == Some(panel_name))
    }

    /// A group is minimized when it has levels and every one of them is.
    pub fn is_group_minimized(&self, group: GroupId) -> bool {
        let levels = self.tree.flat_levels(group);
        !levels.is_empty()
            && levels.iter().all(|&l| self.tree.level(l).is_some_and(|l| l.is_minimized()))
    }

    /// Reports and clears whether the persisted structure changed since the
    /// last call.
    pub fn take_structure_changed(&mut self) -> bool { std::mem::take(&mut self.structure_changed) }

    pub(super) fn mark_structure_changed(&mut self) {
        self.structure_changed = true;
        self.percent_stale = true;
    }

    /// Opens a new group and derives its levels from the root panel.
    pub fn add_group(&mut self) -> GroupId {
        let group = self.tree.add_group();
        info!(index = self.tree.groups().len() - 1, "group added");
        if let Err(e) = self.run_passes(group) {
            warn!("initial layout of new group failed: {e}");
        }
        self.mark_structure_changed();
        group
    }

    pub fn close_group(&mut self, group: GroupId) -> Result<(), LayoutError> {
        if self.tree.group(group).is_none() {
            return Err(LayoutError::stale_group(group));
        }
        if self.tree.groups().len() == 1 {
            warn!(?group, "refusing to close the last group");
            return Err(LayoutError::LastGroup(group));
        }
        self.tree.remove_group(group);
        info!(?group, "group closed");
        self.mark_structure_changed();
        Ok(())
    }

    /// Appends an empty level to the last column of `group`.
    pub fn append_level(&mut self, group: GroupId) -> Result<LevelId, LayoutError> {
        let position = self.tree.level_count(group);
        let single_panel = self.settings.is_single_panel_level(position);
        let level = self
            .tree
            .push_level(group, single_panel)
            .ok_or_else(|| LayoutError::stale_group(group))?;
        self.mark_structure_changed();
        Ok(level)
    }

    /// Merges `changes` into every group and re-derives their levels.
    pub fn change_selection(&mut self, changes: &SelectionChanges) -> Result<bool, LayoutError> {
        let mut changed = false;
        for group in self.tree.groups().to_vec() {
            changed |= self.change_group_selection(group, changes)?;
        }
        Ok(changed)
    }

    /// Merges `changes` into one group's selection, broadcasts them to the
    /// group's panels and re-derives its levels.
    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    pub fn change_group_selection(
        &mut self,
        group: GroupId,
        changes: &SelectionChanges,
    ) -> Result<bool, LayoutError> {
        let node = self.tree.group_mut(group).ok_or_else(|| LayoutError::stale_group(group))?;
        node.selection.merge(changes);

        // The pass below runs regardless, so relayout requests made during
        // the broadcast need no follow-up.
        let mut cx = PanelContext::new();
        for wrapper in self.tree.group_wrappers(group) {
            if let Some(w) = self.tree.wrapper_mut(wrapper) {
                w.panel_mut().change_selection(changes, &mut cx);
            }
        }

        self.run_passes(group)
    }

    /// Re-derives the levels of `group` without changing its selection.
    pub fn relayout(&mut self, group: GroupId) -> Result<bool, LayoutError> {
        self.run_passes(group)
    }

    /// Runs derivation passes until no panel asks for another one.
    fn run_passes(&mut self, group: GroupId) -> Result<bool, LayoutError> {
        let mut changed = false;
        for pass in 0..MAX_PASSES {
            let mut cx = PanelContext::new();
            changed |= self.selection_pass(group, &mut cx)?;
            if !cx.take_relayout() {
                return Ok(changed);
            }
            debug!(pass, "panel requested another layout pass");
        }
        warn!(?group, "layout did not settle after {MAX_PASSES} passes");
        Ok(changed)
    }

    /// Builds a panel and hands it the current selection of the level's group.
    pub(super) fn create_panel(
        &mut self,
        level: LevelId,
        panel_name: &str,
        cx: &mut PanelContext,
    ) -> Result<Box<dyn Panel>, LayoutError> {
        let Some(mut panel) = self.factory.create_panel_by_name(panel_name) else {
            return Err(LayoutError::UnknownPanel(panel_name.to_string()));
        };
        let selection = self
            .tree
            .group_of_level(level)
            .and_then(|g| self.tree.group(g))
            .map(|g| g.selection().clone())
            .unwrap_or_default();
        if !selection.is_empty() {
            panel.change_selection(&selection, cx);
        }
        Ok(panel)
    }

    /// True if minimizing `wrapper` keeps every column valid: a level may
    /// become fully minimized only while it is last in its column or its
    /// column is the last one.
    pub fn can_minimize(&self, wrapper: WrapperId) -> bool {
        let Some(level) = self.tree.level_of(wrapper) else {
            return false;
        };
        let Some(node) = self.tree.level(level) else {
            return false;
        };
        let others_expanded = node
            .wrappers()
            .iter()
            .any(|&w| w != wrapper && self.tree.wrapper(w).is_some_and(|w| !w.is_minimized()));
        if others_expanded {
            return true;
        }
        let last_column = self.tree.next_column(node.column()).is_none();
        last_column || self.tree.is_terminal(level)
    }

    /// Minimizes or restores one panel. The wrapper is the only place
    /// minimize state changes; the level, column and manager aggregates
    /// follow from here.
    pub fn set_minimize(&mut self, wrapper: WrapperId, minimized: bool) -> Result<bool, LayoutError> {
        self.set_minimize_from(wrapper, minimized, MinimizeOrigin::User)
    }

    pub(super) fn set_minimize_from(
        &mut self,
        wrapper: WrapperId,
        minimized: bool,
        origin: MinimizeOrigin,
    ) -> Result<bool, LayoutError> {
        let current = self.tree.wrapper(wrapper).ok_or_else(|| LayoutError::stale_wrapper(wrapper))?;
        if current.is_minimized() == minimized {
            return Ok(false);
        }
        let level = self.tree.level_of(wrapper).ok_or_else(|| LayoutError::stale_wrapper(wrapper))?;
        if minimized && !self.can_minimize(wrapper) {
            warn!(?wrapper, ?level, "minimize refused on a non-terminal level");
            return Err(LayoutError::NonTerminalLevel(level));
        }

        if let Some(w) = self.tree.wrapper_mut(wrapper) {
            w.apply_minimized(minimized);
            debug!(panel = w.panel_name(), minimized, ?origin, "minimize changed");
        }
        self.update_level_minimize(level);
        self.update_minimize(minimized, origin);
        self.mark_structure_changed();
        Ok(true)
    }

    /// Manager-level reaction to a minimize change: a user restoring a panel
    /// that makes the layout overflow switches to a scrollable layout.
    fn update_minimize(&mut self, minimized: bool, origin: MinimizeOrigin) {
        if minimized || origin != MinimizeOrigin::User || !self.fit_to_window {
            return;
        }
        if let Some(width) = self.window_width {
            if self.min_width() > width {
                info!(width, needed = self.min_width(), "layout overflows, fit to window disabled");
                self.fit_to_window = false;
            }
        }
    }

    pub fn toggle_lock(&mut self, wrapper: WrapperId) -> Result<bool, LayoutError> {
        let w = self.tree.wrapper_mut(wrapper).ok_or_else(|| LayoutError::stale_wrapper(wrapper))?;
        Ok(w.toggle_lock())
    }

    /// See [`PanelWrapper::filter_through_panel_lock`](super::PanelWrapper::filter_through_panel_lock).
    pub fn filter_through_panel_lock(
        &mut self,
        wrapper: WrapperId,
        queue_id: impl Into<String>,
        callback: impl FnOnce(&mut dyn Panel) + 'static,
    ) -> Result<bool, LayoutError> {
        let w = self.tree.wrapper_mut(wrapper).ok_or_else(|| LayoutError::stale_wrapper(wrapper))?;
        Ok(w.filter_through_panel_lock(queue_id, callback))
    }

    /// Records a new window width; the reflow runs once the burst settles.
    pub fn request_resize(&mut self, width: u32, now: Instant) {
        self.pending_width = Some(width);
        self.resize.schedule(now);
    }

    pub fn request_reset_percent(&mut self, now: Instant) {
        self.percent_stale = false;
        self.reset_percent.schedule(now);
    }

    /// Arms the percentage recompute after structural changes and runs
    /// whatever work is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.arm_reset_percent(now);
        if self.resize.fire(now) {
            if let Some(width) = self.pending_width.take() {
                self.resize_base(width);
            }
            self.arm_reset_percent(now);
        }
        if self.reset_percent.fire(now) {
            self.reset_percent_base();
        }
    }

    fn arm_reset_percent(&mut self, now: Instant) {
        if std::mem::take(&mut self.percent_stale) {
            self.reset_percent.schedule(now);
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.resize.deadline(), self.reset_percent.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn has_pending_work(&self) -> bool {
        self.percent_stale || self.resize.is_pending() || self.reset_percent.is_pending()
    }

    /// Runs all pending work immediately.
    pub fn flush(&mut self) {
        if self.resize.take() {
            if let Some(width) = self.pending_width.take() {
                self.resize_base(width);
            }
        }
        let stale = std::mem::take(&mut self.percent_stale);
        if self.reset_percent.take() || stale {
            self.reset_percent_base();
        }
    }
}

impl std::fmt::Debug for PanelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelManager")
            .field("tree", &self.tree)
            .field("fit_to_window", &self.fit_to_window)
            .field("window_width", &self.window_width)
            .finish_non_exhaustive()
    }
}
