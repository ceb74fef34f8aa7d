use tracing::{debug, trace};

use super::panel::Panel;
use crate::common::config::Settings;
use crate::model::lock_queue::LockQueue;

/// Work deferred until a locked panel is unlocked.
pub type LockedCallback = Box<dyn FnOnce(&mut dyn Panel)>;

/// Layout-owned envelope around one panel: minimize and lock chrome plus
/// size delegation.
pub struct PanelWrapper {
    panel_name: String,
    panel: Box<dyn Panel>,
    minimized: bool,
    locked: bool,
    queue: LockQueue<LockedCallback>,
}

impl PanelWrapper {
    pub fn new(panel_name: impl Into<String>, panel: Box<dyn Panel>) -> Self {
        Self {
            panel_name: panel_name.into(),
            panel,
            minimized: false,
            locked: false,
            queue: LockQueue::new(),
        }
    }

    pub fn panel_name(&self) -> &str { &self.panel_name }

    pub fn panel(&self) -> &dyn Panel { &*self.panel }

    pub fn panel_mut(&mut self) -> &mut dyn Panel { &mut *self.panel }

    pub fn is_minimized(&self) -> bool { self.minimized }

    pub fn is_locked(&self) -> bool { self.locked }

    pub fn min_width(&self, settings: &Settings) -> u32 {
        if self.minimized { settings.minimized_width } else { self.panel.min_width() }
    }

    pub fn max_width(&self, settings: &Settings) -> u32 {
        if self.minimized { settings.minimized_width } else { self.panel.max_width() }
    }

    /// Width the panel needs once unminimized.
    pub fn expanded_min_width(&self) -> u32 { self.panel.min_width() }

    pub fn min_height(&self, settings: &Settings) -> u32 {
        self.panel.min_height() + settings.header_height
    }

    /// Updates the flag and tells the panel. Propagation to the containers is
    /// the manager's job; see `PanelManager::set_minimize`.
    pub(super) fn apply_minimized(&mut self, minimized: bool) -> bool {
        if self.minimized == minimized {
            return false;
        }
        self.minimized = minimized;
        self.panel.set_minimized(minimized);
        true
    }

    /// Restores a persisted flag without notifying anything.
    pub(super) fn restore_minimized(&mut self, minimized: bool) {
        self.minimized = minimized;
        if minimized {
            self.panel.set_minimized(true);
        }
    }

    /// Flips the lock and returns the new state. Unlocking flushes deferred work.
    pub fn toggle_lock(&mut self) -> bool {
        if self.locked {
            self.unlock();
        } else {
            self.locked = true;
            trace!(panel = %self.panel_name, "locked");
        }
        self.locked
    }

    pub fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        let pending: Vec<_> = self.queue.drain().collect();
        trace!(panel = %self.panel_name, pending = pending.len(), "unlocked");
        for (_, callback) in pending {
            callback(&mut *self.panel);
        }
    }

    /// Runs `callback` now if the panel is unlocked, otherwise queues it under
    /// `queue_id`. Returns true if it ran immediately.
    pub fn filter_through_panel_lock(
        &mut self,
        queue_id: impl Into<String>,
        callback: impl FnOnce(&mut dyn Panel) + 'static,
    ) -> bool {
        if !self.locked {
            callback(&mut *self.panel);
            return true;
        }
        let queue_id = queue_id.into();
        if self.queue.push(queue_id.clone(), Box::new(callback)) {
            trace!(panel = %self.panel_name, %queue_id, "replaced deferred callback");
        }
        false
    }

    pub fn pending_callbacks(&self) -> usize { self.queue.len() }

    /// Releases the panel. Deferred callbacks are discarded.
    pub fn teardown(mut self) {
        if !self.queue.is_empty() {
            debug!(
                panel = %self.panel_name,
                discarded = ?self.queue,
                "dropping deferred callbacks of a removed panel"
            );
        }
        self.panel.teardown();
    }
}

impl std::fmt::Debug for PanelWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelWrapper")
            .field("panel_name", &self.panel_name)
            .field("minimized", &self.minimized)
            .field("locked", &self.locked)
            .field("queue", &self.queue)
            .finish()
    }
}
