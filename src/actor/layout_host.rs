//! Actor that owns a [`PanelManager`] and feeds it window and user events.
//!
//! The manager is not `Send`; run the host on a current-thread runtime.

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::actor;
use crate::common::state::LayoutStore;
use crate::layout_engine::{PanelManager, SavedLayout};
use crate::model::{LevelId, Selection, SelectionChanges, WrapperId};

#[derive(Debug)]
pub enum Event {
    WindowResized(u32),
    /// `group: None` applies the changes to every group.
    ChangeSelection {
        group: Option<usize>,
        changes: SelectionChanges,
    },
    SetMinimize {
        wrapper: WrapperId,
        minimized: bool,
    },
    TogglePanel {
        level: LevelId,
        panel_name: String,
    },
    ToggleLock(WrapperId),
    Save,
    DrawTree(oneshot::Sender<String>),
    Snapshot(oneshot::Sender<SavedLayout>),
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

pub struct LayoutHost {
    manager: PanelManager,
    store: Box<dyn LayoutStore>,
    rx: Receiver,
}

impl LayoutHost {
    /// Restores the saved layout, or derives a fresh one when nothing usable
    /// was saved.
    pub fn new(mut manager: PanelManager, store: impl LayoutStore + 'static, rx: Receiver) -> Self {
        match store.load() {
            Ok(Some(layout)) => manager.restore(&layout),
            Ok(None) => derive_fresh(&mut manager),
            Err(e) => {
                warn!("could not load saved layout: {e:#}");
                derive_fresh(&mut manager);
            }
        }
        Self { manager, store: Box::new(store), rx }
    }

    pub fn manager(&self) -> &PanelManager { &self.manager }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                maybe = self.rx.recv() => {
                    match maybe {
                        Some((span, event)) => {
                            let _enter = span.enter();
                            self.handle_event(event);
                        }
                        None => break,
                    }
                }
                _ = sleep_until(self.manager.next_deadline()) => {}
            }
            self.manager.tick(Instant::now().into_std());
            self.save_if_changed();
        }

        debug!("layout host shutting down");
        self.manager.flush();
        self.save();
    }

    fn handle_event(&mut self, event: Event) {
        let now = Instant::now().into_std();
        let result = match event {
            Event::WindowResized(width) => {
                self.manager.request_resize(width, now);
                Ok(())
            }
            Event::ChangeSelection { group: None, changes } => {
                self.manager.change_selection(&changes).map(drop)
            }
            Event::ChangeSelection { group: Some(index), changes } => {
                match self.manager.groups().get(index).copied() {
                    Some(group) => self.manager.change_group_selection(group, &changes).map(drop),
                    None => {
                        warn!(index, "selection for unknown group ignored");
                        Ok(())
                    }
                }
            }
            Event::SetMinimize { wrapper, minimized } => {
                self.manager.set_minimize(wrapper, minimized).map(drop)
            }
            Event::TogglePanel { level, panel_name } => {
                self.manager.toggle_panel(level, &panel_name).map(drop)
            }
            Event::ToggleLock(wrapper) => self.manager.toggle_lock(wrapper).map(drop),
            Event::Save => {
                self.save();
                Ok(())
            }
            Event::DrawTree(reply) => {
                _ = reply.send(self.manager.draw_tree());
                Ok(())
            }
            Event::Snapshot(reply) => {
                _ = reply.send(self.manager.snapshot());
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("layout event failed: {e}");
        }
    }

    fn save_if_changed(&mut self) {
        if self.manager.take_structure_changed() {
            self.save();
        }
    }

    fn save(&mut self) {
        self.manager.take_structure_changed();
        match self.store.save(&self.manager.snapshot()) {
            Ok(()) => debug!("layout saved"),
            Err(e) => error!("failed to save layout: {e:#}"),
        }
    }
}

fn derive_fresh(manager: &mut PanelManager) {
    info!("no saved layout, deriving from the root panel");
    if let Err(e) = manager.change_selection(&Selection::new()) {
        warn!("initial layout failed: {e}");
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
