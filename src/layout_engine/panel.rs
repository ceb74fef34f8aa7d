use crate::common::collections::HashMap;
use crate::model::selection::SelectionChanges;

/// Content hosted by a [`PanelWrapper`](super::PanelWrapper).
///
/// The layout engine never looks inside a panel; it only relies on the size
/// contract and on the names a panel allows at the next level.
pub trait Panel {
    fn min_width(&self) -> u32;
    fn max_width(&self) -> u32;
    fn min_height(&self) -> u32;

    /// Called after the wrapper's minimize flag changed.
    fn set_minimized(&mut self, _minimized: bool) {}

    /// Panels this one permits to exist at the next level.
    fn allowed_panel_names(&self) -> Vec<String>;

    /// Subset of the allowed names to open when nothing is active at the next level.
    fn autoactivated_panel_names(&self) -> Vec<String> { Vec::new() }

    /// Receives upstream selection updates. A panel that needs the levels
    /// below it re-derived asks for it through `cx`.
    fn change_selection(&mut self, _changes: &SelectionChanges, _cx: &mut PanelContext) {}

    /// Releases listeners, timers and other resources before the panel is dropped.
    fn teardown(&mut self) {}
}

/// Builds panels by name. Every call returns a fresh instance.
pub trait PanelFactory {
    fn create_panel_by_name(&self, name: &str) -> Option<Box<dyn Panel>>;
}

/// Handle given to panels while they react to a selection change.
#[derive(Debug, Default)]
pub struct PanelContext {
    relayout_requested: bool,
}

impl PanelContext {
    pub fn new() -> Self { Self::default() }

    /// Queues another derivation pass once the current one finishes.
    pub fn request_relayout(&mut self) { self.relayout_requested = true; }

    pub fn relayout_requested(&self) -> bool { self.relayout_requested }

    pub(crate) fn take_relayout(&mut self) -> bool { std::mem::take(&mut self.relayout_requested) }
}

type Constructor = Box<dyn Fn() -> Box<dyn Panel>>;

/// A [`PanelFactory`] backed by named constructors.
#[derive(Default)]
pub struct PanelRegistry {
    constructors: HashMap<String, Constructor>,
}

impl PanelRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn register<P, F>(&mut self, name: impl Into<String>, make: F) -> &mut Self
    where
        P: Panel + 'static,
        F: Fn() -> P + 'static,
    {
        self.constructors.insert(name.into(), Box::new(move || Box::new(make())));
        self
    }

    pub fn contains(&self, name: &str) -> bool { self.constructors.contains_key(name) }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.constructors.keys().map(String::as_str) }
}

impl PanelFactory for PanelRegistry {
    fn create_panel_by_name(&self, name: &str) -> Option<Box<dyn Panel>> {
        self.constructors.get(name).map(|make| make())
    }
}

impl std::fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}
