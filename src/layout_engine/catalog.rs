use std::rc::Rc;

use tracing::trace;

use super::panel::{Panel, PanelContext, PanelFactory};
use crate::common::collections::HashMap;
use crate::common::config::PanelDefinition;
use crate::model::selection::{Selection, SelectionChanges};

/// Factory for panels declared in the `[[panels]]` section of the config.
#[derive(Debug, Default, Clone)]
pub struct PanelCatalog {
    definitions: HashMap<String, Rc<PanelDefinition>>,
}

impl PanelCatalog {
    pub fn new(definitions: impl IntoIterator<Item = PanelDefinition>) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|def| (def.name.clone(), Rc::new(def)))
            .collect();
        Self { definitions }
    }

    pub fn definition(&self, name: &str) -> Option<&PanelDefinition> {
        self.definitions.get(name).map(|d| &**d)
    }

    pub fn len(&self) -> usize { self.definitions.len() }

    pub fn is_empty(&self) -> bool { self.definitions.is_empty() }
}

impl PanelFactory for PanelCatalog {
    fn create_panel_by_name(&self, name: &str) -> Option<Box<dyn Panel>> {
        let def = self.definitions.get(name)?;
        Some(Box::new(DeclaredPanel::new(def.clone())))
    }
}

/// A panel whose sizes and allowed children come from its definition.
/// Gated children are offered only while their selection key is set.
#[derive(Debug)]
pub struct DeclaredPanel {
    def: Rc<PanelDefinition>,
    selection: Selection,
    minimized: bool,
}

impl DeclaredPanel {
    pub fn new(def: Rc<PanelDefinition>) -> Self {
        Self {
            def,
            selection: Selection::new(),
            minimized: false,
        }
    }

    pub fn is_minimized(&self) -> bool { self.minimized }

    fn offered(&self, name: &str) -> bool {
        match self.def.gated_by.get(name) {
            Some(key) => self.selection.contains(key),
            None => true,
        }
    }

    fn filter_offered(&self, names: &[String]) -> Vec<String> {
        names.iter().filter(|n| self.offered(n)).cloned().collect()
    }
}

impl Panel for DeclaredPanel {
    fn min_width(&self) -> u32 { self.def.min_width }

    fn max_width(&self) -> u32 { self.def.max_width }

    fn min_height(&self) -> u32 { self.def.min_height }

    fn set_minimized(&mut self, minimized: bool) { self.minimized = minimized; }

    fn allowed_panel_names(&self) -> Vec<String> { self.filter_offered(&self.def.allowed) }

    fn autoactivated_panel_names(&self) -> Vec<String> {
        self.filter_offered(&self.def.autoactivated)
    }

    fn change_selection(&mut self, changes: &SelectionChanges, _cx: &mut PanelContext) {
        if self.selection.merge(changes) {
            trace!(panel = %self.def.name, "selection updated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea_list() -> PanelDefinition {
        PanelDefinition {
            name: "ideaList".to_string(),
            min_width: 320,
            max_width: 900,
            min_height: 200,
            allowed: vec!["ideaPanel".to_string(), "messageList".to_string()],
            autoactivated: vec!["ideaPanel".to_string(), "messageList".to_string()],
            gated_by: [("ideaPanel".to_string(), "currentIdea".to_string())].into(),
        }
    }

    #[test]
    fn gated_names_follow_selection() {
        let catalog = PanelCatalog::new([idea_list()]);
        let mut panel = catalog.create_panel_by_name("ideaList").unwrap();
        assert_eq!(panel.allowed_panel_names(), vec!["messageList"]);
        assert_eq!(panel.autoactivated_panel_names(), vec!["messageList"]);

        let mut cx = PanelContext::new();
        panel.change_selection(&Selection::new().with("currentIdea", 12), &mut cx);
        assert_eq!(panel.allowed_panel_names(), vec!["ideaPanel", "messageList"]);

        panel.change_selection(&Selection::new().with("currentIdea", serde_json::Value::Null), &mut cx);
        assert_eq!(panel.allowed_panel_names(), vec!["messageList"]);
        assert!(!cx.relayout_requested());
    }

    #[test]
    fn sizes_come_from_the_definition() {
        let catalog = PanelCatalog::new([idea_list()]);
        let panel = catalog.create_panel_by_name("ideaList").unwrap();
        assert_eq!((panel.min_width(), panel.max_width(), panel.min_height()), (320, 900, 200));
        assert!(catalog.create_panel_by_name("nope").is_none());
        assert_eq!(catalog.len(), 1);
    }
}
