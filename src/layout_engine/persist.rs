use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::error::LayoutError;
use super::manager::PanelManager;
use super::panel::PanelContext;
use super::wrapper::PanelWrapper;
use crate::model::{GroupId, LevelId};

pub const LAYOUT_VERSION: u32 = 1;

/// Structural state of a manager: which panels are open where, and whether
/// they are minimized.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedLayout {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub groups: Vec<SavedGroup>,
}

fn default_version() -> u32 { LAYOUT_VERSION }

impl Default for SavedLayout {
    fn default() -> Self {
        Self { version: LAYOUT_VERSION, groups: Vec::new() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedGroup {
    #[serde(default)]
    pub columns: Vec<SavedColumn>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedColumn {
    #[serde(default)]
    pub levels: Vec<SavedLevel>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedLevel {
    #[serde(default)]
    pub panels: Vec<SavedPanel>,
    /// Selector names; defaults to the names of the saved panels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Set on a minimized level that closed a merged column.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub merge_boundary: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPanel {
    pub panel_name: String,
    #[serde(default)]
    pub minimized: bool,
}

impl PanelManager {
    pub fn snapshot(&self) -> SavedLayout {
        let groups = self
            .groups()
            .iter()
            .map(|&group| SavedGroup {
                columns: self
                    .columns(group)
                    .iter()
                    .filter_map(|&c| self.tree.column(c))
                    .map(|column| SavedColumn {
                        levels: column.levels().iter().map(|&l| self.snapshot_level(l)).collect(),
                    })
                    .collect(),
            })
            .collect();
        SavedLayout { version: LAYOUT_VERSION, groups }
    }

    fn snapshot_level(&self, level: LevelId) -> SavedLevel {
        let panels = self
            .level_wrappers(level)
            .iter()
            .filter_map(|&w| self.tree.wrapper(w))
            .map(|w| SavedPanel {
                panel_name: w.panel_name().to_string(),
                minimized: w.is_minimized(),
            })
            .collect();
        let node = self.tree.level(level);
        SavedLevel {
            panels,
            allowed: node.map(|l| l.allowed_panel_names().to_vec()),
            merge_boundary: node.is_some_and(|l| l.is_merge_boundary()),
        }
    }

    /// Replaces every group with the saved structure. The level chain is not
    /// re-derived; only groups left without any level are.
    pub fn restore(&mut self, saved: &SavedLayout) {
        if saved.version > LAYOUT_VERSION {
            warn!(version = saved.version, "layout saved by a newer version, loading what is understood");
        }
        for group in self.groups().to_vec() {
            self.tree.remove_group(group);
        }

        if saved.groups.is_empty() {
            self.add_group();
            return;
        }

        let mut panels = 0;
        for saved_group in &saved.groups {
            let group = self.tree.add_group();
            panels += self.restore_group(group, saved_group);
            if self.tree.level_count(group) == 0 {
                if let Err(e) = self.relayout(group) {
                    warn!(?group, "deriving an empty restored group failed: {e}");
                }
            }
        }
        info!(groups = saved.groups.len(), panels, "layout restored");
        self.percent_stale = true;
        self.structure_changed = false;
    }

    fn restore_group(&mut self, group: GroupId, saved: &SavedGroup) -> usize {
        let mut panels = 0;
        for saved_column in &saved.columns {
            let mut column_started = false;
            for saved_level in &saved_column.levels {
                let single_panel = self.settings.is_single_panel_level(self.tree.level_count(group));
                let level = if column_started {
                    self.tree.push_level(group, single_panel)
                } else {
                    self.tree.push_level_in_new_column(group, single_panel)
                };
                let Some(level) = level else {
                    return panels;
                };
                match self.restore_level(level, saved_level) {
                    Ok(0) if !saved_level.panels.is_empty() => {
                        warn!(pos = self.tree.level_count(group) - 1, "no saved panel could be restored, level dropped");
                        self.tree.remove_last_level(group);
                    }
                    Ok(n) => {
                        panels += n;
                        column_started = true;
                    }
                    Err(e) => error!("restoring level failed: {e}"),
                }
            }
        }
        panels
    }

    /// Loads saved panels into `level` without resolving allowed names.
    /// Returns how many panels were restored.
    pub fn restore_level(&mut self, level: LevelId, saved: &SavedLevel) -> Result<usize, LayoutError> {
        if self.tree.level(level).is_none() {
            return Err(LayoutError::stale_level(level));
        }
        let mut cx = PanelContext::new();
        let mut restored = 0;
        for saved_panel in &saved.panels {
            let name = saved_panel.panel_name.as_str();
            let occupied = self
                .tree
                .level(level)
                .is_some_and(|l| l.is_single_panel() && !l.wrappers().is_empty());
            if occupied {
                warn!(?level, panel = name, "single-panel level already holds a panel, skipped");
                continue;
            }
            let panel = match self.create_panel(level, name, &mut cx) {
                Ok(panel) => panel,
                Err(e) => {
                    error!(?level, "skipping saved panel: {e}");
                    continue;
                }
            };
            let mut wrapper = PanelWrapper::new(name, panel);
            wrapper.restore_minimized(saved_panel.minimized);
            self.tree.insert_wrapper(level, wrapper);
            restored += 1;
        }

        let wrappers = self.level_wrappers(level).to_vec();
        let minimized = !wrappers.is_empty() && wrappers.iter().all(|&w| self.is_panel_minimized(w));
        let allowed = match &saved.allowed {
            Some(allowed) => allowed.clone(),
            None => wrappers
                .iter()
                .filter_map(|&w| self.panel_name(w).map(str::to_string))
                .collect(),
        };
        if let Some(node) = self.tree.level_mut(level) {
            node.minimized = minimized;
            node.allowed = allowed;
            node.merge_boundary = minimized && saved.merge_boundary;
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn documents_use_camel_case() {
        let json = r#"{"groups":[{"columns":[{"levels":[{"panels":[{"panelName":"ideaList","minimized":true}]}]}]}]}"#;
        let saved: SavedLayout = serde_json::from_str(json).unwrap();
        assert_eq!(saved.version, LAYOUT_VERSION);
        let level = &saved.groups[0].columns[0].levels[0];
        assert_eq!(
            level.panels,
            vec![SavedPanel { panel_name: "ideaList".into(), minimized: true }]
        );
        assert_eq!(level.allowed, None);
        assert!(!level.merge_boundary);

        let out = serde_json::to_value(&saved).unwrap();
        assert_eq!(out["groups"][0]["columns"][0]["levels"][0]["panels"][0]["panelName"], "ideaList");
        assert!(out["groups"][0]["columns"][0]["levels"][0].get("mergeBoundary").is_none());
    }

    #[test]
    fn missing_fields_default() {
        let saved: SavedLayout = serde_json::from_str("{}").unwrap();
        assert_eq!(saved, SavedLayout::default());
        let panel: SavedPanel = serde_json::from_str(r#"{"panelName":"nav"}"#).unwrap();
        assert!(!panel.minimized);
    }
}
