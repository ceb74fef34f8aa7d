use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use super::collections::{BTreeMap, HashSet};

const MAX_GROUPS: usize = 16;

pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("panels")
}
pub fn state_file() -> PathBuf { data_dir().join("layout.json") }
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panels")
        .join("config.toml")
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    settings: Settings,
    #[serde(default)]
    panels: Vec<PanelDefinition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub settings: Settings,
    pub panels: Vec<PanelDefinition>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Panel materialized at level 0 of every group.
    pub root_panel: String,
    /// Minimize panels automatically when the layout overflows the window.
    #[serde(default = "yes")]
    pub fit_to_window: bool,
    /// Width reported by a minimized panel.
    #[serde(default = "default_minimized_width")]
    pub minimized_width: u32,
    /// Height of the wrapper chrome drawn above every panel.
    #[serde(default = "default_header_height")]
    pub header_height: u32,
    #[serde(default = "default_debounce_ms")]
    pub resize_debounce_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub reset_percent_debounce_ms: u64,
    /// Level positions that can hold only one panel at a time.
    #[serde(default = "default_single_panel_levels")]
    pub single_panel_levels: Vec<usize>,
    /// Number of groups created when no saved layout exists.
    #[serde(default = "default_group_count")]
    pub group_count: usize,
    /// Overrides the default saved-layout location.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_panel: "navigation".to_string(),
            fit_to_window: true,
            minimized_width: default_minimized_width(),
            header_height: default_header_height(),
            resize_debounce_ms: default_debounce_ms(),
            reset_percent_debounce_ms: default_debounce_ms(),
            single_panel_levels: default_single_panel_levels(),
            group_count: default_group_count(),
            state_file: None,
        }
    }
}

impl Settings {
    pub fn resize_debounce(&self) -> Duration { Duration::from_millis(self.resize_debounce_ms) }

    pub fn reset_percent_debounce(&self) -> Duration {
        Duration::from_millis(self.reset_percent_debounce_ms)
    }

    pub fn is_single_panel_level(&self, position: usize) -> bool {
        self.single_panel_levels.contains(&position)
    }

    pub fn state_file(&self) -> PathBuf { self.state_file.clone().unwrap_or_else(state_file) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.root_panel.is_empty() {
            issues.push("root_panel must not be empty".to_string());
        }
        if self.resize_debounce_ms == 0 {
            issues.push("resize_debounce_ms must be greater than 0".to_string());
        }
        if self.reset_percent_debounce_ms == 0 {
            issues.push("reset_percent_debounce_ms must be greater than 0".to_string());
        }
        if self.group_count == 0 {
            issues.push("group_count must be at least 1".to_string());
        }
        if self.group_count > MAX_GROUPS {
            issues.push(format!("group_count should not exceed {MAX_GROUPS}"));
        }

        issues
    }
}

/// A panel whose behavior is fully described by configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PanelDefinition {
    pub name: String,
    #[serde(default = "default_panel_min_width")]
    pub min_width: u32,
    #[serde(default = "default_panel_max_width")]
    pub max_width: u32,
    #[serde(default = "default_panel_min_height")]
    pub min_height: u32,
    /// Panels this one permits at the next level.
    #[serde(default)]
    pub allowed: Vec<String>,
    /// Subset of `allowed` opened when nothing else is active at the next level.
    #[serde(default)]
    pub autoactivated: Vec<String>,
    /// Allowed panel name -> selection key that must be set for it to be offered.
    #[serde(default)]
    pub gated_by: BTreeMap<String, String>,
}

impl PanelDefinition {
    pub fn validate(&self, known: &HashSet<&str>) -> Vec<String> {
        let mut issues = Vec::new();
        let name = &self.name;

        if name.is_empty() {
            issues.push("panel with an empty name".to_string());
        }
        if self.min_width > self.max_width {
            issues.push(format!(
                "panel {name}: min_width ({}) exceeds max_width ({})",
                self.min_width, self.max_width
            ));
        }
        for target in self.allowed.iter().chain(&self.autoactivated).chain(self.gated_by.keys()) {
            if !known.contains(target.as_str()) {
                issues.push(unknown_panel_issue(&format!("panel {name}"), target, known));
            }
        }
        for auto in &self.autoactivated {
            if !self.allowed.contains(auto) {
                issues.push(format!("panel {name}: autoactivated panel {auto} is not allowed"));
            }
        }
        for (gated, key) in &self.gated_by {
            if key.is_empty() {
                issues.push(format!("panel {name}: gate for {gated} has an empty selection key"));
            }
        }

        issues
    }
}

fn unknown_panel_issue(context: &str, target: &str, known: &HashSet<&str>) -> String {
    match Config::suggest_similar_panel(target, known.iter().copied()) {
        Some(suggestion) => {
            format!("{context}: unknown panel {target}. Did you mean `{suggestion}`?")
        }
        None => format!("{context}: unknown panel {target}"),
    }
}

fn yes() -> bool { true }

fn default_minimized_width() -> u32 { 40 }

fn default_header_height() -> u32 { 25 }

fn default_debounce_ms() -> u64 { 100 }

fn default_single_panel_levels() -> Vec<usize> { vec![0] }

fn default_group_count() -> usize { 1 }

fn default_panel_min_width() -> u32 { 200 }

fn default_panel_max_width() -> u32 { 100_000 }

fn default_panel_min_height() -> u32 { 100 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../panels.default.toml"))
            .expect("embedded default config must parse")
    }

    /// Reads `path` if it exists, otherwise falls back to the embedded defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::read(path)
        } else {
            tracing::debug!(?path, "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_file = ConfigFile {
            settings: self.settings.clone(),
            panels: self.panels.clone(),
        };

        let toml_string = toml::to_string_pretty(&config_file)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();

        let mut known = HashSet::default();
        for panel in &self.panels {
            if !known.insert(panel.name.as_str()) {
                issues.push(format!("panel {} is declared more than once", panel.name));
            }
        }

        if !self.panels.is_empty() && !known.contains(self.settings.root_panel.as_str()) {
            issues.push(unknown_panel_issue("root_panel", &self.settings.root_panel, &known));
        }

        for panel in &self.panels {
            issues.extend(panel.validate(&known));
        }

        issues
    }

    fn levenshtein(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut prev: Vec<usize> = (0..=b.len()).collect();
        let mut cur = vec![0; b.len() + 1];

        for i in 1..=a.len() {
            cur[0] = i;
            for j in 1..=b.len() {
                let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
                cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
            }
            std::mem::swap(&mut prev, &mut cur);
        }

        prev[b.len()]
    }

    // Returns the closest declared panel name if it is within a reasonable distance.
    fn suggest_similar_panel<'a>(
        unknown: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Option<&'a str> {
        let unknown = unknown.to_lowercase();
        let (best, dist) = candidates
            .into_iter()
            .map(|cand| (cand, Self::levenshtein(&unknown, &cand.to_lowercase())))
            .min_by_key(|&(cand, dist)| (dist, cand))?;

        let threshold = std::cmp::max(3usize, best.len() / 2);
        (dist <= threshold).then_some(best)
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<ConfigFile>(buf) {
            Ok(c) => Ok(Config { settings: c.settings, panels: c.panels }),
            Err(e) => bail!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(name: &str, allowed: &[&str]) -> PanelDefinition {
        PanelDefinition {
            name: name.to_string(),
            min_width: 200,
            max_width: 800,
            min_height: 100,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_parses_and_is_valid() {
        let config = Config::default();
        assert!(!config.panels.is_empty());
        assert_eq!(config.validate(), Vec::<String>::new());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse("[settings]\nroot_panel = \"nav\"\n").unwrap();
        assert_eq!(config.settings.root_panel, "nav");
        assert!(config.settings.fit_to_window);
        assert_eq!(config.settings.minimized_width, 40);
        assert_eq!(config.settings.resize_debounce(), Duration::from_millis(100));
        assert_eq!(config.settings.single_panel_levels, vec![0]);
        assert!(config.panels.is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Config::parse("[settings]\nroot_panel = \"nav\"\nfit_to_windw = true\n")
            .unwrap_err();
        assert!(err.to_string().contains("fit_to_windw"));
    }

    #[test]
    fn test_panel_definitions_parse() {
        let config = Config::parse(
            r#"
            [settings]
            root_panel = "nav"

            [[panels]]
            name = "nav"
            min_width = 250
            allowed = ["ideaList"]
            autoactivated = ["ideaList"]

            [[panels]]
            name = "ideaList"
            allowed = ["ideaPanel"]
            gated_by = { ideaPanel = "currentIdea" }

            [[panels]]
            name = "ideaPanel"
            "#,
        )
        .unwrap();
        assert_eq!(config.panels.len(), 3);
        assert_eq!(config.panels[0].min_width, 250);
        assert_eq!(config.panels[1].gated_by.get("ideaPanel").unwrap(), "currentIdea");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_settings_validation_zero_debounce() {
        let mut settings = Settings::default();
        settings.resize_debounce_ms = 0;
        let issues = settings.validate();
        assert!(issues.iter().any(|i| i.contains("resize_debounce_ms")));
    }

    #[test]
    fn test_settings_validation_group_count() {
        let mut settings = Settings::default();
        settings.group_count = 0;
        assert!(settings.validate().iter().any(|i| i.contains("at least 1")));
        settings.group_count = 100;
        assert!(settings.validate().iter().any(|i| i.contains("should not exceed")));
    }

    #[test]
    fn test_unknown_allowed_panel_suggests_closest() {
        let config = Config {
            settings: Settings { root_panel: "nav".to_string(), ..Default::default() },
            panels: vec![panel("nav", &["ideaLst"]), panel("ideaList", &[])],
        };
        let issues = config.validate();
        assert!(
            issues.iter().any(|i| i.contains("unknown panel ideaLst") && i.contains("`ideaList`")),
            "{issues:?}"
        );
    }

    #[test]
    fn test_unknown_root_panel_is_reported() {
        let config = Config {
            settings: Settings { root_panel: "missing".to_string(), ..Default::default() },
            panels: vec![panel("nav", &[])],
        };
        assert!(config.validate().iter().any(|i| i.starts_with("root_panel")));
    }

    #[test]
    fn test_duplicate_and_inverted_bounds_are_reported() {
        let mut wide = panel("nav", &[]);
        wide.min_width = 900;
        let config = Config {
            settings: Settings { root_panel: "nav".to_string(), ..Default::default() },
            panels: vec![wide, panel("nav", &[])],
        };
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("declared more than once")));
        assert!(issues.iter().any(|i| i.contains("exceeds max_width")));
    }

    #[test]
    fn test_autoactivated_must_be_allowed() {
        let mut nav = panel("nav", &[]);
        nav.autoactivated = vec!["ideaList".to_string()];
        let config = Config {
            settings: Settings { root_panel: "nav".to_string(), ..Default::default() },
            panels: vec![nav, panel("ideaList", &[])],
        };
        assert!(config.validate().iter().any(|i| i.contains("is not allowed")));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(Config::levenshtein("kitten", "sitting"), 3);
        assert_eq!(Config::levenshtein("", "abc"), 3);
        assert_eq!(Config::levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::default();
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
