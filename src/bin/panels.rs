use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use panel_cascade::common::config::{Config, config_file};
use panel_cascade::common::log;
use panel_cascade::common::state::{FileStore, LayoutStore};
use panel_cascade::common::util::parse_selection_pair;
use panel_cascade::layout_engine::{PanelCatalog, PanelManager, SavedLayout};
use panel_cascade::model::Selection;

#[derive(Parser)]
#[command(about = "Inspect and edit a saved panel layout")]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Saved layout to operate on (overrides the configured location).
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Fit the layout to this window width before running the command.
    #[arg(long)]
    width: Option<u32>,

    /// Index of the group the command applies to.
    #[arg(long, default_value_t = 0)]
    group: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration for problems.
    Validate,
    /// Print the layout tree.
    Show,
    /// Merge KEY=VALUE pairs into the group selection (VALUE=null clears KEY).
    Select {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Minimize the first panel with the given name.
    Minimize {
        name: String,
        /// Restore the panel instead.
        #[arg(long)]
        restore: bool,
    },
    /// Open or close a panel at a level, as its selector button would.
    Toggle { level: usize, name: String },
    /// Discard the saved layout and derive a fresh one.
    Reset,
}

fn main() {
    let cli = Cli::parse();
    log::init_logging();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;

    if let Commands::Validate = cli.command {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
            return Ok(());
        }
        for issue in &issues {
            println!("  - {issue}");
        }
        bail!("{} issue(s) found in {}", issues.len(), config_path.display());
    }

    let store = FileStore::new(cli.state.clone().unwrap_or_else(|| config.settings.state_file()));
    let mut manager = PanelManager::new(config.settings, PanelCatalog::new(config.panels));
    match store.load()? {
        Some(layout) => manager.restore(&layout),
        None => {
            manager.change_selection(&Selection::new())?;
        }
    }
    if let Some(width) = cli.width {
        manager.resize_base(width);
    }

    let Some(&group) = manager.groups().get(cli.group) else {
        bail!("no group {} (layout has {})", cli.group, manager.groups().len());
    };

    let read_only = matches!(cli.command, Commands::Show);
    let mut force_save = false;
    match cli.command {
        Commands::Validate | Commands::Show => {}
        Commands::Select { pairs } => {
            let changes = pairs
                .iter()
                .map(|pair| parse_selection_pair(pair))
                .collect::<anyhow::Result<Selection>>()?;
            manager.change_group_selection(group, &changes)?;
        }
        Commands::Minimize { name, restore } => {
            let Some(wrapper) = manager.find_wrapper(group, &name) else {
                bail!("no panel named {name} in group {}", cli.group);
            };
            manager.set_minimize(wrapper, !restore)?;
        }
        Commands::Toggle { level, name } => {
            let Some(level_id) = manager.levels(group).get(level).copied() else {
                bail!("no level {level} in group {}", cli.group);
            };
            manager.toggle_panel(level_id, &name)?;
        }
        Commands::Reset => {
            manager.restore(&SavedLayout::default());
            force_save = true;
        }
    }

    if let Some(width) = cli.width {
        manager.resize_base(width);
    }
    manager.flush();
    print!("{}", manager.draw_tree());

    if !read_only && (manager.take_structure_changed() || force_save) {
        store.save(&manager.snapshot())?;
        println!("saved {}", store.path().display());
    }
    Ok(())
}
