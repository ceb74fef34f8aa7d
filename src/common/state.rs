use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::layout_engine::SavedLayout;

/// Where the structural layout is kept between runs.
pub trait LayoutStore {
    /// `Ok(None)` when nothing usable was saved yet.
    fn load(&self) -> anyhow::Result<Option<SavedLayout>>;
    fn save(&self, layout: &SavedLayout) -> anyhow::Result<()>;
}

/// Pretty-printed JSON file, usually under the user's data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

impl LayoutStore for FileStore {
    fn load(&self) -> anyhow::Result<Option<SavedLayout>> {
        let mut buf = String::new();
        match File::open(&self.path) {
            Ok(mut file) => file.read_to_string(&mut buf)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved layout");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&buf) {
            Ok(layout) => Ok(Some(layout)),
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable saved layout: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, layout: &SavedLayout) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(layout)?;
        File::create(&self.path)?.write_all(json.as_bytes())?;
        debug!(path = %self.path.display(), "layout saved");
        Ok(())
    }
}

/// Keeps the last saved layout in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    layout: RefCell<Option<SavedLayout>>,
    saves: RefCell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_layout(layout: SavedLayout) -> Self {
        Self {
            layout: RefCell::new(Some(layout)),
            saves: RefCell::new(0),
        }
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize { *self.saves.borrow() }
}

impl LayoutStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<SavedLayout>> { Ok(self.layout.borrow().clone()) }

    fn save(&self, layout: &SavedLayout) -> anyhow::Result<()> {
        *self.layout.borrow_mut() = Some(layout.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

impl<S: LayoutStore + ?Sized> LayoutStore for std::rc::Rc<S> {
    fn load(&self) -> anyhow::Result<Option<SavedLayout>> { (**self).load() }

    fn save(&self, layout: &SavedLayout) -> anyhow::Result<()> { (**self).save(layout) }
}
