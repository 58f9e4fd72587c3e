use std::{
    io,
    path::{Path, PathBuf},
};

/// Persistence of generated requests into a directory hierarchy. Injected
/// into the traversal engine so tests can capture output in memory.
pub trait RequestSink {
    /// Idempotent; creates intermediate segments as needed.
    fn ensure_dir(&self, path: &Path) -> io::Result<()>;
    /// Creates or overwrites.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes under `root`, which defaults to the working directory.
#[derive(Debug)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsSink {
    fn default() -> Self {
        Self::new(".")
    }
}

impl RequestSink for FsSink {
    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(self.root.join(path))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(self.root.join(path), contents)
    }
}
