//! Where posts and their illustrations come from.
//!
//! The post index never touches the filesystem directly; it asks a
//! [`ContentSource`] for entries and an [`ImageProbe`] for illustrations,
//! so tests can hand it in-memory fixtures instead of a content folder.

use anyhow::Context;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

pub trait ContentSource: Sync {
    /// Entry ids in enumeration order. The id doubles as the post slug.
    fn list_entries(&self) -> anyhow::Result<Vec<String>>;

    /// Raw document text. `Ok(None)` when no entry has this id.
    fn read_entry(&self, id: &str) -> anyhow::Result<Option<String>>;
}

pub trait ImageProbe: Sync {
    fn exists(&self, file_name: &str) -> bool;
}

/// Markdown files in a single directory, `<slug>.md`.
pub struct FsContent {
    dir: PathBuf,
}

impl FsContent {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.md", id))
    }
}

impl ContentSource for FsContent {
    fn list_entries(&self) -> anyhow::Result<Vec<String>> {
        let read = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read content directory {}", self.dir.display()))?;

        let mut ids = Vec::new();
        for entry in read {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        // read_dir order is platform dependent
        ids.sort();
        Ok(ids)
    }

    fn read_entry(&self, id: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Entries held in memory, enumerated in insertion order.
#[derive(Default)]
pub struct MemoryContent {
    entries: Vec<(String, String)>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, raw: &str) -> Self {
        self.entries.push((id.to_string(), raw.to_string()));
        self
    }
}

impl ContentSource for MemoryContent {
    fn list_entries(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.entries.iter().map(|(id, _)| id.clone()).collect())
    }

    fn read_entry(&self, id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.iter().find(|(e, _)| e == id).map(|(_, raw)| raw.clone()))
    }
}

pub struct FsImages {
    dir: PathBuf,
}

impl FsImages {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageProbe for FsImages {
    fn exists(&self, file_name: &str) -> bool {
        self.dir.join(file_name).is_file()
    }
}

impl ImageProbe for HashSet<String> {
    fn exists(&self, file_name: &str) -> bool {
        self.contains(file_name)
    }
}

/// Light and dark illustration URLs for a slug, probed by naming convention.
pub fn probe_images(
    probe: &dyn ImageProbe,
    prefix: &str,
    slug: &str,
) -> (Option<String>, Option<String>) {
    let find = |stem: &str| {
        ["png", "PNG"]
            .iter()
            .map(|ext| format!("{}.{}", stem, ext))
            .find(|name| probe.exists(name))
            .map(|name| format!("{}/{}", prefix.trim_end_matches('/'), name))
    };
    (find(slug), find(&format!("{}-dark", slug)))
}
