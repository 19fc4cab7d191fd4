//! Path registry: maps each asset category to its glob patterns.
//!
//! The registry is built once at startup and immutable thereafter. It
//! answers two questions: which files belong to a category (for task
//! input enumeration), and which category a changed path belongs to (for
//! watch routing).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Asset categories handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Page,
    Style,
    Script,
    Image,
}

impl AssetKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Page => "pages",
            Self::Style => "styles",
            Self::Script => "scripts",
            Self::Image => "images",
        }
    }
}

/// Glob patterns per category, rooted at the source tree.
const PAGE_PATTERNS: &[&str] = &["pages/**/*.md"];
const STYLE_PATTERNS: &[&str] = &["css/**/*.css"];
const SCRIPT_PATTERNS: &[&str] = &["js/**/*.js"];
const IMAGE_PATTERNS: &[&str] = &["img/**"];

/// Script bundle precedence: library files before application files.
/// Relative order inside the bundle must be preserved, since later files
/// may depend on earlier ones.
const SCRIPT_LIB_PATTERNS: &[&str] = &["js/lib/*.js"];
const SCRIPT_APP_PATTERNS: &[&str] = &["js/*.js"];

pub struct PathRegistry {
    source_root: PathBuf,
    pages: GlobSet,
    styles: GlobSet,
    scripts: GlobSet,
    images: GlobSet,
    script_lib: GlobSet,
    script_app: GlobSet,
}

impl PathRegistry {
    pub fn new(source_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            source_root: source_root.into(),
            pages: build_globset(PAGE_PATTERNS)?,
            styles: build_globset(STYLE_PATTERNS)?,
            scripts: build_globset(SCRIPT_PATTERNS)?,
            images: build_globset(IMAGE_PATTERNS)?,
            script_lib: build_globset(SCRIPT_LIB_PATTERNS)?,
            script_app: build_globset(SCRIPT_APP_PATTERNS)?,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Map a changed filesystem path to its asset category.
    ///
    /// Returns `None` for paths outside the source tree or matching no
    /// category pattern.
    pub fn classify(&self, path: &Path) -> Option<AssetKind> {
        let rel = path.strip_prefix(&self.source_root).ok()?;
        if self.pages.is_match(rel) {
            Some(AssetKind::Page)
        } else if self.styles.is_match(rel) {
            Some(AssetKind::Style)
        } else if self.scripts.is_match(rel) {
            Some(AssetKind::Script)
        } else if self.images.is_match(rel) && path.is_file() {
            Some(AssetKind::Image)
        } else {
            None
        }
    }

    /// The single page entry file compiled to markup.
    pub fn page_entry(&self) -> PathBuf {
        self.source_root.join("pages/index.md")
    }

    /// The single stylesheet entry file compiled to CSS.
    pub fn style_entry(&self) -> PathBuf {
        self.source_root.join("css/style.css")
    }

    /// Script sources in bundle order: library files first, then
    /// application files, each group in sorted match order. A file matched
    /// by the library group is not re-included by the application group.
    pub fn script_sources(&self) -> io::Result<Vec<PathBuf>> {
        let js_dir = self.source_root.join("js");
        if !js_dir.exists() {
            return Ok(Vec::new());
        }

        let mut all = Vec::new();
        collect_files(&js_dir, &mut all)?;

        let rel = |path: &PathBuf| {
            path.strip_prefix(&self.source_root)
                .map(Path::to_path_buf)
                .unwrap_or_default()
        };

        let mut lib: Vec<PathBuf> = all
            .iter()
            .filter(|p| self.script_lib.is_match(rel(p)))
            .cloned()
            .collect();
        let mut app: Vec<PathBuf> = all
            .iter()
            .filter(|p| self.script_app.is_match(rel(p)) && !self.script_lib.is_match(rel(p)))
            .cloned()
            .collect();

        lib.sort();
        app.sort();
        lib.extend(app);
        Ok(lib)
    }

    /// Root of the image source subtree.
    pub fn image_root(&self) -> PathBuf {
        self.source_root.join("img")
    }

    /// All image source files, in sorted order.
    pub fn image_sources(&self) -> io::Result<Vec<PathBuf>> {
        let img_dir = self.image_root();
        if !img_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        collect_files(&img_dir, &mut files)?;
        files.sort();
        Ok(files)
    }
}

/// Build a GlobSet from string patterns.
fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Recursively collect regular files under a directory.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
