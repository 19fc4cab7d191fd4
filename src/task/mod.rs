//! One-shot transformation tasks and the concurrent build runner.
//!
//! Each task is a pure filesystem-to-filesystem transform; no data flows
//! between them and they write disjoint output files, so the initial build
//! runs all four concurrently.

pub mod image;
pub mod page;
pub mod script;
pub mod style;

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::error::TaskError;
use crate::log;
use crate::logger::{status_error, status_success};
use crate::registry::{AssetKind, PathRegistry};

/// Run the four one-shot tasks concurrently and wait for all of them.
///
/// Transformation errors are notified and non-fatal; filesystem errors
/// abort the build.
pub fn build_all(config: &Config, registry: &PathRegistry) -> Result<()> {
    fs::create_dir_all(config.output_dir())?;

    let output = config.output_dir();
    let ((pages, styles), (scripts, images)) = rayon::join(
        || {
            rayon::join(
                || page::run(registry, output),
                || style::run(registry, output),
            )
        },
        || {
            rayon::join(
                || script::run(registry, output),
                || image::run(registry, output),
            )
        },
    );

    report(AssetKind::Page, pages)?;
    report(AssetKind::Style, styles)?;
    report(AssetKind::Script, scripts)?;
    report(AssetKind::Image, images.map(|outcome| outcome.describe()))?;

    Ok(())
}

/// Run a single category's task (watch-triggered re-run).
///
/// All errors are non-fatal here: notified, and the pipeline resumes on
/// the next qualifying change event.
pub fn run_kind(kind: AssetKind, registry: &PathRegistry, output: &Path) {
    let result = match kind {
        AssetKind::Page => page::run(registry, output),
        AssetKind::Style => style::run(registry, output),
        AssetKind::Script => script::run(registry, output),
        AssetKind::Image => image::run(registry, output).map(|outcome| outcome.describe()),
    };

    match result {
        Ok(artifact) => status_success(&format!("rebuilt: {artifact}")),
        Err(e) => status_error(&format!("{} task failed", kind.name()), &e.to_string()),
    }
}

/// Read a source file as UTF-8.
///
/// Non-UTF-8 content is a transformation error (the file is there but
/// cannot be processed), not a filesystem one, so it never aborts the
/// initial build.
fn read_text(path: &Path) -> Result<String, TaskError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            TaskError::transform(path.display().to_string(), e.to_string())
        } else {
            TaskError::Io(e)
        }
    })
}

/// Report a one-shot task result: log success, notify transformation
/// errors, abort on filesystem errors.
fn report(kind: AssetKind, result: Result<String, TaskError>) -> Result<()> {
    match result {
        Ok(artifact) => {
            log!("build"; "{}: {}", kind.name(), artifact);
            Ok(())
        }
        Err(e @ TaskError::Transform { .. }) => {
            status_error(&format!("{} task failed", kind.name()), &e.to_string());
            Ok(())
        }
        Err(TaskError::Io(e)) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Config, PathRegistry) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");

        fs::create_dir_all(root.join("pages")).unwrap();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::create_dir_all(root.join("js/lib")).unwrap();
        fs::create_dir_all(root.join("img")).unwrap();

        fs::write(root.join("pages/index.md"), "# Hello\n\nWelcome.\n").unwrap();
        fs::write(root.join("css/style.css"), "body { color: #ff0000; }\n").unwrap();
        fs::write(root.join("js/lib/vendor.js"), "var lib = 1;\n").unwrap();
        fs::write(root.join("js/app.js"), "console.log(lib);\n").unwrap();
        fs::write(root.join("img/note.txt"), "not really an image\n").unwrap();

        let mut config = Config::default();
        config.paths.source = root.clone();
        config.paths.output = dir.path().join("dist");

        let registry = PathRegistry::new(&root).unwrap();
        (dir, config, registry)
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_build_all_produces_one_artifact_per_task() {
        let (_dir, config, registry) = fixture();
        build_all(&config, &registry).unwrap();

        let out = config.output_dir();
        assert!(out.join("index.html").is_file());
        assert!(out.join("style.css").is_file());
        assert!(out.join("index.min.js").is_file());
        assert!(out.join("img/note.txt").is_file());
    }

    #[test]
    fn test_end_to_end_contents() {
        let (_dir, config, registry) = fixture();
        build_all(&config, &registry).unwrap();

        let html = read(config.output_dir().join("index.html"));
        assert!(html.contains("<h1>Hello</h1>"));

        let css = read(config.output_dir().join("style.css"));
        assert!(css.contains("color:red") || css.contains("color:#f00"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let (_dir, config, registry) = fixture();
        build_all(&config, &registry).unwrap();

        let out = config.output_dir();
        let first = [
            fs::read(out.join("index.html")).unwrap(),
            fs::read(out.join("style.css")).unwrap(),
            fs::read(out.join("index.min.js")).unwrap(),
        ];

        build_all(&config, &registry).unwrap();
        let second = [
            fs::read(out.join("index.html")).unwrap(),
            fs::read(out.join("style.css")).unwrap(),
            fs::read(out.join("index.min.js")).unwrap(),
        ];

        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_error_is_non_fatal() {
        let (_dir, config, registry) = fixture();
        fs::write(
            config.source_dir().join("css/style.css"),
            "body { color: red } }", // stray brace, rejected by the parser
        )
        .unwrap();

        // Build still succeeds; the style artifact is simply absent
        build_all(&config, &registry).unwrap();
        assert!(config.output_dir().join("index.html").is_file());
        assert!(!config.output_dir().join("style.css").exists());
    }

    #[test]
    fn test_recovery_after_transform_error() {
        let (_dir, config, registry) = fixture();

        fs::write(config.source_dir().join("css/style.css"), "body { } }").unwrap();
        build_all(&config, &registry).unwrap();

        // A subsequent valid change must still produce correct output
        fs::write(
            config.source_dir().join("css/style.css"),
            "h1 { margin: 0; }",
        )
        .unwrap();
        run_kind(AssetKind::Style, &registry, config.output_dir());
        let css = read(config.output_dir().join("style.css"));
        assert!(css.contains("margin:0"));
    }

    #[test]
    fn test_non_utf8_entry_is_non_fatal() {
        let (_dir, config, registry) = fixture();
        // Shift-JIS bytes, not valid UTF-8
        fs::write(
            config.source_dir().join("pages/index.md"),
            [0x93u8, 0xfa, 0x96, 0x7b, 0x8c, 0xea],
        )
        .unwrap();

        // The unprocessable entry is notified, not fatal; the other tasks
        // still produce their artifacts
        build_all(&config, &registry).unwrap();
        assert!(!config.output_dir().join("index.html").exists());
        assert!(config.output_dir().join("style.css").is_file());
        assert!(config.output_dir().join("index.min.js").is_file());
    }

    #[test]
    fn test_read_text_error_kinds() {
        let (_dir, config, _registry) = fixture();
        let path = config.source_dir().join("pages/raw.bin");
        fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            read_text(&path),
            Err(TaskError::Transform { .. })
        ));
        assert!(matches!(
            read_text(&config.source_dir().join("pages/absent.md")),
            Err(TaskError::Io(_))
        ));
    }

    #[test]
    fn test_missing_page_entry_is_io_error() {
        let (_dir, config, registry) = fixture();
        fs::remove_file(config.source_dir().join("pages/index.md")).unwrap();

        let err = build_all(&config, &registry).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("index.md") || err.downcast_ref::<std::io::Error>().is_some());
    }
}
