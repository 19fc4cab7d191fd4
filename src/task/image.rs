//! Image task: compress image sources into the output image subtree.
//!
//! Outputs mirror the source subtree under `<output>/img`. Files whose
//! output already exists and is not older than the source are skipped
//! (incremental-build optimization, not correctness-critical).
//!
//! Compression by extension:
//! - JPEG: re-encoded at fixed quality 65
//! - PNG: re-encoded losslessly at best compression
//! - SVG: minified by re-serialization without indentation
//! - everything else: copied through unchanged

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::error::TaskError;
use crate::logger::status_error;
use crate::registry::PathRegistry;

/// Fixed JPEG quality.
const JPEG_QUALITY: u8 = 65;

/// Image task result counters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImageOutcome {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImageOutcome {
    pub fn describe(&self) -> String {
        format!(
            "{} image(s) ({} up-to-date, {} failed)",
            self.processed, self.skipped, self.failed
        )
    }
}

/// Run the image task. Per-file decode failures are notified and counted,
/// never fatal; remaining files are still processed.
pub fn run(registry: &PathRegistry, output: &Path) -> Result<ImageOutcome, TaskError> {
    let image_root = registry.image_root();
    let output_root = output.join("img");
    let mut outcome = ImageOutcome::default();

    for source in registry.image_sources()? {
        let Ok(rel) = source.strip_prefix(&image_root) else {
            continue;
        };
        let out_path = output_root.join(rel);

        // Skip if up-to-date (mtime comparison, source vs its own output)
        if crate::freshness::is_output_fresh(&source, &out_path) {
            outcome.skipped += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = fs::read(&source)?;
        match compress(&source, &data) {
            Ok(compressed) => {
                fs::write(&out_path, compressed)?;
                outcome.processed += 1;
            }
            Err(detail) => {
                status_error(&format!("image failed: {}", source.display()), &detail);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Compress a single image according to its extension.
fn compress(path: &Path, data: &[u8]) -> Result<Vec<u8>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => encode_jpeg(data),
        Some("png") => encode_png(data),
        Some("svg") => minify_svg(data),
        // GIF/WebP and unknown formats are copied through unchanged
        _ => Ok(data.to_vec()),
    }
}

fn encode_jpeg(data: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(data).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(out)
}

fn encode_png(data: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(data).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| e.to_string())?;
    Ok(out)
}

/// Minify SVG by re-serializing the parsed tree without indentation.
fn minify_svg(data: &[u8]) -> Result<Vec<u8>, String> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|e| e.to_string())?;
    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathRegistry, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("src");
        fs::create_dir_all(root.join("img")).unwrap();
        let registry = PathRegistry::new(&root).unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        (dir, registry, out)
    }

    #[test]
    fn test_passthrough_formats_copied_byte_identical() {
        let (dir, registry, out) = fixture();
        let gif = b"GIF89a not a real image".to_vec();
        fs::write(dir.path().join("src/img/anim.gif"), &gif).unwrap();

        let outcome = run(&registry, &out).unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(fs::read(out.join("img/anim.gif")).unwrap(), gif);
    }

    #[test]
    fn test_incremental_skip_leaves_output_untouched() {
        let (dir, registry, out) = fixture();
        fs::write(dir.path().join("src/img/data.bin"), b"payload").unwrap();

        let outcome = run(&registry, &out).unwrap();
        assert_eq!(outcome.processed, 1);
        let first = fs::read(out.join("img/data.bin")).unwrap();
        let first_mtime = crate::freshness::get_mtime(&out.join("img/data.bin")).unwrap();

        let outcome = run(&registry, &out).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.processed, 0);
        assert_eq!(fs::read(out.join("img/data.bin")).unwrap(), first);
        assert_eq!(
            crate::freshness::get_mtime(&out.join("img/data.bin")).unwrap(),
            first_mtime
        );
    }

    #[test]
    fn test_stale_output_reprocessed() {
        let (dir, registry, out) = fixture();
        let source = dir.path().join("src/img/data.bin");
        fs::write(&source, b"v1").unwrap();
        run(&registry, &out).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&source, b"v2").unwrap();

        let outcome = run(&registry, &out).unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(fs::read(out.join("img/data.bin")).unwrap(), b"v2");
    }

    #[test]
    fn test_corrupt_image_is_counted_not_fatal() {
        let (dir, registry, out) = fixture();
        fs::write(dir.path().join("src/img/broken.png"), b"not a png").unwrap();
        fs::write(dir.path().join("src/img/ok.bin"), b"fine").unwrap();

        let outcome = run(&registry, &out).unwrap();
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.processed, 1);
        assert!(!out.join("img/broken.png").exists());
        assert!(out.join("img/ok.bin").exists());
    }

    #[test]
    fn test_subtree_is_mirrored() {
        let (dir, registry, out) = fixture();
        fs::create_dir_all(dir.path().join("src/img/icons")).unwrap();
        fs::write(dir.path().join("src/img/icons/star.bin"), b"x").unwrap();

        run(&registry, &out).unwrap();
        assert!(out.join("img/icons/star.bin").is_file());
    }

    #[test]
    fn test_minify_svg_drops_indentation() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\">\n    <rect width=\"10\" height=\"10\"/>\n</svg>\n";
        let out = minify_svg(svg).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("\n    "));
    }
}
