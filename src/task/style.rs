//! Style task: compile the stylesheet entry file to compressed CSS.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use crate::error::TaskError;
use crate::registry::PathRegistry;

/// Run the style task. Returns the written artifact path for logging.
pub fn run(registry: &PathRegistry, output: &Path) -> Result<String, TaskError> {
    let entry = registry.style_entry();
    let source = super::read_text(&entry)?;

    let compressed = compile_css(&source)
        .map_err(|detail| TaskError::transform(entry.display().to_string(), detail))?;

    let out_path = output.join("style.css");
    fs::write(&out_path, compressed)?;
    Ok(out_path.display().to_string())
}

/// Parse CSS and print it minified.
///
/// Errors are returned as strings; the parse error borrows the source.
fn compile_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}
