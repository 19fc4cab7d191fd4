//! Script task: concatenate script sources and minify the bundle.
//!
//! Library files come before application files in the bundle; within each
//! group the order is deterministic. The concatenated unit is minified as
//! a single script.

use std::fs;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::error::TaskError;
use crate::registry::PathRegistry;

/// Run the script task. Returns the written artifact path for logging.
pub fn run(registry: &PathRegistry, output: &Path) -> Result<String, TaskError> {
    let sources = registry.script_sources()?;

    let mut bundle = String::new();
    for path in &sources {
        bundle.push_str(&super::read_text(path)?);
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
    }

    let minified = minify_js(&bundle)
        .map_err(|detail| TaskError::transform("script bundle", detail))?;

    let out_path = output.join("index.min.js");
    fs::write(&out_path, minified)?;
    Ok(out_path.display().to_string())
}

/// Minify JavaScript source code.
///
/// Returns the minified code, or the parser diagnostics on syntax errors.
fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::cjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let detail = ret
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        return Err(detail);
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}
