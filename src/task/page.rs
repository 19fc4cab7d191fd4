//! Page task: compile the markdown entry file to a markup document.
//!
//! Reads the single page entry file, renders it to HTML, wraps it in a
//! minimal document shell referencing the pipeline's stylesheet and script
//! bundle, and writes it next to them in the output directory.

use std::fs;
use std::path::Path;

use pulldown_cmark::{Options, Parser, html};

use crate::error::TaskError;
use crate::registry::PathRegistry;

/// Run the page task. Returns the written artifact path for logging.
pub fn run(registry: &PathRegistry, output: &Path) -> Result<String, TaskError> {
    let entry = registry.page_entry();
    let source = super::read_text(&entry)?;

    let body = render_markdown(&source);
    let title = entry
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index");
    let document = document_shell(title, &body);

    let out_path = output.join("index.html");
    fs::write(&out_path, document)?;
    Ok(out_path.display().to_string())
}

/// Render markdown to an HTML fragment.
fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options);
    let mut body = String::with_capacity(source.len() * 2);
    html::push_html(&mut body, parser);
    body
}

/// Wrap a rendered body in a minimal HTML document referencing the other
/// pipeline outputs.
fn document_shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"style.css\">\n\
         <script src=\"index.min.js\" defer></script>\n\
         </head>\n\
         <body>\n{body}</body>\n\
         </html>\n"
    )
}
