//! Writes the gateway's OpenAPI document to a file or stdout.

use crate::openapi::ApiDoc;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use utoipa::OpenApi;

/// Generates the OpenAPI document.
///
/// `output` selects the destination: `None` streams YAML to stdout, `"json"` or
/// `"yaml"` stream that format to stdout, and anything else is a file path whose
/// extension picks the format (YAML unless it ends in `.json`).
///
/// # Errors
/// Returns an error if the document cannot be serialized or written.
pub fn generate_spec(output: Option<&str>) -> anyhow::Result<()> {
    let openapi = ApiDoc::openapi();

    match output {
        Some("json") => io::stdout().write_all(openapi.to_pretty_json()?.as_bytes())?,
        Some("yaml") | None => io::stdout().write_all(openapi.to_yaml()?.as_bytes())?,
        Some(path) => {
            let path = Path::new(path);
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

            let rendered = if is_json {
                openapi.to_pretty_json()?
            } else {
                openapi.to_yaml()?
            };
            fs::write(path, rendered)?;
            println!("OpenAPI spec written to {}", path.display());
        }
    }

    Ok(())
}
