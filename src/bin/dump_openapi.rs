use std::fs;

use utoipa::OpenApi;
use votegate::docs::ApiDoc;

/// Writes the OpenAPI document to the path given as first argument, or stdout.
fn main() -> anyhow::Result<()> {
    let doc = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    match std::env::args().nth(1) {
        Some(path) => {
            fs::write(&path, doc)?;
            println!("wrote {}", path);
        }
        None => println!("{}", doc),
    }
    Ok(())
}
