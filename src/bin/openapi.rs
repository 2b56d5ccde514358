use anyhow::Result;

// Print the generated OpenAPI document; CI publishes this for clients.
fn main() -> Result<()> {
    let spec = raporti::api::openapi();
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}
