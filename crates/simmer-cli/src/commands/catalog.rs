use simmer_core::Catalog;

use super::CliResult;

pub fn run() -> CliResult {
    let json = serde_json::to_string_pretty(&Catalog::build())?;
    println!("{json}");
    Ok(())
}
