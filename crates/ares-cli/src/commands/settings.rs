use std::path::Path;

use ares_engine::Settings;

pub fn run(path: &Path) -> Result<(), String> {
    let settings = Settings::load(path);
    let text = toml::to_string_pretty(&settings).map_err(|e| e.to_string())?;
    print!("{text}");
    Ok(())
}
