use std::fs;

use henkan_core::settings::{default_toml, parse_settings_toml};

use crate::error::CliError;

pub fn settings_export() {
    print!("{}", default_toml());
}

pub fn settings_validate(file: &str) -> Result<(), CliError> {
    let content = fs::read_to_string(file)?;
    parse_settings_toml(&content)?;
    eprintln!("{file}: OK");
    Ok(())
}
