const SETTINGS_PATH: &str = "src/default_settings.toml";
const SECTIONS: [&str; 5] = ["lattice", "wordlist", "metaword", "candidates", "learning"];

fn main() {
    println!("cargo:rerun-if-changed={SETTINGS_PATH}");
    check_settings(include_str!("src/default_settings.toml"));
}

/// The embedded defaults must parse and carry every section the
/// `Settings` struct reads.
fn check_settings(content: &str) {
    let value = match content.parse::<toml::Value>() {
        Ok(v) => v,
        Err(e) => panic!("{SETTINGS_PATH} contains invalid TOML: {e}"),
    };
    for section in SECTIONS {
        if value.get(section).and_then(toml::Value::as_table).is_none() {
            panic!("{SETTINGS_PATH} is missing the [{section}] table");
        }
    }
}
