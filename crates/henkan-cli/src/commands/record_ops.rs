use std::collections::BTreeMap;
use std::path::Path;

use henkan_core::record::{RecordStore, Row, Value};

use crate::error::{CliError, Context};

fn format_value(v: &Value) -> String {
    match v {
        Value::Empty => "-".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Text(s) => format!("{s:?}"),
    }
}

fn format_row(row: &Row) -> String {
    row.values()
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print every section of a learning store (or just `section`).
pub fn dump(path: &str, section: Option<&str>, json: bool) -> Result<(), CliError> {
    let store = RecordStore::open(Path::new(path))
        .context(format!("Error opening learning store {path}"))?;
    let names: Vec<&str> = store
        .section_names()
        .filter(|name| section.map_or(true, |s| s == *name))
        .collect();
    if let Some(s) = section {
        if names.is_empty() {
            return Err(CliError::Usage(format!("no section named {s}")));
        }
    }

    if json {
        let mut out: BTreeMap<&str, BTreeMap<&str, &[Value]>> = BTreeMap::new();
        for name in &names {
            let Some(sec) = store.section(name) else {
                continue;
            };
            out.insert(*name, sec.iter().map(|(k, row)| (k, row.values())).collect());
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for name in names {
        let Some(sec) = store.section(name) else {
            continue;
        };
        println!("[{name}] {} rows", sec.len());
        for (key, row) in sec.iter() {
            println!("  {key}\t{}", format_row(row));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_render() {
        assert_eq!(format_value(&Value::Empty), "-");
        assert_eq!(format_value(&Value::Int(-3)), "-3");
        assert_eq!(format_value(&Value::Text("端".into())), "\"端\"");
    }
}
