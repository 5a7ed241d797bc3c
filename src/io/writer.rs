// src/io/writer.rs
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Serialize a result and write it to `output_path`, creating parent
/// directories as needed.
pub fn write_result<T: Serialize>(value: &T, output_path: &Path, pretty: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, to_json(value, pretty)?)?;
    Ok(())
}
