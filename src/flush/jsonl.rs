use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::model::Record;

pub const NDJSON_EXTENSION: &str = "ndjson";
pub const MAPPING_SUFFIX: &str = "mapping.json";

/// Write an iterator of serializable items as newline-delimited JSON, one
/// object per line. Non-ASCII text is written as UTF-8, not escaped.
pub fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Write each index to `<output_dir>/<index>.ndjson`, creating the directory
/// if needed. Records keep their field order.
pub fn write_indices<'a>(
    output_dir: &Path,
    indices: impl IntoIterator<Item = (&'a str, &'a [Record])>,
) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    for (name, records) in indices {
        let path = output_dir.join(format!("{name}.{NDJSON_EXTENSION}"));
        write_jsonl(&path, records.iter())?;
        tracing::debug!(index = name, records = records.len(), path = %path.display(), "index written");
    }
    Ok(())
}

/// Write each index mapping to `<output_dir>/<index>.mapping.json`.
pub fn write_mappings<'a>(output_dir: &Path, mappings: impl IntoIterator<Item = (&'a str, &'a Value)>) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    for (name, mapping) in mappings {
        let path = output_dir.join(format!("{name}.{MAPPING_SUFFIX}"));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, mapping)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(())
}

/// Number of `.ndjson` files already in `dir`. A missing directory has none.
pub fn count_existing(dir: &Path) -> io::Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == NDJSON_EXTENSION) {
            count += 1;
        }
    }
    Ok(count)
}
