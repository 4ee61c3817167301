use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::listing::ScrapeResult;

pub const RESULTS_FILE: &str = "results.json";

/// Writes `result` to `<dir>/results.json`, replacing any earlier run.
pub fn write_results(result: &ScrapeResult, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(RESULTS_FILE);

    let mut writer = BufWriter::new(File::create(&path)?);
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    result.serialize(&mut ser)?;
    writer.flush()?;

    info!("Wrote {} listings to {}", result.len(), path.display());
    Ok(path)
}

pub fn read_results(path: &Path) -> Result<ScrapeResult> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Human-readable dump, one block per listing, blank line between blocks.
pub fn print_results<W: Write>(result: &ScrapeResult, out: &mut W) -> Result<()> {
    for listing in &result.listings {
        writeln!(out, "{}", listing)?;
    }
    Ok(())
}
