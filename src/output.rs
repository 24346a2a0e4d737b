//! Text and JSON rendering of listings, server details and save results.

use std::io::Write;

use anyhow::{Context, Result};
use fetchtv_core::report::{summarize_directories, summarize_save};
use fetchtv_core::{Directory, MediaServer, SaveReport};
use serde::Serialize;

/// Writes `value` as pretty JSON followed by a newline.
fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to serialize JSON output")?;
    writeln!(out)?;
    Ok(())
}

pub fn write_heading<W: Write>(out: &mut W, label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        writeln!(out, "[+] {label}")?;
    } else {
        writeln!(out, "[+] {label}: {value}")?;
    }
    Ok(())
}

/// Device details for `--info`.
pub fn write_server_info<W: Write>(out: &mut W, server: &MediaServer, json: bool) -> Result<()> {
    if json {
        return write_json(out, server);
    }
    write_heading(out, "Server", &server.friendly_name)?;
    let fields = [
        ("manufacturer", server.manufacturer.as_str()),
        ("manufacturer_url", server.manufacturer_url.as_str()),
        ("model_name", server.model_name.as_str()),
        ("model_number", server.model_number.as_str()),
        ("serial_number", server.serial_number.as_str()),
        ("udn", server.udn.as_str()),
        ("location", server.location.as_str()),
        (
            "content_directory_url",
            server.content_directory_url.as_deref().unwrap_or("-"),
        ),
    ];
    for (name, value) in fields {
        writeln!(out, "\t -- {name}: {value}")?;
    }
    Ok(())
}

/// Folder titles with their items, or the listing payload as JSON.
pub fn write_listing<W: Write>(out: &mut W, shows: &[Directory], json: bool) -> Result<()> {
    if json {
        return write_json(out, &summarize_directories(shows));
    }
    write_heading(out, "List Recordings", "")?;
    if shows.is_empty() {
        writeln!(out, "\t -- [!] No recordings found!")?;
    }
    for show in shows {
        writeln!(out, "\t -- {}", show.title)?;
        for item in &show.items {
            writeln!(out, "\t\t -- {} ({})", item.title, item.url)?;
        }
    }
    Ok(())
}

/// Save payload as JSON. Text mode output comes from the event renderer.
pub fn write_save_results<W: Write>(out: &mut W, report: &SaveReport) -> Result<()> {
    write_json(out, &summarize_save(report))
}
