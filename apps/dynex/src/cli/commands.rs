//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::DynexConfig;
use crate::script::{apply_script, parse_script};
use dynex_core::{
    Clock, DynexError, GraphClock, Session, Step, TimeFormat, session_from_bytes,
    session_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for script ingestion (100 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum snapshot file size (500 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DynexError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DynexError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DynexError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it is a
/// regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DynexError> {
    let canonical = path.canonicalize().map_err(|e| {
        DynexError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DynexError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, DynexError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        DynexError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(DynexError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| DynexError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty snapshot.
pub fn cmd_init(
    snapshot: &Path,
    config: &DynexConfig,
    force: bool,
    static_graph: bool,
    time_format: Option<TimeFormat>,
    json_mode: bool,
) -> Result<(), DynexError> {
    if snapshot.exists() && !force {
        return Err(DynexError::IoError(
            "Snapshot already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let mut session = new_session(config);
    session.set_dynamic(config.dynamic && !static_graph);
    if let Some(format) = time_format {
        session.set_time_format(format);
    }
    save_session(&session, snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({
            "snapshot": snapshot.to_string_lossy(),
            "dynamic": session.is_dynamic(),
            "time_format": session.clock().time_format().gexf_name(),
        }));
    } else {
        println!("Initialized new snapshot at {:?}", snapshot);
    }
    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Apply a write script to the snapshot.
pub fn cmd_ingest(
    snapshot: &Path,
    config: &DynexConfig,
    file: &Path,
    json_mode: bool,
) -> Result<(), DynexError> {
    tracing::info!("Ingesting script {:?}", file);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_SCRIPT_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| DynexError::IoError(format!("Read file: {}", e)))?;
    let events = parse_script(&contents)?;

    let mut session = load_or_create_session(snapshot, config)?;
    let summary = apply_script(&mut session, &events)?;
    save_session(&session, snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({
            "writes": summary.writes,
            "removals": summary.removals,
            "records": session.history().len(),
            "step": session.current_step().value(),
        }));
    } else {
        println!(
            "Applied {} writes, {} removals",
            summary.writes, summary.removals
        );
        println!(
            "Snapshot now has {} records at step {}",
            session.history().len(),
            session.current_step()
        );
    }
    Ok(())
}

// =============================================================================
// ADVANCE COMMAND
// =============================================================================

/// Move the snapshot clock forward.
pub fn cmd_advance(
    snapshot: &Path,
    config: &DynexConfig,
    step: f64,
    json_mode: bool,
) -> Result<(), DynexError> {
    let mut session = load_or_create_session(snapshot, config)?;
    session.advance_to(Step::new(step)?)?;
    save_session(&session, snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({ "step": session.current_step().value() }));
    } else {
        println!("Clock now at step {}", session.current_step());
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Per-export overrides of the snapshot clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportOptions {
    /// Advance the clock before exporting.
    pub step: Option<f64>,
    /// Force the dynamic (`Some(true)`) or static (`Some(false)`) shape.
    pub dynamic: Option<bool>,
    /// Override the time format.
    pub time_format: Option<TimeFormat>,
    /// Persist sealed records back to the snapshot.
    pub save: bool,
}

/// Export the snapshot as GEXF attvalue XML.
///
/// The document is rendered in memory and replaces `output` only once it is
/// complete; on any failure the previous file is untouched and the snapshot
/// is not saved. Open records are sealed at the export step. Unless `save`
/// is off, the sealed state is written back so later exports reproduce the
/// same output.
pub fn cmd_export(
    snapshot: &Path,
    config: &DynexConfig,
    output: &Path,
    options: &ExportOptions,
    json_mode: bool,
) -> Result<(), DynexError> {
    let validated_output = validate_output_path(output)?;
    let mut session = load_or_create_session(snapshot, config)?;

    if let Some(step) = options.step {
        session.advance_to(Step::new(step)?)?;
    }
    if let Some(dynamic) = options.dynamic {
        session.set_dynamic(dynamic);
    }
    if let Some(format) = options.time_format {
        session.set_time_format(format);
    }

    let open_before = session.history().open_count();
    let data = session.export_xml(Vec::new(), config.indent)?;
    write_file_atomic(&validated_output, &data)?;

    if options.save {
        save_session(&session, snapshot)?;
    }

    tracing::info!(
        records = session.history().len(),
        sealed = open_before,
        "Exported to {:?}",
        validated_output
    );

    if json_mode {
        print_json(&serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "records": session.history().len(),
            "sealed": open_before,
            "step": session.current_step().value(),
            "dynamic": session.is_dynamic(),
        }));
    } else {
        println!(
            "Exported {} records to {:?} ({} sealed at step {})",
            session.history().len(),
            validated_output,
            open_before,
            session.current_step()
        );
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show snapshot status.
pub fn cmd_status(snapshot: &Path, config: &DynexConfig, json_mode: bool) -> Result<(), DynexError> {
    let session = load_or_create_session(snapshot, config)?;
    let history = session.history();
    let format = session.clock().time_format();

    if json_mode {
        print_json(&serde_json::json!({
            "snapshot": snapshot.to_string_lossy(),
            "step": session.current_step().value(),
            "dynamic": session.is_dynamic(),
            "time_format": format.gexf_name(),
            "records": history.len(),
            "open_records": history.open_count(),
        }));
        return Ok(());
    }

    println!("Dynex Snapshot Status");
    println!("=====================");
    println!("Snapshot:     {:?}", snapshot);
    println!();
    println!("Step:         {}", session.current_step());
    println!("Mode:         {}", if session.is_dynamic() { "dynamic" } else { "static" });
    println!("Time Format:  {}", format);
    println!("Records:      {}", history.len());
    println!("Open Records: {}", history.open_count());

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn new_session(config: &DynexConfig) -> Session {
    let mut session =
        Session::with_clock(GraphClock::new().with_time_format(config.time_format));
    session.set_dynamic(config.dynamic);
    session
}

/// Load the snapshot, or start a fresh session from config if none exists.
pub fn load_or_create_session(snapshot: &Path, config: &DynexConfig) -> Result<Session, DynexError> {
    if !snapshot.exists() {
        tracing::debug!("No snapshot at {:?}, starting fresh", snapshot);
        return Ok(new_session(config));
    }

    validate_file_size(snapshot, MAX_SNAPSHOT_FILE_SIZE)?;
    let data = std::fs::read(snapshot)
        .map_err(|e| DynexError::IoError(format!("Read snapshot: {}", e)))?;
    session_from_bytes(&data)
}

/// Save a session to a snapshot path.
pub fn save_session(session: &Session, snapshot: &Path) -> Result<(), DynexError> {
    let data = session_to_bytes(session)?;
    write_file_atomic(snapshot, &data)?;
    tracing::debug!(bytes = data.len(), "Saved snapshot to {:?}", snapshot);
    Ok(())
}

/// Write `data` to a sibling temp file, then move it over `path`.
///
/// Readers of `path` see either the old contents or the complete new ones.
fn write_file_atomic(path: &Path, data: &[u8]) -> Result<(), DynexError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| DynexError::IoError(format!("Path {:?} has no filename", path)))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Err(e) = std::fs::write(&temp_path, data) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(DynexError::IoError(format!(
            "Write {:?}: {}",
            temp_path, e
        )));
    }
    std::fs::rename(&temp_path, path)
        .map_err(|e| DynexError::IoError(format!("Move {:?} into place: {}", temp_path, e)))
}
