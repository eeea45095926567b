use crate::pipeline::SliceSummary;
use crate::utils::normalize_display_path;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Write;
use std::path::Path;

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write, destination: &Path) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Go Slice Results                      ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(
        writer,
        "{} {}",
        "Destination:".bold(),
        normalize_display_path(destination)
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print summary with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(writer: &mut impl Write, summary: &SliceSummary) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().dimmed())
        } else {
            format!("{}: {}", label, count.to_string().green().bold())
        }
    }

    writeln!(
        writer,
        "{}  {}  {}  {}",
        pill("Files", summary.files_written.len()),
        pill("Dropped", summary.files_dropped.len()),
        pill("Ranges", summary.uncovered_ranges),
        pill("Structural edits", summary.structural_edits),
    )?;
    writeln!(
        writer,
        "{}  {}  {}  {}",
        pill("Oracle rounds", summary.rounds),
        pill("Soft diagnostics", summary.soft_diagnostics),
        pill("Fix edits", summary.fix_edits),
        pill("Objects removed", summary.objects_removed),
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Print the emitted and dropped files.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_files(writer: &mut impl Write, summary: &SliceSummary) -> std::io::Result<()> {
    if summary.files_written.is_empty() && summary.files_dropped.is_empty() {
        return Ok(());
    }

    let mut table = create_table(vec!["File", "Status"]);
    for file in &summary.files_written {
        table.add_row(vec![
            Cell::new(normalize_display_path(file)),
            Cell::new("written").fg(Color::Green),
        ]);
    }
    for file in &summary.files_dropped {
        table.add_row(vec![
            Cell::new(normalize_display_path(file)).add_attribute(Attribute::Dim),
            Cell::new("dropped").fg(Color::Yellow),
        ]);
    }
    writeln!(writer, "{table}")?;
    writeln!(writer)?;
    Ok(())
}

/// Print the full human-readable report.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_report(
    writer: &mut impl Write,
    destination: &Path,
    summary: &SliceSummary,
) -> std::io::Result<()> {
    print_header(writer, destination)?;
    print_summary_pills(writer, summary)?;
    print_files(writer, summary)?;
    if summary.packages.is_empty() {
        writeln!(writer, "{}", "No package survived slicing.".yellow())?;
    } else {
        writeln!(
            writer,
            "{} {}",
            "Packages:".bold(),
            summary.packages.join(", ")
        )?;
    }
    Ok(())
}

/// Print the summary as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json(writer: &mut impl Write, summary: &SliceSummary) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}
