//! Terminal output helpers. `colored` honours `NO_COLOR` and `CLICOLOR`.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").bold());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// Red bold `error:` prefix, to stderr.
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Yellow `warning:` prefix, to stderr.
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow().bold(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

pub fn success_detail(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Section header (cyan bold) preceded by a blank line.
pub fn header(msg: &(impl Display + ?Sized)) {
    println!("\n{}", msg.to_string().cyan().bold());
}

/// Indented, dimmed detail line.
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg.to_string().dimmed());
}

pub fn hint(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "•".yellow(), msg.to_string().yellow());
}

/// Indent every line of a multi-line snippet and dim it.
pub fn snippet(text: &str) {
    for line in text.lines() {
        println!("  {}", line.dimmed());
    }
}

pub fn format_bytes_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

pub fn format_bytes_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes_mb(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes_kb(1536), "1.5 KB");
    }
}
