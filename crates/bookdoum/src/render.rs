use std::io::Write;

use anyhow::{Context, Result};
use bookdoum_core::SearchResult;
use clap::ValueEnum;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Writes the hits of `result`, one row per record, restricted to
/// `columns`.
pub fn render_result<W: Write>(
    result: &SearchResult,
    columns: &[String],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let rows = result.rows(columns);
    match format {
        OutputFormat::Table => {
            let mut text = format!("{}건 검색됨\n\n", result.len());
            render_table(columns, &rows, &mut text);
            out.write_all(text.as_bytes())?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            writer.write_record(columns)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush().context("failed to write csv output")?;
        }
        OutputFormat::Json => {
            for row in &rows {
                let object: IndexMap<&str, &str> = columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect();
                serde_json::to_writer(&mut *out, &object)?;
                out.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

pub fn no_results_message(term: &str) -> String {
    format!("'{}'에 대한 검색 결과가 없습니다.", term)
}

const MIN_RULE_WIDTH: usize = 3;

/// Pipe table with every column padded to its widest cell, so rows line up
/// in a terminal even when cells mix Hangul and ASCII.
fn render_table(headers: &[String], rows: &[Vec<String>], out: &mut String) {
    let headers: Vec<String> = headers.iter().map(|header| escape_cell(header)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| display_width(cell))
                .fold(display_width(header).max(MIN_RULE_WIDTH), usize::max)
        })
        .collect();
    push_row(&headers, &widths, out);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_row(&rule, &widths, out);
    for row in &rows {
        push_row(row, &widths, out);
    }
}

fn push_row(cells: &[String], widths: &[usize], out: &mut String) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        let pad = width.saturating_sub(display_width(cell));
        out.extend(std::iter::repeat(' ').take(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Collapses line breaks and tabs into single spaces and escapes `|`.
fn escape_cell(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Terminal columns taken by `text`. Hangul, CJK and fullwidth forms take
/// two.
fn display_width(text: &str) -> usize {
    text.chars().map(|ch| if is_wide(ch) { 2 } else { 1 }).sum()
}

fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}
