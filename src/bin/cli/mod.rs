//! Terminal rendering helpers for the `hardgate` binary: gate tables and
//! the `--stats` extension inventory, in the rounded-table/`owo-colors`
//! idiom `valknut`'s `cli::output::display` module uses.

use hardgate_core::gates::scorer::priority;
use hardgate_core::{GateScore, GateStatus, ValidationResult};
use owo_colors::OwoColorize;
use std::collections::HashMap;
use tabled::{settings::Style as TableStyle, Table, Tabled};

#[derive(Tabled)]
struct GateRow {
    #[tabled(rename = "Gate")]
    gate: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Found/Expected")]
    found_expected: String,
}

fn status_badge(status: GateStatus) -> String {
    match status {
        GateStatus::Pass => "PASS".green().bold().to_string(),
        GateStatus::Warning => "WARNING".yellow().bold().to_string(),
        GateStatus::Fail | GateStatus::Failed => "FAIL".red().bold().to_string(),
        GateStatus::NotApplicable => "N/A".dimmed().to_string(),
        GateStatus::Unsupported => "UNSUPPORTED".dimmed().to_string(),
    }
}

fn gate_row(score: &GateScore) -> GateRow {
    GateRow {
        gate: score.gate.as_str().to_string(),
        priority: priority(score.gate).as_str().to_string(),
        status: status_badge(score.status),
        score: format!("{:.1}", score.final_score),
        coverage: format!("{:.1}%", score.coverage),
        found_expected: format!("{}/{}", score.found, score.expected),
    }
}

/// Print the full per-gate table plus a summary line, mirroring
/// `valknut`'s "rounded table + bold summary" layout.
pub fn print_validation_result(result: &ValidationResult) {
    println!(
        "{}",
        format!("Hard Gate Report — {}", result.project_name).bold()
    );
    println!(
        "{} files, {} lines, primary language: {}",
        result.total_files,
        result.total_lines,
        result
            .primary_language
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!();

    let rows: Vec<GateRow> = result.gate_scores.iter().map(gate_row).collect();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    println!();

    let overall = format!("{:.1}", result.overall_score);
    let overall = if result.overall_score >= 80.0 {
        overall.green().bold().to_string()
    } else if result.overall_score >= 60.0 {
        overall.yellow().bold().to_string()
    } else {
        overall.red().bold().to_string()
    };
    println!(
        "Overall score: {overall}  (pass {}, warning {}, fail {})",
        result.passed_count, result.warning_count, result.failed_count
    );

    if !result.critical_issues.is_empty() {
        println!();
        println!("{}", "Critical issues:".red().bold());
        for issue in &result.critical_issues {
            println!("  - {issue}");
        }
    }

    if !result.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".bold());
        for rec in result.recommendations.iter().take(10) {
            println!("  - {rec}");
        }
    }
}

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Extension")]
    extension: String,
    #[tabled(rename = "Files")]
    count: usize,
}

/// Print the `hardgate scan --stats` file-extension inventory table.
pub fn print_extension_inventory(counts: &HashMap<String, usize>) {
    let mut rows: Vec<ExtensionRow> = counts
        .iter()
        .map(|(ext, count)| ExtensionRow { extension: format!(".{ext}"), count: *count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.extension.cmp(&b.extension)));

    println!();
    println!("{}", "File extension inventory:".bold());
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
}
