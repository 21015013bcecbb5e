//! Console summary of a finished run.

use colored::Colorize;
use std::path::Path;

use civic_extraction::{ExtractionReport, ValidationStatus};

/// Descriptions shown per record kind.
const PREVIEW_LIMIT: usize = 5;

pub fn print_banner() {
    let rule = "=".repeat(60);
    println!();
    println!("{}", rule.bright_cyan());
    println!("{}", format!("{:^60}", "CIViC Extraction Pipeline").bright_cyan().bold());
    println!("{}", rule.bright_cyan());
    println!();
}

pub fn print_report(report: &ExtractionReport, output: &Path) {
    let rule = "=".repeat(60);
    println!();
    println!("{}", "Extraction Results:".bold());
    println!("{rule}");

    print_section(
        "Variants Found",
        report.variants.iter().map(|r| r.description.as_str()),
    );
    print_section(
        "Clinical Evidence Items",
        report.clinical_evidence.iter().map(|r| r.description.as_str()),
    );
    print_section(
        "Molecular Data Items",
        report.molecular_data.iter().map(|r| r.description.as_str()),
    );

    let status = report.metadata.validation_status;
    let status_label = format!("{status:?}").to_lowercase();
    let status_label = match status {
        ValidationStatus::Valid | ValidationStatus::Processed => status_label.green(),
        ValidationStatus::Invalid | ValidationStatus::Pending => status_label.yellow(),
        ValidationStatus::Failed => status_label.red(),
    };
    println!();
    println!("Validation status: {status_label}");
    if let Some(error) = &report.metadata.error {
        println!("{} {}", "Error:".red().bold(), error);
    }

    let stats = &report.stats;
    println!();
    println!("{}", "Processing Statistics:".bold());
    println!("  processing_time: {:.2}s", stats.processing_time);
    println!("  text_length: {}", stats.text_length);
    println!("  num_variants: {}", stats.num_variants);
    println!("  num_clinical_evidence: {}", stats.num_clinical_evidence);
    println!("  num_molecular_data: {}", stats.num_molecular_data);
    println!("  overall_confidence: {:.2}", stats.overall_confidence);
    println!("{rule}");
    println!("Saved to {}", output.display().to_string().bright_green());
}

fn print_section<'a>(title: &str, descriptions: impl ExactSizeIterator<Item = &'a str>) {
    if descriptions.len() == 0 {
        return;
    }
    println!();
    println!("{}: {}", title.bold(), descriptions.len());
    for line in preview_lines(descriptions) {
        println!("{line}");
    }
}

/// Up to [`PREVIEW_LIMIT`] bullet lines plus a remainder line.
pub fn preview_lines<'a>(descriptions: impl ExactSizeIterator<Item = &'a str>) -> Vec<String> {
    let total = descriptions.len();
    let mut lines: Vec<String> = descriptions
        .take(PREVIEW_LIMIT)
        .map(|d| {
            if d.is_empty() {
                "- No description".to_string()
            } else {
                format!("- {d}")
            }
        })
        .collect();

    if total > PREVIEW_LIMIT {
        lines.push(format!("... and {} more", total - PREVIEW_LIMIT));
    }
    lines
}
