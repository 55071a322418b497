//! Markdown report generation

use crate::report::stats::ReportSummary;
use crate::report::ReportResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(ReportError)` - Failed to write the report
pub fn write_markdown(summary: &ReportSummary, output_path: &Path) -> ReportResult<()> {
    let markdown = format_markdown(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a summary as markdown
pub fn format_markdown(summary: &ReportSummary) -> String {
    let mut md = String::new();

    md.push_str("# Crawl Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at));
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n\n",
        summary.duration_seconds,
        summary.duration_seconds as f64 / 60.0
    ));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Fetches**: {}\n", summary.total_fetches));
    md.push_str(&format!("- **Unique Pages**: {}\n", summary.unique_pages));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    match &summary.longest_page {
        Some(longest) => md.push_str(&format!(
            "- **Longest Page**: {} ({} words)\n\n",
            longest.url, longest.word_count
        )),
        None => md.push_str("- **Longest Page**: none\n\n"),
    }

    if !summary.status_counts.is_empty() {
        md.push_str("## Fetches by Status\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &summary.status_counts {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
        md.push('\n');
    }

    if !summary.common_words.is_empty() {
        md.push_str(&format!(
            "## Top {} Words\n\n",
            summary.common_words.len()
        ));
        md.push_str("| Rank | Word | Count |\n");
        md.push_str("|------|------|-------|\n");
        for (rank, (word, count)) in summary.common_words.iter().enumerate() {
            md.push_str(&format!("| {} | {} | {} |\n", rank + 1, word, count));
        }
        md.push('\n');
    }

    md.push_str("## Subdomains\n\n");
    md.push_str(&format!("Total: {}\n\n", summary.subdomains.len()));
    for (host, pages) in &summary.subdomains {
        md.push_str(&format!("- {}, {}\n", host, pages));
    }

    md
}
