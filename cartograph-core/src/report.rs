// Console report for a finished survey run

use cartograph_engine::Summary;
use colored::Colorize;

/// Plain-text report lines, without color. Kept separate from printing
/// so the layout is testable.
pub fn render_summary(summary: &Summary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Run:              {}", summary.run_id));
    lines.push(format!("Generated:        {}", summary.generated_at));
    lines.push(format!(
        "Authentication:   {} ({} attempt{})",
        if summary.auth_success { "ok" } else { "failed" },
        summary.auth_attempts,
        if summary.auth_attempts == 1 { "" } else { "s" }
    ));
    lines.push(format!("Pages captured:   {}", summary.total_pages));
    lines.push(format!("API exchanges:    {}", summary.total_exchanges));
    lines.push(format!("Unique endpoints: {}", summary.unique_endpoints.len()));
    lines.push(format!("Forms:            {}", summary.total_forms));
    lines.push(format!("Buttons:          {}", summary.total_buttons));
    lines.push(format!("Nav links:        {}", summary.total_navigation_links));
    lines.push(format!("CSS classes:      {}", summary.total_css_classes));
    lines.push(format!("Page errors:      {}", summary.total_errors));
    if summary.memory_warnings > 0 {
        lines.push(format!("Memory warnings:  {}", summary.memory_warnings));
    }
    if let Some(fatal) = &summary.fatal {
        lines.push(format!("Fatal:            {}", fatal));
    }
    lines
}

/// Print the colored end-of-run report to stdout.
pub fn print_summary(summary: &Summary) {
    println!();
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!("{}", "  SURVEY COMPLETE".bright_white().bold());
    println!("{}", "═".repeat(60).bright_blue().bold());

    for line in render_summary(summary) {
        println!("  {}", line);
    }

    if !summary.unique_endpoints.is_empty() {
        println!();
        println!("{}", "  Endpoints observed:".bright_cyan().bold());
        for endpoint in &summary.unique_endpoints {
            println!("    {} {}", "→".blue(), endpoint);
        }
    }

    println!();
    if summary.fatal.is_some() {
        println!("{} Run ended with a fatal error", "✗".red().bold());
    } else if summary.total_errors > 0 {
        println!(
            "{} Run finished with {} page error(s)",
            "→".yellow().bold(),
            summary.total_errors
        );
    } else {
        println!("{} Run finished cleanly", "✓".green().bold());
    }
}
