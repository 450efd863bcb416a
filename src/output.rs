use colored::Colorize;

use crate::{
    report::{ProfileReport, Report},
    rules::Severity,
    scoring::Grade
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    pub verbose: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            verbose: false
        }
    }
}

/// Format a single-query report based on output options
pub fn format_report(report: &Report, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(report).unwrap_or_default(),
        OutputFormat::Text => format_report_text(report, opts)
    }
}

/// Format a profiler batch report based on output options
pub fn format_profile_report(report: &ProfileReport, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(report).unwrap_or_default(),
        OutputFormat::Text => format_profile_text(report, opts)
    }
}

fn format_report_text(report: &Report, opts: &OutputOptions) -> String {
    let mut out = String::new();

    let header = "=== Query Analysis ===";
    if opts.colored {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(header);
    }
    out.push_str("\n\n");
    out.push_str(&format!("{}\n\n", report.sanitized_sql));

    let grade_text = format!(
        "Grade: {}  (score {:.1}, {})",
        report.grade(),
        report.composite_score(),
        if report.passed() { "passed" } else { "failed" }
    );
    out.push_str(&paint_grade(&grade_text, report.grade(), opts));
    out.push('\n');

    if report.plan_unavailable {
        out.push_str("Plan: unavailable, static analysis only\n");
    } else if let Some(driver) = &report.driver {
        out.push_str(&format!("Plan: from driver '{}'\n", driver));
    } else {
        out.push_str("Plan: from captured EXPLAIN output\n");
    }

    let b = &report.scores.breakdown;
    out.push_str(&format!(
        "Scores: index {:.0} | efficiency {:.0} | scalability {:.0} | execution {:.0} | cost \
         {:.0}\n",
        b.index_quality.score,
        b.efficiency.score,
        b.scalability.score,
        b.execution.score,
        b.cost.score
    ));

    if !report.findings.is_empty() {
        out.push('\n');
        for finding in &report.findings {
            let line = format!(
                "[{}] {} ({}): {}",
                finding.severity, finding.title, finding.category, finding.description
            );
            out.push_str(&paint_severity(&line, finding.severity, opts));
            out.push('\n');
            out.push_str(&format!("        fix: {}\n", finding.recommendation));
        }
    }

    if !report.root_causes.is_empty() {
        let causes: Vec<String> = report.root_causes.iter().map(|c| c.to_string()).collect();
        out.push_str(&format!("\nRoot causes: {}\n", causes.join(", ")));
    }

    out.push_str(&format!("\nRecommendation: {}\n", report.top_recommendation));

    if !report.index_proposals.is_empty() {
        out.push_str("\nIndex proposals:\n");
        for proposal in &report.index_proposals {
            out.push_str(&format!(
                "  {} -- {} impact, {}\n",
                proposal.statement, proposal.impact, proposal.rationale
            ));
        }
    }

    if opts.verbose && !report.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for diagnostic in &report.diagnostics {
            out.push_str(&format!("  {:?}: {}\n", diagnostic.kind, diagnostic.message));
        }
    }

    out
}

fn format_profile_text(report: &ProfileReport, opts: &OutputOptions) -> String {
    let mut out = String::new();

    let header = "=== Profile Analysis ===";
    if opts.colored {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(header);
    }
    out.push_str("\n\n");

    out.push_str(&format!(
        "Captures: {} total, {} analyzed, {} skipped, {:.1} ms cumulative\n",
        report.total_captures, report.analyzed, report.skipped, report.total_time_ms
    ));

    if report.n_plus_one_detected {
        let line = "N+1 query pattern detected";
        if opts.colored {
            out.push_str(&line.red().bold().to_string());
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !report.duplicate_queries.is_empty() {
        out.push_str("\nRepeated queries:\n");
        for (normalized, count) in &report.duplicate_queries {
            out.push_str(&format!("  {}x {}\n", count, normalized));
        }
    }

    if let Some(worst) = &report.worst {
        out.push_str("\nWorst query:\n");
        out.push_str(&indent(&format_report_text(worst, opts)));
    }
    if opts.verbose
        && let Some(slowest) = &report.slowest
    {
        out.push_str("\nSlowest query:\n");
        out.push_str(&indent(&format_report_text(slowest, opts)));
    }

    out
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}\n", line))
        .collect()
}

fn paint_grade(text: &str, grade: Grade, opts: &OutputOptions) -> String {
    if !opts.colored {
        return text.to_string();
    }
    match grade {
        Grade::APlus | Grade::A | Grade::BPlus | Grade::B => text.green().bold().to_string(),
        Grade::C | Grade::D => text.yellow().bold().to_string(),
        Grade::F => text.red().bold().to_string()
    }
}

fn paint_severity(text: &str, severity: Severity, opts: &OutputOptions) -> String {
    if !opts.colored {
        return text.to_string();
    }
    match severity {
        Severity::Critical => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Info => text.cyan().to_string()
    }
}
