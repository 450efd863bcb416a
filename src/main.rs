//! # Query Sentinel CLI
//!
//! SQL performance diagnostics from the command line.
//!
//! The `analyze` command runs the static pipeline over one or more SQL
//! statements, optionally joined with captured EXPLAIN output; the
//! `profile` command replays a JSON capture log through the batch profiler
//! and reports duplicate queries, N+1 patterns, and the worst offender.
//!
//! # Exit Codes
//!
//! - `0` - every analyzed query passed
//! - `1` - at least one query failed acceptance without critical findings
//! - `2` - critical findings present
//!
//! ```bash
//! # Static analysis of a query file
//! query-sentinel analyze -q queries.sql
//!
//! # Join a query with its captured plan
//! query-sentinel analyze -q slow.sql --plan explain.json
//!
//! # Replay a profiler capture log
//! query-sentinel profile -c captures.json -f json
//! ```

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::Path,
    process,
    time::Duration
};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use query_sentinel::{
    capture::QueryCapture,
    cli::{Cli, Commands, Format},
    config::Config,
    engine::Engine,
    error::{AppResult, capture_log_error, file_read_error},
    output::{OutputFormat, OutputOptions, format_profile_report, format_report},
    plan::{ExplainRow, PlanOutput},
    report::Report
};
use tokio::main;

#[main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let engine = Engine::with_config(&config);

    match cli.command {
        Commands::Analyze {
            queries,
            plan,
            output_format,
            verbose,
            no_color
        } => {
            let sql = read_input(&queries)?;
            let plan_output = plan.map(|path| read_plan(&path)).transpose()?;
            let opts = output_options(output_format, no_color, verbose);

            let statements = split_statements(&sql);
            let mut reports = Vec::new();
            for (index, statement) in statements.iter().enumerate() {
                // a captured plan can only describe a single statement
                let statement_plan = if index == 0 && statements.len() == 1 {
                    plan_output.clone().unwrap_or_default()
                } else {
                    PlanOutput::default()
                };
                reports.push(engine.analyze_with_plan(statement, statement_plan)?);
            }

            for report in &reports {
                println!("{}", format_report(report, &opts));
            }
            Ok(exit_code(&reports))
        }
        Commands::Profile {
            captures,
            output_format,
            verbose,
            no_color
        } => {
            let content = read_input(&captures)?;
            let parsed: Vec<QueryCapture> =
                serde_json::from_str(&content).map_err(|e| capture_log_error(e.to_string()))?;
            let opts = output_options(output_format, no_color, verbose);

            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                pb.set_style(style);
            }
            pb.set_message(format!("Analyzing {} captured queries...", parsed.len()));
            pb.enable_steady_tick(Duration::from_millis(100));

            let profile = engine.profile(&parsed).await;
            pb.finish_and_clear();

            println!("{}", format_profile_report(&profile, &opts));

            let reports: Vec<Report> = profile.reports.clone();
            Ok(exit_code(&reports))
        }
    }
}

fn read_input(path: &Path) -> AppResult<String> {
    if path.to_str() == Some("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(&path.display().to_string(), e))
    }
}

/// Load captured EXPLAIN output.
///
/// A JSON array is tabular rows, a JSON object is a plan tree, anything
/// else is treated as EXPLAIN ANALYZE text.
fn read_plan(path: &Path) -> AppResult<PlanOutput> {
    let content =
        read_to_string(path).map_err(|e| file_read_error(&path.display().to_string(), e))?;
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Array(items)) => {
            let rows: Vec<ExplainRow> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();
            Ok(PlanOutput::from_rows(rows))
        }
        Ok(value @ serde_json::Value::Object(_)) => Ok(PlanOutput::from_tree(value)),
        _ => Ok(PlanOutput::from_text(content))
    }
}

fn output_options(format: Format, no_color: bool, verbose: bool) -> OutputOptions {
    OutputOptions {
        format: match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::Yaml => OutputFormat::Yaml
        },
        colored: !no_color,
        verbose
    }
}

/// Split a script on `;` outside string literals.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;

    for c in sql.chars() {
        match in_quote {
            Some(q) => {
                if c == q {
                    in_quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    in_quote = Some(c);
                    current.push(c);
                }
                ';' => {
                    if !current.trim().is_empty() {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                }
                _ => current.push(c)
            }
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

/// Exit code from the highest severity outcome across reports.
fn exit_code(reports: &[Report]) -> i32 {
    if reports.iter().any(Report::has_critical_finding) {
        2
    } else if reports.iter().any(|report| !report.passed()) {
        1
    } else {
        0
    }
}
