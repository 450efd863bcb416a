//! The analysis pipeline orchestrator.
//!
//! [`Engine::analyze`] drives a single statement through the full pipeline:
//!
//! ```text
//! raw SQL → sanitize → guard → shape → (driver EXPLAIN) → plan parse
//!         → reconcile → rules → root causes → scoring → index synthesis
//!         → Report
//! ```
//!
//! A guard rejection is terminal; everything else recovers. A driver error
//! or timeout downgrades the analysis to static-only and flags the report
//! `plan_unavailable` instead of failing.
//!
//! The engine is immutable after construction and safe to share across
//! threads; concurrent `analyze` calls do not interact. The driver call is
//! the only suspension point and runs under a timeout.

use std::{future::Future, time::Duration};

use indexmap::IndexMap;
use tokio::time::timeout;

use crate::{
    capture::QueryCapture,
    config::Config,
    error::{AppResult, plan_fetch_error},
    guard,
    metrics::Metrics,
    plan::{self, PlanOutput},
    reconcile,
    report::{AnalysisMode, Diagnostic, ProfileReport, Report, now_ms},
    rootcause::{detect_root_causes, identify_top_recommendation, suppress_by_root_cause},
    rules::{Finding, RuleRegistry},
    sanitize::sanitize,
    scoring::ScoringEngine,
    shape::parse_shape,
    synth
};

/// Abstraction over a database connection that can EXPLAIN a statement.
///
/// Both plan forms may be empty when the engine behind the connection does
/// not produce them; errors surface as-is and the engine downgrades to
/// static-only analysis.
pub trait Driver: Send + Sync {
    /// Name of the underlying driver, recorded on reports.
    fn name(&self) -> &str;

    /// Fetch EXPLAIN output for a statement the guard already cleared.
    fn explain(&self, sql: &str) -> impl Future<Output = AppResult<PlanOutput>> + Send;
}

/// Placeholder driver for static-only engines.
pub struct NoDriver;

impl Driver for NoDriver {
    fn name(&self) -> &str {
        "none"
    }

    async fn explain(&self, _sql: &str) -> AppResult<PlanOutput> {
        Err(plan_fetch_error("none", "no driver attached"))
    }
}

/// The analysis engine. Immutable after construction, re-entrant, and safe
/// for concurrent invocations.
pub struct Engine<D: Driver = NoDriver> {
    registry:             RuleRegistry,
    scoring:              ScoringEngine,
    driver:               Option<D>,
    driver_name:          Option<String>,
    driver_timeout:       Duration,
    n_plus_one_threshold: usize
}

impl Engine<NoDriver> {
    /// Static-only engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Static-only engine with explicit configuration.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        Self {
            registry:             RuleRegistry::with_config(
                &config.thresholds,
                &config.rules.disabled
            ),
            scoring:              ScoringEngine::new(),
            driver:               None,
            driver_name:          None,
            driver_timeout:       Duration::from_millis(config.profiler.driver_timeout_ms),
            n_plus_one_threshold: config.profiler.n_plus_one_threshold
        }
    }
}

impl Default for Engine<NoDriver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> Engine<D> {
    /// Engine with a live driver for plan retrieval.
    #[must_use]
    pub fn with_driver(driver: D) -> Self {
        Self::with_driver_and_config(driver, &Config::default())
    }

    #[must_use]
    pub fn with_driver_and_config(driver: D, config: &Config) -> Self {
        let driver_name = Some(driver.name().to_string());
        Self {
            registry: RuleRegistry::with_config(&config.thresholds, &config.rules.disabled),
            scoring: ScoringEngine::new(),
            driver: Some(driver),
            driver_name,
            driver_timeout: Duration::from_millis(config.profiler.driver_timeout_ms),
            n_plus_one_threshold: config.profiler.n_plus_one_threshold
        }
    }

    /// Replace the rule registry (test injection).
    #[must_use]
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Analyze one statement, fetching the plan from the driver when one is
    /// attached.
    ///
    /// # Errors
    ///
    /// Fails with `unsafe_query` when the guard rejects the statement. A
    /// driver failure is not an error: the report comes back flagged
    /// `plan_unavailable`.
    pub async fn analyze(&self, sql: &str) -> AppResult<Report> {
        self.analyze_inner(sql, AnalysisMode::Sql, None).await
    }

    /// [`analyze`](Self::analyze) with an explicit mode tag on the report.
    pub async fn analyze_with_mode(&self, sql: &str, mode: AnalysisMode) -> AppResult<Report> {
        self.analyze_inner(sql, mode, None).await
    }

    /// Run the full pipeline on already-captured EXPLAIN output, without
    /// touching any driver. This is what CI and the CLI use.
    ///
    /// # Errors
    ///
    /// Fails with `unsafe_query` when the guard rejects the statement.
    pub fn analyze_with_plan(&self, sql: &str, plan_output: PlanOutput) -> AppResult<Report> {
        let sanitized = sanitize(sql);
        guard::validate(&sanitized)?;
        Ok(self.run_pipeline(sql, sanitized, Some(plan_output), AnalysisMode::Sql, None))
    }

    /// Analyze a batch of captured queries.
    ///
    /// Captures are grouped by normalized SQL; each distinct query is
    /// analyzed at most once, represented by its slowest capture. Captures
    /// the guard rejects are counted as skipped, never analyzed. An N+1
    /// pattern is flagged when any group reaches the configured repetition
    /// threshold.
    pub async fn profile(&self, captures: &[QueryCapture]) -> ProfileReport {
        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, capture) in captures.iter().enumerate() {
            groups
                .entry(capture.to_normalized_sql())
                .or_default()
                .push(index);
        }

        let n_plus_one_detected = groups
            .values()
            .any(|members| members.len() >= self.n_plus_one_threshold);

        let mut group_reports: IndexMap<String, Option<Report>> = IndexMap::new();
        let mut analyzed = 0usize;
        let mut skipped = 0usize;

        for (normalized, members) in &groups {
            let representative = members
                .iter()
                .copied()
                .max_by(|a, b| {
                    captures[*a]
                        .elapsed_ms()
                        .total_cmp(&captures[*b].elapsed_ms())
                })
                .map(|index| &captures[index]);
            let Some(capture) = representative else {
                continue;
            };
            let interpolated = capture.to_interpolated_sql();
            match self
                .analyze_inner(
                    &interpolated,
                    AnalysisMode::Profiler,
                    Some(capture.elapsed_ms())
                )
                .await
            {
                Ok(report) => {
                    analyzed += members.len();
                    group_reports.insert(normalized.clone(), Some(report));
                }
                Err(_) => {
                    skipped += members.len();
                    group_reports.insert(normalized.clone(), None);
                }
            }
        }

        let reports: Vec<Report> = captures
            .iter()
            .filter_map(|capture| {
                group_reports
                    .get(&capture.to_normalized_sql())
                    .and_then(|report| report.clone())
            })
            .collect();

        let slowest = captures
            .iter()
            .max_by(|a, b| a.elapsed_ms().total_cmp(&b.elapsed_ms()))
            .and_then(|capture| {
                group_reports
                    .get(&capture.to_normalized_sql())
                    .and_then(|report| report.clone())
            });
        let worst = group_reports
            .values()
            .flatten()
            .min_by(|a, b| a.composite_score().total_cmp(&b.composite_score()))
            .cloned();

        let query_counts: IndexMap<String, usize> = groups
            .iter()
            .map(|(normalized, members)| (normalized.clone(), members.len()))
            .collect();
        let duplicate_queries: IndexMap<String, usize> = query_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(normalized, count)| (normalized.clone(), *count))
            .collect();

        ProfileReport {
            mode: AnalysisMode::Profiler,
            total_captures: captures.len(),
            analyzed,
            skipped,
            total_time_ms: captures.iter().map(QueryCapture::elapsed_ms).sum(),
            slowest,
            worst,
            duplicate_queries,
            n_plus_one_detected,
            reports,
            captures: captures.to_vec(),
            query_counts
        }
    }

    async fn analyze_inner(
        &self,
        sql: &str,
        mode: AnalysisMode,
        elapsed_ms: Option<f64>
    ) -> AppResult<Report> {
        let sanitized = sanitize(sql);
        guard::validate(&sanitized)?;

        let plan_output = match &self.driver {
            Some(driver) => {
                match timeout(self.driver_timeout, driver.explain(&sanitized)).await {
                    Ok(Ok(output)) => Some(output),
                    Ok(Err(_)) | Err(_) => None
                }
            }
            None => None
        };

        Ok(self.run_pipeline(sql, sanitized, plan_output, mode, elapsed_ms))
    }

    /// The synchronous pipeline core shared by every entry point.
    fn run_pipeline(
        &self,
        original: &str,
        sanitized: String,
        plan_output: Option<PlanOutput>,
        mode: AnalysisMode,
        elapsed_ms: Option<f64>
    ) -> Report {
        let shape = parse_shape(&sanitized);

        let (mut metrics, mut diagnostics) = match &plan_output {
            Some(output) if !output.is_empty() => plan::parse(output),
            _ => (Metrics::default(), Vec::<Diagnostic>::new())
        };

        if metrics.tables_accessed.is_empty() {
            metrics.tables_accessed = shape.tables.clone();
        }
        metrics.is_intentional_scan = shape.is_intentional_full_scan;
        if metrics.execution_time_ms.is_none() {
            metrics.execution_time_ms = elapsed_ms;
        }

        diagnostics.extend(reconcile::validate_consistency(&mut metrics));

        let mut findings = self.registry.evaluate(&metrics);
        findings.extend(
            shape
                .anti_patterns
                .iter()
                .map(|pattern| Finding::from_anti_pattern(*pattern))
        );

        let root_causes = detect_root_causes(&findings, &metrics);
        let findings = suppress_by_root_cause(findings, &root_causes);
        let index_proposals = synth::synthesize(&shape, &metrics);
        let top_recommendation =
            identify_top_recommendation(&root_causes, &findings, &index_proposals);
        let scores = self.scoring.score(&metrics, &findings);

        let plan_unavailable = plan_output.as_ref().is_none_or(PlanOutput::is_empty);

        Report {
            sql: original.to_string(),
            sanitized_sql: sanitized,
            mode,
            driver: self.driver_name.clone(),
            plan_unavailable,
            plan: plan_output.as_ref().and_then(PlanOutput::to_value),
            metrics,
            scores,
            findings,
            root_causes,
            index_proposals,
            top_recommendation,
            diagnostics,
            analyzed_at_ms: now_ms()
        }
    }
}
