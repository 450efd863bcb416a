//! # Query Sentinel
//!
//! Static-plus-runtime SQL performance diagnostics.
//!
//! Given a SQL statement, optionally with captured or live EXPLAIN output,
//! the engine produces a structured report: access pattern, algorithmic
//! complexity, diagnostic findings, root causes, a composite 0-100 score
//! with letter grade, and candidate indexes.
//!
//! # Architecture
//!
//! ```text
//! raw SQL ──▶ sanitize ──▶ guard ──▶ shape ──▶ plan parse ──▶ reconcile
//!                                                                │
//!         Report ◀── synth ◀── scoring ◀── root causes ◀── rules ┘
//! ```
//!
//! - [`sanitize`] normalizes the statement, preserving optimizer hints
//! - [`guard`] refuses anything that is not a read-only query
//! - [`shape`] extracts structure: tables, clauses, anti-patterns,
//!   intentional-scan detection
//! - [`plan`] parses tabular, JSON-tree, and EXPLAIN ANALYZE text plans
//! - [`reconcile`] repairs contradictions between observed and inferred
//!   metrics
//! - [`rules`] runs the diagnostic rule battery
//! - [`rootcause`] names the dominant cause and suppresses symptom findings
//! - [`scoring`] computes the per-dimension and composite scores
//! - [`synth`] proposes composite indexes
//! - [`engine`] orchestrates the pipeline and the batch profiler
//!
//! # Quick Start
//!
//! ```
//! use query_sentinel::{
//!     engine::Engine,
//!     plan::{ExplainRow, PlanOutput}
//! };
//!
//! let engine = Engine::new();
//! let plan = PlanOutput::from_rows(vec![
//!     ExplainRow::new("ALL").with_table("users").with_rows(50000.0),
//! ]);
//!
//! let report = engine
//!     .analyze_with_plan("SELECT * FROM users WHERE email = 'a@b.c'", plan)
//!     .unwrap();
//! assert!(report.metrics.has_table_scan);
//! assert!(!report.passed());
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod output;
pub mod plan;
pub mod profiler;
pub mod reconcile;
pub mod report;
pub mod rootcause;
pub mod rules;
pub mod sanitize;
pub mod scoring;
pub mod shape;
pub mod synth;
