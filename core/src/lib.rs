//! triage-core — the classification, enrichment, and reconciliation
//! pipeline behind the support-case report generator.
//!
//! PIPELINE (fixed order, one pass per run):
//!   1. Reference classification  (classify)
//!   2. Age & recency derivation  (age)
//!   3. Per-type reconciliation   (reconcile)
//!   4. Linkage counts & rollups  (linkage, rollup)
//!
//! The entry point is `pipeline::run_report`. Status tables are explicit
//! parameters; the pipeline holds no ambient session state and never
//! mutates its inputs.

pub mod age;
pub mod classify;
pub mod config;
pub mod error;
pub mod linkage;
pub mod notice;
pub mod pipeline;
pub mod reconcile;
pub mod rollup;
pub mod table;
pub mod types;
