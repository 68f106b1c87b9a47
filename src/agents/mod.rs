//! Agent System
//!
//! External LLM collaborators sit behind this module. The core pipeline
//! never depends on their availability: an analyzer call is an explicit,
//! fallible operation against an already-persisted annotation record.
//!
//! - **File Analyzer**: given one file's extracted metadata and the user's
//!   description, asks the model to assign a role to each field and returns
//!   either the structured result or the raw reply when the model strays
//!   from the requested JSON shape.

pub mod file_analyzer;

pub use file_analyzer::{AnalysisOutcome, FieldRole, FileAnalysis, FileAnalyzer};
