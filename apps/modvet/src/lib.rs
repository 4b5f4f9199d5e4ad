//! modvet core library.
//!
//! This crate validates a module tree: its `metadata.json` manifest, its
//! task definitions (`tasks/*.json`) and its plan definitions
//! (`plans/*.json`). Each validator resolves its targets, checks them and
//! records one event per target into a shared report, while a progress
//! display shows what is running.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `models`: Events, summaries and the manifest model.
//! - `report`: Thread-safe event collection and exit status.
//! - `targets`: Pattern expansion, ignore rules and target classification.
//! - `progress`: Shared live progress display (interactive and plain).
//! - `validator`: The validator contract, file validators and groups.
//! - `validators`: Concrete metadata, task and plan validators.
//! - `schema`: Cached download and compilation of remote JSON schemas.
//! - `orchestrator`: Serial and parallel execution of validators.
//! - `output`: Human/JSON printers.
//! - `error`: Run-aborting errors.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod report;
pub mod schema;
pub mod targets;
pub mod utils;
pub mod validator;
pub mod validators;
