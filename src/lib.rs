//! # IONify Core Library
//!
//! This crate is the core library for the `ionify` application. It turns the
//! whitespace-delimited logs written by the ion-gun calibration routine into
//! a validated, annotated PDF report, plus a contact sheet of the beam-map
//! images captured alongside. Organizing the project as a library keeps the
//! pipeline testable on its own and leaves `main.rs` as a thin CLI shell.
//!
//! ## Crate Structure
//!
//! - **`config`**: application settings loaded from an optional TOML file
//!   with built-in defaults. See [`config::Settings`].
//! - **`logging`**: `tracing` subscriber setup with environment filtering.
//! - **`error`**: the central [`error::IonifyError`] enum; one variant per
//!   failure class so callers can phrase each one for the user.
//! - **`measurement`**: the typed [`measurement::Measurement`] record, the
//!   per-log [`measurement::System`] container and the closed
//!   [`measurement::Parameter`] set validation can flag.
//! - **`signals`**: configuration-signal inference and the resolver mapping
//!   a signal triple to a [`signals::SystemType`] with its fixed row bound.
//! - **`parser`**: encoding auto-detection and the log line scanner.
//! - **`rules`**: versioned tolerance presets and fixed acceptance ranges.
//! - **`validation`**: the table-driven row validator and range helpers.
//! - **`report`**: the report assembler: dense row layout, findings
//!   collection and document production.
//! - **`document`**: minimal paginated PDF output (tables, watermarks,
//!   image grids); presentation plumbing only.
//! - **`contact_sheet`**: the thumbnail gallery document.
//! - **`assets`**: watermark and reference-document lookup by system type.
//! - **`run`**: folder-driven orchestration used by the CLI.
//! - **`update`** / **`version`**: background update notice and version
//!   resolution.

pub mod assets;
pub mod config;
pub mod contact_sheet;
pub mod document;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod parser;
pub mod report;
pub mod rules;
pub mod run;
pub mod signals;
pub mod update;
pub mod validation;
pub mod version;
