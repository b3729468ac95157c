//! Alchemist: header reconciliation, validation and rules for client, worker
//! and task tables.
//!
//! Uploads arrive with whatever column names their authors chose. Alchemist
//! decides which entity a table holds, maps its headers onto canonical field
//! names, validates the result and applies user rules before export.
//!
//! # Core Principles
//!
//! - **Deterministic first**: exact keywords, synonyms and string similarity
//!   decide on their own; an advisor can only improve a mapping
//! - **Non-destructive**: every change produces a new [`DataSet`] and the
//!   loaded data is kept for reset
//! - **Reports, not failures**: bad data shows up in a [`ValidationReport`],
//!   never as a panic
//!
//! # Example
//!
//! ```no_run
//! use alchemist::{Alchemist, Session};
//!
//! let alchemist = Alchemist::new();
//! let mut session = Session::new();
//! alchemist.ingest_file(&mut session, "workers.csv").unwrap();
//!
//! let report = session.validate();
//! println!("Errors: {}", report.error_count());
//! ```

pub mod advisor;
pub mod error;
pub mod export;
pub mod inference;
pub mod input;
pub mod rules;
pub mod schema;
pub mod session;
pub mod transform;
pub mod validation;

mod alchemist;
mod dataset;

pub use crate::alchemist::{Alchemist, AlchemistConfig, IngestOutcome};
pub use advisor::{AdvisorConfig, HeaderAdvisor, MockAdvisor, OpenAIAdvisor};
pub use dataset::DataSet;
pub use error::{AlchemistError, Result};
pub use inference::{HeaderMapping, MappingResult};
pub use input::{Parser, RawTable, SourceMetadata};
pub use rules::{Rule, RulesConfig};
pub use schema::{EntityType, Row};
pub use session::{PendingMapping, Session};
pub use validation::{ValidationError, ValidationReport};
