pub mod analysis;
pub mod arn;
pub mod dataset;
pub mod template;

pub use analysis::{AnalysisMigrator, MigrationResult};
pub use dataset::DatasetMigrator;
pub use template::{TemplateLifecycle, TemplateSnapshot};

use thiserror::Error;

use crate::quicksight::error::CatalogError;

/// Fehler der Migrationspfade. Katalogfehler reisen transparent durch;
/// AlreadyExists wird vorher in ein Ergebnis umgebogen und landet nie hier.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("dataset {0} has neither physical nor logical tables")]
    MalformedDataset(String),

    #[error("no resource id could be extracted from {0}")]
    UnparseableArn(String),

    #[error("required parameter {0} is missing")]
    MissingParameter(&'static str),
}

/// Ergebnis einer Operation gegen den Zielkatalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AlreadyExists,
    Failure(String),
}

impl Outcome {
    pub fn as_status(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::AlreadyExists => "ALREADY_EXISTS",
            Outcome::Failure(_) => "FAIL",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}
