//! Cross-region migration and archival of QuickSight analyses, datasets and
//! templates. One action per invocation; repeated runs are idempotent.

pub mod handler;
pub mod migration;
pub mod quicksight;
pub mod storage;
pub mod utils;


pub use handler::{run_action, Action, ActionReport, ActionRequest, Handler};
pub use migration::{MigrateError, Outcome};
pub use quicksight::{CatalogError, QuickSightCatalog};
pub use storage::{ArchiveWriter, S3ArchiveStore};
pub use utils::{Config, RegionProfile};
