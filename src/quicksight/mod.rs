pub mod catalog;
pub mod client;
pub mod error;
pub mod models;

pub use catalog::{AnalysisCatalog, Catalog, DatasetCatalog, TemplateCatalog, UserCatalog};
pub use client::QuickSightCatalog;
pub use error::CatalogError;
pub use models::{
    AnalysisDefinition, AnalysisListEntry, AnalysisSummary, DataSetIdentifierDeclaration,
    DataSetReference, DatasetDescriptor, TemplateDescriptor, INTERMEDIATE_TABLE_ALIAS,
};
