use async_trait::async_trait;

use crate::quicksight::error::CatalogError;
use crate::quicksight::models::{
    AnalysisDefinition, AnalysisListEntry, AnalysisSummary, DataSetReference, DatasetDescriptor,
    TemplateDescriptor,
};

/// Capability-Oberfläche je Ressourcenart. Eine Instanz ist an genau eine
/// Region gebunden; die Migration arbeitet mit zwei Instanzen (Quelle, Ziel).

#[async_trait]
pub trait AnalysisCatalog: Send + Sync {
    async fn describe_analysis(&self, analysis_id: &str)
        -> Result<AnalysisSummary, CatalogError>;

    async fn describe_analysis_definition(
        &self,
        analysis_id: &str,
    ) -> Result<AnalysisDefinition, CatalogError>;

    /// Lege eine Analyse aus ihrer vollständigen Definition an
    async fn create_analysis(&self, definition: &AnalysisDefinition) -> Result<(), CatalogError>;

    async fn create_analysis_from_template(
        &self,
        analysis: &AnalysisSummary,
        template: &TemplateDescriptor,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError>;

    async fn update_analysis_from_template(
        &self,
        analysis: &AnalysisSummary,
        template: &TemplateDescriptor,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError>;

    async fn list_analyses(&self) -> Result<Vec<AnalysisListEntry>, CatalogError>;

    async fn restore_analysis(&self, analysis_id: &str) -> Result<(), CatalogError>;

    async fn grant_analysis_permissions(
        &self,
        analysis_id: &str,
        user_arn: &str,
    ) -> Result<(), CatalogError>;
}

#[async_trait]
pub trait DatasetCatalog: Send + Sync {
    async fn describe_dataset(&self, dataset_id: &str)
        -> Result<DatasetDescriptor, CatalogError>;

    /// Lege das Dataset an und gib die ARN der neuen Ressource zurück.
    /// Der Grantee erhält den festen Dataset-Berechtigungssatz.
    async fn create_dataset(
        &self,
        descriptor: &DatasetDescriptor,
        grantee_arn: &str,
    ) -> Result<String, CatalogError>;
}

#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    async fn create_template(
        &self,
        analysis: &AnalysisSummary,
        comment: &str,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError>;

    async fn update_template(
        &self,
        analysis: &AnalysisSummary,
        comment: &str,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError>;

    async fn describe_template(
        &self,
        template_id: &str,
        version: Option<i64>,
    ) -> Result<TemplateDescriptor, CatalogError>;
}

#[async_trait]
pub trait UserCatalog: Send + Sync {
    /// NotFound ist hier fatal: ohne User-ARN startet keine Orchestrierung
    async fn lookup_user_arn(&self, email: &str) -> Result<String, CatalogError>;
}

pub trait Catalog: AnalysisCatalog + DatasetCatalog + TemplateCatalog + UserCatalog {}

impl<T: AnalysisCatalog + DatasetCatalog + TemplateCatalog + UserCatalog> Catalog for T {}
