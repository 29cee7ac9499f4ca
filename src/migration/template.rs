use crate::migration::{arn, MigrateError, Outcome};
use crate::quicksight::catalog::Catalog;
use crate::quicksight::error::CatalogError;
use crate::quicksight::models::{
    AnalysisDefinition, AnalysisListEntry, AnalysisSummary, DataSetReference, DatasetDescriptor,
    TemplateDescriptor, INTERMEDIATE_TABLE_ALIAS,
};
use crate::utils::events::EventSink;

const DEFAULT_COMMENT: &str = "No comment provided";

/// Alles, was nach einer Template-Operation ins Archiv wandert
#[derive(Debug)]
pub struct TemplateSnapshot {
    pub template: TemplateDescriptor,
    pub definition: AnalysisDefinition,
    pub datasets: Vec<DatasetDescriptor>,
}

/// Flache Template-Operationen gegen einen einzelnen Regionskatalog.
/// Keine Rekursion; höchstens der Audit-Walk über die Kinder
/// zusammengesetzter Datasets.
pub struct TemplateLifecycle<'a> {
    catalog: &'a dyn Catalog,
    events: &'a EventSink,
}

impl<'a> TemplateLifecycle<'a> {
    pub fn new(catalog: &'a dyn Catalog, events: &'a EventSink) -> Self {
        Self { catalog, events }
    }

    /// Versioniertes Template aus dem aktuellen Stand einer Analyse anlegen.
    /// AlreadyExists ist ein eigenes Ergebnis, kein Fehler.
    pub async fn create_template(
        &self,
        analysis_id: &str,
        comment: Option<&str>,
    ) -> Result<(Outcome, Option<TemplateSnapshot>), MigrateError> {
        let analysis = self.catalog.describe_analysis(analysis_id).await?;
        let references = self.dataset_references(&analysis.data_set_arns).await?;
        let comment = comment.unwrap_or(DEFAULT_COMMENT);

        match self
            .catalog
            .create_template(&analysis, comment, &references)
            .await
        {
            Ok(()) => {}
            Err(CatalogError::AlreadyExists(_)) => {
                self.events
                    .warn(format!("template for analysis {analysis_id} already exists"));
                return Ok((Outcome::AlreadyExists, None));
            }
            Err(e) => return Err(e.into()),
        }

        self.events
            .info(format!("template created for analysis {analysis_id}"));
        let snapshot = self.snapshot(analysis_id, &analysis, false).await?;
        Ok((Outcome::Success, Some(snapshot)))
    }

    /// Neue Template-Version aus dem aktuellen Stand der Analyse
    pub async fn update_template(
        &self,
        analysis_id: &str,
        comment: Option<&str>,
    ) -> Result<(Outcome, Option<TemplateSnapshot>), MigrateError> {
        let analysis = self.catalog.describe_analysis(analysis_id).await?;
        let references = self.dataset_references(&analysis.data_set_arns).await?;
        let comment = comment.unwrap_or(DEFAULT_COMMENT);

        self.catalog
            .update_template(&analysis, comment, &references)
            .await?;
        self.events
            .info(format!("template updated for analysis {analysis_id}"));

        // Audit only: the snapshot also carries the physical children of
        // composed datasets so the archive shows the whole graph.
        let snapshot = self.snapshot(analysis_id, &analysis, true).await?;
        Ok((Outcome::Success, Some(snapshot)))
    }

    /// Analyse auf eine Template-Version zurücksetzen. Existiert die Analyse
    /// nicht (mehr), wird sie aus dem Template neu aufgebaut.
    pub async fn update_analysis(
        &self,
        analysis_id: &str,
        version: Option<i64>,
        user_arn: &str,
    ) -> Result<Outcome, MigrateError> {
        let analysis = self.catalog.describe_analysis(analysis_id).await?;
        let template = self.catalog.describe_template(analysis_id, version).await?;
        let references = self.dataset_references(&analysis.data_set_arns).await?;

        match self
            .catalog
            .update_analysis_from_template(&analysis, &template, &references)
            .await
        {
            Ok(()) => {
                self.events
                    .info(format!("analysis {analysis_id} updated from template"));
                Ok(Outcome::Success)
            }
            Err(CatalogError::NotFound(_)) => {
                self.events.info(format!(
                    "analysis {analysis_id} is absent, recreating it from the template"
                ));
                self.catalog
                    .create_analysis_from_template(&analysis, &template, &references)
                    .await?;
                if let Err(e) = self
                    .catalog
                    .grant_analysis_permissions(analysis_id, user_arn)
                    .await
                {
                    self.events
                        .warn(format!("permission grant failed for {analysis_id}: {e}"));
                }
                Ok(Outcome::Success)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Alle Analysen mit Status DELETED
    pub async fn list_deleted_analyses(&self) -> Result<Vec<AnalysisListEntry>, MigrateError> {
        let analyses = self.catalog.list_analyses().await?;
        Ok(analyses
            .into_iter()
            .filter(|analysis| analysis.status.as_deref() == Some("DELETED"))
            .collect())
    }

    /// DELETED → PRESENT
    pub async fn restore_analysis(&self, analysis_id: &str) -> Result<Outcome, MigrateError> {
        self.catalog.restore_analysis(analysis_id).await?;
        self.events
            .info(format!("analysis {analysis_id} restored"));
        Ok(Outcome::Success)
    }

    /// Platzhalter-Bindungen für jedes Dataset der Analyse; der Platzhalter
    /// ist der Anzeigename des Datasets.
    async fn dataset_references(
        &self,
        data_set_arns: &[String],
    ) -> Result<Vec<DataSetReference>, MigrateError> {
        let mut references = Vec::with_capacity(data_set_arns.len());
        for data_set_arn in data_set_arns {
            let dataset_id = arn::extract_id(data_set_arn);
            if dataset_id.is_empty() {
                return Err(MigrateError::UnparseableArn(data_set_arn.clone()));
            }
            let dataset = self.catalog.describe_dataset(&dataset_id).await?;
            references.push(DataSetReference {
                data_set_placeholder: dataset.name,
                data_set_arn: data_set_arn.clone(),
            });
        }
        Ok(references)
    }

    async fn snapshot(
        &self,
        analysis_id: &str,
        analysis: &AnalysisSummary,
        include_children: bool,
    ) -> Result<TemplateSnapshot, MigrateError> {
        let template = self.catalog.describe_template(analysis_id, None).await?;
        let definition = self
            .catalog
            .describe_analysis_definition(analysis_id)
            .await?;

        let mut datasets = Vec::new();
        for data_set_arn in &analysis.data_set_arns {
            let dataset_id = arn::extract_id(data_set_arn);
            if dataset_id.is_empty() {
                return Err(MigrateError::UnparseableArn(data_set_arn.clone()));
            }
            datasets.push(self.catalog.describe_dataset(&dataset_id).await?);
        }

        if include_children {
            let parents = datasets.clone();
            for dataset in parents.iter().filter(|d| d.is_composed()) {
                for table in dataset.logical_table_map.values() {
                    if table.alias == INTERMEDIATE_TABLE_ALIAS {
                        continue;
                    }
                    let Some(child_arn) = &table.source.data_set_arn else {
                        continue;
                    };
                    let child_id = arn::extract_id(child_arn);
                    if child_id.is_empty() {
                        self.events
                            .warn(format!("skipping unparseable child reference {child_arn}"));
                        continue;
                    }
                    datasets.push(self.catalog.describe_dataset(&child_id).await?);
                }
            }
        }

        Ok(TemplateSnapshot {
            template,
            definition,
            datasets,
        })
    }
}
