use crate::migration::dataset::DatasetMigrator;
use crate::migration::{arn, MigrateError, Outcome};
use crate::quicksight::catalog::Catalog;
use crate::quicksight::error::CatalogError;
use crate::quicksight::models::AnalysisDefinition;
use crate::utils::config::RegionProfile;
use crate::utils::events::EventSink;

/// Ergebnis einer Analyse-Migration: das Outcome plus die umgeschriebene
/// Definition, die anschließend archiviert wird.
#[derive(Debug)]
pub struct MigrationResult {
    pub outcome: Outcome,
    pub definition: AnalysisDefinition,
}

/// Orchestriert die Migration einer Analyse in die Zielregion
pub struct AnalysisMigrator<'a> {
    source: &'a dyn Catalog,
    target: &'a dyn Catalog,
    source_profile: &'a RegionProfile,
    target_profile: &'a RegionProfile,
    grantee_arn: &'a str,
    events: &'a EventSink,
}

impl<'a> AnalysisMigrator<'a> {
    pub fn new(
        source: &'a dyn Catalog,
        target: &'a dyn Catalog,
        source_profile: &'a RegionProfile,
        target_profile: &'a RegionProfile,
        grantee_arn: &'a str,
        events: &'a EventSink,
    ) -> Self {
        Self {
            source,
            target,
            source_profile,
            target_profile,
            grantee_arn,
            events,
        }
    }

    /// Vollständige Definition holen, jedes referenzierte Dataset migrieren,
    /// Referenzen in Deklarationsreihenfolge ersetzen, Theme umhängen und die
    /// Definition im Ziel anlegen. Berechtigungen sind best-effort.
    pub async fn migrate_analysis(
        &self,
        analysis_id: &str,
    ) -> Result<MigrationResult, MigrateError> {
        let mut definition = self
            .source
            .describe_analysis_definition(analysis_id)
            .await?;
        self.events.info(format!(
            "migrating analysis {analysis_id} ({}) from {} to {}",
            definition.name, self.source_profile.region, self.target_profile.region
        ));

        let datasets = DatasetMigrator::new(
            self.source,
            self.target,
            self.source_profile,
            self.target_profile,
            self.grantee_arn,
            self.events,
        );

        // In place and in order; the declaration order is significant for
        // the definition's internal identifier references.
        for declaration in &mut definition.definition.data_set_identifier_declarations {
            let dataset_id = arn::extract_id(&declaration.data_set_arn);
            if dataset_id.is_empty() {
                return Err(MigrateError::UnparseableArn(
                    declaration.data_set_arn.clone(),
                ));
            }
            declaration.data_set_arn = datasets.migrate_dataset(&dataset_id).await?;
        }

        // The target theme is a pre-configured resource, not a region rewrite.
        if definition.theme_arn.is_some() {
            definition.theme_arn = Some(self.target_profile.theme_arn.clone());
        }

        let outcome = match self.target.create_analysis(&definition).await {
            Ok(()) => {
                self.events.info(format!(
                    "analysis {analysis_id} created in {}",
                    self.target_profile.region
                ));
                Outcome::Success
            }
            Err(CatalogError::AlreadyExists(_)) => {
                self.events.warn(format!(
                    "analysis {analysis_id} already exists in {}",
                    self.target_profile.region
                ));
                Outcome::AlreadyExists
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self
            .target
            .grant_analysis_permissions(analysis_id, self.grantee_arn)
            .await
        {
            self.events
                .warn(format!("permission grant failed for {analysis_id}: {e}"));
        }

        Ok(MigrationResult {
            outcome,
            definition,
        })
    }
}
