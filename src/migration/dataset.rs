use futures::future::BoxFuture;

use crate::migration::{arn, MigrateError};
use crate::quicksight::catalog::Catalog;
use crate::quicksight::error::CatalogError;
use crate::quicksight::models::INTERMEDIATE_TABLE_ALIAS;
use crate::utils::config::RegionProfile;
use crate::utils::events::EventSink;

/// Stellt sicher, dass ein Dataset samt aller physischen Kinder in der
/// Zielregion existiert, und liefert die dort gültige ARN zurück.
pub struct DatasetMigrator<'a> {
    source: &'a dyn Catalog,
    target: &'a dyn Catalog,
    source_profile: &'a RegionProfile,
    target_profile: &'a RegionProfile,
    grantee_arn: &'a str,
    events: &'a EventSink,
}

impl<'a> DatasetMigrator<'a> {
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

    /// Tiefensuche über den Abhängigkeitsgraphen: Kinder eines
    /// zusammengesetzten Datasets werden vor dem Join-Elternteil angelegt.
    /// AlreadyExists ist auf jeder Stufe kein Fehler; der zweite Lauf liefert
    /// dieselben Namen wie der erste.
    pub fn migrate_dataset(&self, dataset_id: &str) -> BoxFuture<'_, Result<String, MigrateError>> {
        let dataset_id = dataset_id.to_string();
        Box::pin(async move {
            let mut descriptor = self.source.describe_dataset(&dataset_id).await?;

            if descriptor.physical_table_map.is_empty()
                && descriptor.logical_table_map.is_empty()
            {
                return Err(MigrateError::MalformedDataset(dataset_id));
            }

            if descriptor.is_composed() {
                // The join node ("Intermediate Table") is synthetic and never
                // migrates; every other entry referencing a dataset does.
                let children: Vec<(String, String)> = descriptor
                    .logical_table_map
                    .iter()
                    .filter(|(_, table)| table.alias != INTERMEDIATE_TABLE_ALIAS)
                    .filter_map(|(key, table)| {
                        table
                            .source
                            .data_set_arn
                            .clone()
                            .map(|child_arn| (key.clone(), child_arn))
                    })
                    .collect();

                for (key, child_arn) in children {
                    let child_id = arn::extract_id(&child_arn);
                    if child_id.is_empty() {
                        return Err(MigrateError::UnparseableArn(child_arn));
                    }

                    let migrated_arn = self.migrate_dataset(&child_id).await?;
                    self.events.info(format!(
                        "dataset {child_id} available in {} as {migrated_arn}",
                        self.target_profile.region
                    ));

                    if let Some(table) = descriptor.logical_table_map.get_mut(&key) {
                        table.source.data_set_arn = Some(arn::rewrite_region(
                            &child_arn,
                            &self.source_profile.region,
                            &self.target_profile.region,
                        ));
                    }
                }
            } else {
                arn::retarget_data_source(&mut descriptor, &self.target_profile.data_source_arn);
            }

            match self.target.create_dataset(&descriptor, self.grantee_arn).await {
                Ok(created_arn) => {
                    self.events.info(format!(
                        "dataset {} created in {}",
                        descriptor.data_set_id, self.target_profile.region
                    ));
                    Ok(created_arn)
                }
                Err(CatalogError::AlreadyExists(_)) => {
                    self.events.warn(format!(
                        "dataset {} already exists in {}",
                        descriptor.data_set_id, self.target_profile.region
                    ));
                    Ok(arn::rewrite_region(
                        &descriptor.arn,
                        &self.source_profile.region,
                        &self.target_profile.region,
                    ))
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}
