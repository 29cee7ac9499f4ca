use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::migration::{
    arn, AnalysisMigrator, MigrateError, Outcome, TemplateLifecycle, TemplateSnapshot,
};
use crate::quicksight::catalog::Catalog;
use crate::quicksight::models::AnalysisListEntry;
use crate::quicksight::QuickSightCatalog;
use crate::storage::{ArchiveRecord, ArchiveWriter, S3ArchiveStore};
use crate::utils::config::{Config, RegionProfile};
use crate::utils::events::{Event, EventSink};
use crate::utils::metrics::Metrics;

const DEFAULT_COMMENT: &str = "No comment provided";

/// Die eine Aktion, die ein Aufruf ausführt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Migration,
    TemplateCreation,
    TemplateUpdate,
    AnalysisUpdate,
    ListDeletedAnalysis,
    RestoreAnalysis,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Migration => "MIGRATION",
            Action::TemplateCreation => "TEMPLATE_CREATION",
            Action::TemplateUpdate => "TEMPLATE_UPDATE",
            Action::AnalysisUpdate => "ANALYSIS_UPDATE",
            Action::ListDeletedAnalysis => "LIST_DELETED_ANALYSIS",
            Action::RestoreAnalysis => "RESTORE_ANALYSIS",
        }
    }
}

/// Eingabe eines Aufrufs
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub email: String,
    pub action: Action,
    pub source_region: String,
    #[serde(default)]
    pub target_region: Option<String>,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub stakeholder: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Strukturierte Antwort eines Aufrufs; die gesammelten Events ersetzen das
/// frühere Auslesen einer Logdatei.
#[derive(Debug, Serialize)]
pub struct ActionReport {
    pub invocation_id: String,
    pub date: String,
    pub action: Action,
    pub user: String,
    pub source_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_region: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_analyses: Option<Vec<AnalysisListEntry>>,
    pub events: Vec<Event>,
}

/// Bindet pro Aufruf genau einen Quell- und einen Zielkatalog zusammen und
/// fährt die gewählte Orchestrierung. Kein Zustand überlebt den Aufruf.
pub struct Handler {
    source_profile: RegionProfile,
    target_profile: RegionProfile,
    source: Arc<dyn Catalog>,
    target: Arc<dyn Catalog>,
    archive: Arc<dyn ArchiveWriter>,
    metrics: Arc<Metrics>,
}

impl Handler {
    pub fn new(
        source_profile: RegionProfile,
        target_profile: RegionProfile,
        source: Arc<dyn Catalog>,
        target: Arc<dyn Catalog>,
        archive: Arc<dyn ArchiveWriter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            source_profile,
            target_profile,
            source,
            target,
            archive,
            metrics,
        }
    }

    /// Führe die Aktion aus und liefere immer einen Report; Fehler aus der
    /// Orchestrierung werden an dieser Grenze in ein FAIL-Ergebnis gefangen.
    pub async fn invoke(&self, request: &ActionRequest) -> ActionReport {
        let start = Instant::now();
        let events = EventSink::new();
        let mut deleted_analyses = None;

        let outcome = match self.dispatch(request, &events, &mut deleted_analyses).await {
            Ok(outcome) => outcome,
            Err(e) => {
                events.error(format!("{} failed: {e}", request.action.as_str()));
                Outcome::Failure(e.to_string())
            }
        };

        self.metrics
            .actions_total
            .with_label_values(&[request.action.as_str(), outcome.as_status()])
            .inc();
        self.metrics
            .action_duration
            .with_label_values(&[request.action.as_str()])
            .observe(start.elapsed().as_secs_f64());

        ActionReport {
            invocation_id: Uuid::new_v4().to_string(),
            date: Utc::now().format("%d-%m-%Y %H:%M:%S").to_string(),
            action: request.action,
            user: request.email.clone(),
            source_region: self.source_profile.region.clone(),
            target_region: match request.action {
                Action::Migration => Some(self.target_profile.region.clone()),
                _ => None,
            },
            status: outcome.as_status().to_string(),
            analysis_id: request.analysis_id.clone(),
            comment: request
                .comment
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
            deleted_analyses,
            events: events.drain(),
        }
    }

    async fn dispatch(
        &self,
        request: &ActionRequest,
        events: &EventSink,
        deleted_analyses: &mut Option<Vec<AnalysisListEntry>>,
    ) -> Result<Outcome, MigrateError> {
        // Fatal before any mutation: the acting user must resolve to an ARN.
        let user_arn = match self.source.lookup_user_arn(&request.email).await {
            Ok(user_arn) => user_arn,
            Err(e) => {
                self.metrics.user_lookup_failures.inc();
                events.error(format!("user lookup for {} failed: {e}", request.email));
                return Err(e.into());
            }
        };

        match request.action {
            Action::Migration => {
                let analysis_id = required(&request.analysis_id)?;
                let migrator = AnalysisMigrator::new(
                    self.source.as_ref(),
                    self.target.as_ref(),
                    &self.source_profile,
                    &self.target_profile,
                    &user_arn,
                    events,
                );
                let result = migrator.migrate_analysis(analysis_id).await?;

                let declarations = &result.definition.definition.data_set_identifier_declarations;
                self.metrics
                    .datasets_migrated
                    .inc_by(declarations.len() as f64);

                // Audit snapshot of the migrated graph, read back from the
                // target region.
                let mut dataset_definitions = Vec::with_capacity(declarations.len());
                for declaration in declarations {
                    let dataset_id = arn::extract_id(&declaration.data_set_arn);
                    if dataset_id.is_empty() {
                        continue;
                    }
                    match self.target.describe_dataset(&dataset_id).await {
                        Ok(dataset) => match serde_json::to_value(&dataset) {
                            Ok(value) => dataset_definitions.push(value),
                            Err(e) => events
                                .warn(format!("snapshot serialization failed for {dataset_id}: {e}")),
                        },
                        Err(e) => events
                            .warn(format!("snapshot describe failed for {dataset_id}: {e}")),
                    }
                }

                let record = ArchiveRecord::new(
                    request.email.clone(),
                    self.source_profile.region.clone(),
                    analysis_id.to_string(),
                    result.definition.name.clone(),
                    serde_json::to_value(&result.definition).unwrap_or(Value::Null),
                    dataset_definitions,
                    0,
                    request
                        .comment
                        .clone()
                        .unwrap_or_else(|| "Migration".to_string()),
                );
                self.archive_best_effort(&record, request.stakeholder.as_deref(), events)
                    .await;

                Ok(result.outcome)
            }
            Action::TemplateCreation => {
                let analysis_id = required(&request.analysis_id)?;
                let lifecycle = TemplateLifecycle::new(self.source.as_ref(), events);
                let (outcome, snapshot) = lifecycle
                    .create_template(analysis_id, request.comment.as_deref())
                    .await?;
                if let Some(snapshot) = snapshot {
                    self.archive_snapshot(request, &snapshot, events).await;
                }
                Ok(outcome)
            }
            Action::TemplateUpdate => {
                let analysis_id = required(&request.analysis_id)?;
                let lifecycle = TemplateLifecycle::new(self.source.as_ref(), events);
                let (outcome, snapshot) = lifecycle
                    .update_template(analysis_id, request.comment.as_deref())
                    .await?;
                if let Some(snapshot) = snapshot {
                    self.archive_snapshot(request, &snapshot, events).await;
                }
                Ok(outcome)
            }
            Action::AnalysisUpdate => {
                let analysis_id = required(&request.analysis_id)?;
                let lifecycle = TemplateLifecycle::new(self.source.as_ref(), events);
                lifecycle
                    .update_analysis(analysis_id, request.version, &user_arn)
                    .await
            }
            Action::ListDeletedAnalysis => {
                let lifecycle = TemplateLifecycle::new(self.source.as_ref(), events);
                *deleted_analyses = Some(lifecycle.list_deleted_analyses().await?);
                Ok(Outcome::Success)
            }
            Action::RestoreAnalysis => {
                let analysis_id = required(&request.analysis_id)?;
                let lifecycle = TemplateLifecycle::new(self.source.as_ref(), events);
                lifecycle.restore_analysis(analysis_id).await
            }
        }
    }

    async fn archive_snapshot(
        &self,
        request: &ActionRequest,
        snapshot: &TemplateSnapshot,
        events: &EventSink,
    ) {
        let record = ArchiveRecord::new(
            request.email.clone(),
            self.source_profile.region.clone(),
            snapshot.template.template_id.clone(),
            snapshot.template.name.clone(),
            serde_json::to_value(&snapshot.definition).unwrap_or(Value::Null),
            snapshot
                .datasets
                .iter()
                .map(|dataset| serde_json::to_value(dataset).unwrap_or(Value::Null))
                .collect(),
            snapshot.template.version.unwrap_or(0),
            request
                .comment
                .clone()
                .or_else(|| snapshot.template.description.clone())
                .unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
        );
        self.archive_best_effort(&record, request.stakeholder.as_deref(), events)
            .await;
    }

    async fn archive_best_effort(
        &self,
        record: &ArchiveRecord,
        stakeholder: Option<&str>,
        events: &EventSink,
    ) {
        match self.archive.put_record(record, stakeholder).await {
            Ok(location) => events.info(format!("archive record written to {location}")),
            Err(e) => {
                self.metrics.archive_failures.inc();
                events.warn(format!("archive write failed: {e}"));
            }
        }
    }
}

fn required<'a>(value: &'a Option<String>) -> Result<&'a str, MigrateError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(MigrateError::MissingParameter("analysis_id"))
}

/// Baue die Kataloge für das angefragte Regionspaar und führe die Aktion
/// aus. Die Library-Entsprechung des früheren Lambda-Handlers.
pub async fn run_action(config: &Config, request: ActionRequest) -> anyhow::Result<ActionReport> {
    let source_profile = config
        .profile_for(&request.source_region)
        .ok_or_else(|| anyhow::anyhow!("unknown source region: {}", request.source_region))?
        .clone();
    let target_region = request
        .target_region
        .clone()
        .unwrap_or_else(|| request.source_region.clone());
    let target_profile = config
        .profile_for(&target_region)
        .ok_or_else(|| anyhow::anyhow!("unknown target region: {target_region}"))?
        .clone();

    let call_timeout = Duration::from_secs(config.call_timeout_secs);
    let source = Arc::new(
        QuickSightCatalog::new(
            config.account_id.clone(),
            source_profile.clone(),
            call_timeout,
        )
        .await?,
    ) as Arc<dyn Catalog>;
    let target = Arc::new(
        QuickSightCatalog::new(
            config.account_id.clone(),
            target_profile.clone(),
            call_timeout,
        )
        .await?,
    ) as Arc<dyn Catalog>;
    let archive =
        Arc::new(S3ArchiveStore::new(config.archive_bucket.clone()).await?) as Arc<dyn ArchiveWriter>;

    let handler = Handler::new(
        source_profile,
        target_profile,
        source,
        target,
        archive,
        Arc::new(Metrics::new()),
    );
    Ok(handler.invoke(&request).await)
}
