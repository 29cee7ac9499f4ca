use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Archivdatensatz: wer hat wann welche Definition veröffentlicht.
/// Das einzige persistente Artefakt des Migrators.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveRecord {
    pub author: String,
    pub source_region: String,
    pub template_id: String,
    pub name: String,
    pub date: String,
    pub analysis_definition: Value,
    pub dataset_definitions: Vec<Value>,
    /// 0 bedeutet: Migrationslauf statt Template-Version
    pub version: i64,
    pub comment: String,
}

impl ArchiveRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        author: String,
        source_region: String,
        template_id: String,
        name: String,
        analysis_definition: Value,
        dataset_definitions: Vec<Value>,
        version: i64,
        comment: String,
    ) -> Self {
        Self {
            author,
            source_region,
            template_id,
            name,
            date: Utc::now().format("%d-%m-%Y %H:%M:%S").to_string(),
            analysis_definition,
            dataset_definitions,
            version,
            comment,
        }
    }

    fn object_name(&self) -> String {
        let version = if self.version != 0 {
            self.version.to_string()
        } else {
            "migration".to_string()
        };
        format!("{}_{version}.json", self.name)
    }

    /// Ablagepfad im Bucket: Stakeholder-Ordner, darunter der Asset-Name
    /// ohne Template-Suffix
    pub fn object_key(&self, stakeholder: Option<&str>) -> String {
        let folder = stakeholder
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| "DEFAULT".to_string());
        let base = self.name.replace("_template", "").to_lowercase();
        format!(
            "quicksight_templates/{folder}/{base}/{}",
            self.object_name()
        )
    }
}
