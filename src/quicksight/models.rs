use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Alias des synthetischen Join-Knotens in einem zusammengesetzten Dataset.
/// Kein echtes Dataset, wird bei der Migration übersprungen.
pub const INTERMEDIATE_TABLE_ALIAS: &str = "Intermediate Table";

/// Feste Berechtigungen, die jedem erzeugten Dataset mitgegeben werden
pub const DATASET_ACTIONS: [&str; 10] = [
    "quicksight:DescribeDataSet",
    "quicksight:DescribeDataSetPermissions",
    "quicksight:PassDataSet",
    "quicksight:DescribeIngestion",
    "quicksight:ListIngestions",
    "quicksight:UpdateDataSet",
    "quicksight:DeleteDataSet",
    "quicksight:CreateIngestion",
    "quicksight:CancelIngestion",
    "quicksight:UpdateDataSetPermissions",
];

/// Feste Berechtigungen für den anfragenden User auf einer Analyse
pub const ANALYSIS_ACTIONS: [&str; 7] = [
    "quicksight:UpdateAnalysis",
    "quicksight:RestoreAnalysis",
    "quicksight:UpdateAnalysisPermissions",
    "quicksight:DeleteAnalysis",
    "quicksight:QueryAnalysis",
    "quicksight:DescribeAnalysisPermissions",
    "quicksight:DescribeAnalysis",
];

/// Custom-SQL Quelle einer physischen Tabelle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomSql {
    pub data_source_arn: String,
    pub name: String,
    pub sql_query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Value>,
}

/// Eintrag der PhysicalTableMap. Nicht-Custom-SQL-Varianten (RelationalTable,
/// S3Source) laufen unangetastet durch `other` mit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PhysicalTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_sql: Option<CustomSql>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

/// Quelle eines logischen Tabelleneintrags. Genau eines der Felder ist
/// gesetzt; die Rekursion interessiert sich nur für `data_set_arn`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogicalTableSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_set_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_instruction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_table_id: Option<String>,
}

/// Eintrag der LogicalTableMap eines Datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogicalTable {
    pub alias: String,
    pub source: LogicalTableSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_transforms: Option<Value>,
}

/// Beschreibung eines Datasets, wie der Katalog sie liefert.
/// Beide Maps sind immer vorhanden, eine darf leer sein.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetDescriptor {
    pub data_set_id: String,
    pub name: String,
    pub arn: String,
    #[serde(default)]
    pub physical_table_map: IndexMap<String, PhysicalTable>,
    #[serde(default)]
    pub logical_table_map: IndexMap<String, LogicalTable>,
    #[serde(default = "default_import_mode")]
    pub import_mode: String,
    /// Aus dem ersten Custom-SQL-Eintrag abgeleitet, kein Wire-Feld
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
}

fn default_import_mode() -> String {
    "SPICE".to_string()
}

impl DatasetDescriptor {
    /// Physisch: mindestens ein Eintrag in der PhysicalTableMap
    pub fn is_physical(&self) -> bool {
        !self.physical_table_map.is_empty()
    }

    /// Zusammengesetzt: ausschließlich logische Tabellen (Join-Graph)
    pub fn is_composed(&self) -> bool {
        self.physical_table_map.is_empty() && !self.logical_table_map.is_empty()
    }

    pub fn first_custom_sql(&self) -> Option<&CustomSql> {
        self.physical_table_map
            .values()
            .next()
            .and_then(|table| table.custom_sql.as_ref())
    }
}

/// Zusammenfassung einer Analyse (DescribeAnalysis)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisSummary {
    pub analysis_id: String,
    pub name: String,
    pub arn: String,
    #[serde(default)]
    pub data_set_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Listeneintrag aus ListAnalyses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisListEntry {
    pub analysis_id: String,
    pub name: String,
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<f64>,
}

/// Eine Deklaration in der Definition: Platzhalter plus Dataset-ARN.
/// Die Reihenfolge der Deklarationen ist signifikant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetIdentifierDeclaration {
    pub identifier: String,
    pub data_set_arn: String,
}

/// Der Definitionskörper. Nur die Deklarationen werden umgeschrieben,
/// Sheets, Visuals usw. reisen opak in `extra` mit und landen unverändert
/// wieder beim Katalog und im Archiv.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "DataSetIdentifierDeclarations", default)]
    pub data_set_identifier_declarations: Vec<DataSetIdentifierDeclaration>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Vollständige Analyse-Definition (DescribeAnalysisDefinition)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisDefinition {
    pub analysis_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_arn: Option<String>,
    pub definition: Definition,
}

/// Beschreibung eines Templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateDescriptor {
    pub arn: String,
    pub template_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Platzhalter-Bindung eines Templates an ein Dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetReference {
    pub data_set_placeholder: String,
    pub data_set_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physical_dataset() -> DatasetDescriptor {
        serde_json::from_value(serde_json::json!({
            "DataSetId": "ds-physical-1",
            "Name": "Sales",
            "Arn": "arn:aws:quicksight:us-west-2:123456789012:dataset/ds-physical-1",
            "PhysicalTableMap": {
                "t0": {
                    "CustomSql": {
                        "DataSourceArn": "arn:aws:quicksight:us-west-2:123456789012:datasource/src-A",
                        "Name": "sales",
                        "SqlQuery": "select * from sales"
                    }
                }
            },
            "LogicalTableMap": {},
            "ImportMode": "SPICE"
        }))
        .expect("valid dataset json")
    }

    #[test]
    fn test_classification() {
        let dataset = physical_dataset();
        assert!(dataset.is_physical());
        assert!(!dataset.is_composed());

        let composed: DatasetDescriptor = serde_json::from_value(serde_json::json!({
            "DataSetId": "ds-join-1",
            "Name": "Joined",
            "Arn": "arn:aws:quicksight:us-west-2:123456789012:dataset/ds-join-1",
            "LogicalTableMap": {
                "j0": {"Alias": "Intermediate Table", "Source": {"JoinInstruction": {}}}
            }
        }))
        .expect("valid dataset json");
        assert!(!composed.is_physical());
        assert!(composed.is_composed());
    }

    #[test]
    fn test_definition_passthrough_roundtrip() {
        let raw = serde_json::json!({
            "AnalysisId": "analysis-1",
            "Name": "Revenue",
            "Definition": {
                "DataSetIdentifierDeclarations": [
                    {"Identifier": "Sales", "DataSetArn": "arn:aws:quicksight:us-west-2:123456789012:dataset/ds-physical-1"}
                ],
                "Sheets": [{"SheetId": "sheet-1", "Visuals": []}],
                "CalculatedFields": []
            }
        });

        let definition: AnalysisDefinition =
            serde_json::from_value(raw.clone()).expect("valid definition json");
        assert_eq!(
            definition.definition.data_set_identifier_declarations[0].identifier,
            "Sales"
        );

        // Sheets must survive the round trip untouched
        let back = serde_json::to_value(&definition).expect("serializable");
        assert_eq!(back["Definition"]["Sheets"], raw["Definition"]["Sheets"]);
    }
}
