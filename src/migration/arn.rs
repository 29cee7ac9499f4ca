use crate::quicksight::models::DatasetDescriptor;

/// Extrahiere die Ressourcen-ID aus einer ARN: alles hinter dem letzten `/`.
/// Liefert einen leeren String, wenn kein Separator vorkommt; der Aufrufer
/// muss das als "nicht parsebar" behandeln.
pub fn extract_id(resource_name: &str) -> String {
    match resource_name.rfind('/') {
        Some(index) => resource_name[index + 1..].to_string(),
        None => String::new(),
    }
}

/// Schreibe den Regions-Token einer ARN um. Reine Substring-Ersetzung ohne
/// Validierung; ob das Ergebnis existiert, entscheidet der Katalogaufruf.
/// Taucht der Quell-Token mehrfach auf, werden alle Vorkommen ersetzt.
pub fn rewrite_region(resource_name: &str, from_region: &str, to_region: &str) -> String {
    resource_name.replace(from_region, to_region)
}

/// Biege die Datenquelle eines physischen Datasets auf die Zielregion um.
/// Physische Datasets tragen genau einen Custom-SQL-Eintrag; logische
/// Datasets bleiben unberührt, deren Kinder werden einzeln umgebogen.
pub fn retarget_data_source(descriptor: &mut DatasetDescriptor, new_data_source_arn: &str) {
    if let Some(table) = descriptor.physical_table_map.values_mut().next() {
        if let Some(custom_sql) = table.custom_sql.as_mut() {
            custom_sql.data_source_arn = new_data_source_arn.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quicksight::models::{CustomSql, PhysicalTable};
    use indexmap::IndexMap;

    fn physical(data_source_arn: &str) -> DatasetDescriptor {
        let mut physical_table_map = IndexMap::new();
        physical_table_map.insert(
            "t0".to_string(),
            PhysicalTable {
                custom_sql: Some(CustomSql {
                    data_source_arn: data_source_arn.to_string(),
                    name: "sales".to_string(),
                    sql_query: "select * from sales".to_string(),
                    columns: Vec::new(),
                }),
                other: serde_json::Map::new(),
            },
        );
        DatasetDescriptor {
            data_set_id: "ds-1".to_string(),
            name: "Sales".to_string(),
            arn: "arn:aws:quicksight:us-west-2:123456789012:dataset/ds-1".to_string(),
            physical_table_map,
            logical_table_map: IndexMap::new(),
            import_mode: "SPICE".to_string(),
            data_source_id: None,
        }
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(
            extract_id("arn:aws:quicksight:us-west-2:123456789012:dataset/ds-1"),
            "ds-1"
        );
        assert_eq!(
            extract_id("arn:aws:quicksight:us-west-2:123456789012:user/default/jane@example.com"),
            "jane@example.com"
        );
    }

    #[test]
    fn test_extract_id_without_separator_is_empty() {
        assert_eq!(extract_id("no-separator-here"), "");
        assert_eq!(extract_id(""), "");
    }

    #[test]
    fn test_rewrite_region_roundtrip() {
        // Involution as long as the region occurs exactly once
        let arn = "arn:aws:quicksight:us-west-2:123456789012:dataset/ds-1";
        let rewritten = rewrite_region(arn, "us-west-2", "us-east-1");
        assert_eq!(
            rewritten,
            "arn:aws:quicksight:us-east-1:123456789012:dataset/ds-1"
        );
        assert_eq!(rewrite_region(&rewritten, "us-east-1", "us-west-2"), arn);
    }

    #[test]
    fn test_retarget_physical_dataset() {
        let mut dataset = physical("arn:aws:quicksight:us-west-2:123456789012:datasource/src-A");
        retarget_data_source(
            &mut dataset,
            "arn:aws:quicksight:us-east-1:123456789012:datasource/src-B",
        );
        assert_eq!(
            dataset.first_custom_sql().map(|sql| sql.data_source_arn.as_str()),
            Some("arn:aws:quicksight:us-east-1:123456789012:datasource/src-B")
        );
    }

    #[test]
    fn test_retarget_leaves_logical_dataset_alone() {
        let mut dataset = physical("unused");
        dataset.physical_table_map.clear();
        let before = serde_json::to_value(&dataset).expect("serializable");
        retarget_data_source(&mut dataset, "arn:aws:anything");
        assert_eq!(serde_json::to_value(&dataset).expect("serializable"), before);
    }
}
