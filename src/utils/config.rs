use serde::Deserialize;

/// Ein QuickSight-Deployment in einer Region. Datenquelle und Theme sind
/// vorkonfigurierte Ressourcen der jeweiligen Region.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionProfile {
    pub region: String,
    pub data_source_arn: String,
    pub theme_arn: String,
}

/// Hauptkonfiguration für den Migrator
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub account_id: String,
    pub prod: RegionProfile,
    pub dev: RegionProfile,
    pub archive_bucket: String,
    /// Deadline pro Katalog-Aufruf in Sekunden
    pub call_timeout_secs: u64,
}

impl Config {
    /// Lade Config aus Environment Variablen
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            account_id: std::env::var("AWS_ACCOUNT_ID")
                .expect("AWS_ACCOUNT_ID nicht gesetzt"),
            prod: RegionProfile {
                region: std::env::var("PROD_REGION")
                    .unwrap_or_else(|_| "us-west-2".to_string()),
                data_source_arn: std::env::var("PROD_DATA_SOURCE_ARN")
                    .expect("PROD_DATA_SOURCE_ARN nicht gesetzt"),
                theme_arn: std::env::var("PROD_THEME_ARN")
                    .expect("PROD_THEME_ARN nicht gesetzt"),
            },
            dev: RegionProfile {
                region: std::env::var("DEV_REGION")
                    .unwrap_or_else(|_| "us-east-1".to_string()),
                data_source_arn: std::env::var("DEV_DATA_SOURCE_ARN")
                    .expect("DEV_DATA_SOURCE_ARN nicht gesetzt"),
                theme_arn: std::env::var("DEV_THEME_ARN")
                    .expect("DEV_THEME_ARN nicht gesetzt"),
            },
            archive_bucket: std::env::var("ARCHIVE_BUCKET")
                .expect("ARCHIVE_BUCKET nicht gesetzt"),
            call_timeout_secs: std::env::var("QS_CALL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("QS_CALL_TIMEOUT_SECS muss eine Zahl sein"),
        }
    }

    /// Wähle das Profil zur angefragten Region
    pub fn profile_for(&self, region: &str) -> Option<&RegionProfile> {
        if self.prod.region == region {
            Some(&self.prod)
        } else if self.dev.region == region {
            Some(&self.dev)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            account_id: "123456789012".to_string(),
            prod: RegionProfile {
                region: "us-west-2".to_string(),
                data_source_arn: "arn:aws:quicksight:us-west-2:123456789012:datasource/src-prod"
                    .to_string(),
                theme_arn: "arn:aws:quicksight:us-west-2:123456789012:theme/theme-prod"
                    .to_string(),
            },
            dev: RegionProfile {
                region: "us-east-1".to_string(),
                data_source_arn: "arn:aws:quicksight:us-east-1:123456789012:datasource/src-dev"
                    .to_string(),
                theme_arn: "arn:aws:quicksight:us-east-1:123456789012:theme/theme-dev"
                    .to_string(),
            },
            archive_bucket: "qs-archive".to_string(),
            call_timeout_secs: 30,
        }
    }

    #[test]
    fn test_profile_lookup() {
        let config = sample();

        assert_eq!(config.profile_for("us-west-2").unwrap().region, "us-west-2");
        assert_eq!(config.profile_for("us-east-1").unwrap().region, "us-east-1");
        assert!(config.profile_for("eu-central-1").is_none());
    }
}
