use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::{Method, StatusCode};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::migration::arn;
use crate::quicksight::catalog::{AnalysisCatalog, DatasetCatalog, TemplateCatalog, UserCatalog};
use crate::quicksight::error::CatalogError;
use crate::quicksight::models::{
    AnalysisDefinition, AnalysisListEntry, AnalysisSummary, DataSetReference, DatasetDescriptor,
    TemplateDescriptor, ANALYSIS_ACTIONS, DATASET_ACTIONS,
};
use crate::utils::config::RegionProfile;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "quicksight";

/// QuickSight REST Client mit SigV4 Signing, gebunden an eine Region
pub struct QuickSightCatalog {
    client: reqwest::Client,
    account_id: String,
    profile: RegionProfile,
    credentials: SharedCredentialsProvider,
    call_timeout: Duration,
}

impl QuickSightCatalog {
    /// Erstelle neuen Client für das Profil einer Region
    pub async fn new(
        account_id: String,
        profile: RegionProfile,
        call_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let shared = aws_config::load_from_env().await;
        let credentials = shared
            .credentials_provider()
            .ok_or_else(|| anyhow::anyhow!("no AWS credentials provider configured"))?;

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            account_id,
            profile,
            credentials,
            call_timeout,
        })
    }

    pub fn region(&self) -> &str {
        &self.profile.region
    }

    /// Signierter Request gegen die QuickSight API. Jeder Aufruf bekommt die
    /// konfigurierte Deadline; ein Überschreiten wird als Timeout gemeldet.
    async fn call(
        &self,
        op: &'static str,
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value, CatalogError> {
        let credentials = self.credentials.provide_credentials().await.map_err(|e| {
            CatalogError::Operation {
                op,
                message: format!("credential resolution failed: {e}"),
            }
        })?;

        let payload = match &body {
            Some(value) => serde_json::to_vec(value).map_err(|e| CatalogError::Operation {
                op,
                message: format!("request serialization failed: {e}"),
            })?,
            None => Vec::new(),
        };
        let payload_hash = sha256_hex(&payload);

        let host = format!("{SERVICE}.{}.amazonaws.com", self.profile.region);
        let canonical_query = canonical_query(&query);
        let parts = sign_request(
            &method,
            &host,
            &path,
            &canonical_query,
            &payload_hash,
            &self.profile.region,
            &credentials,
            Utc::now(),
        );

        let mut url = format!("https://{host}{path}");
        if !canonical_query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query);
        }

        let mut request = self
            .client
            .request(method, &url)
            .header("x-amz-date", &parts.amz_date)
            .header("authorization", &parts.authorization)
            .header("content-type", "application/json");
        if let Some(token) = credentials.session_token() {
            request = request.header("x-amz-security-token", token);
        }
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let response = tokio::time::timeout(self.call_timeout, request.send())
            .await
            .map_err(|_| CatalogError::Timeout { op })?
            .map_err(|e| CatalogError::Operation {
                op,
                message: e.to_string(),
            })?;

        let status = response.status();
        let error_type = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response
            .text()
            .await
            .map_err(|e| CatalogError::Operation {
                op,
                message: e.to_string(),
            })?;

        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| CatalogError::Operation {
                op,
                message: format!("invalid response body: {e}"),
            });
        }

        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("Message")
                    .or_else(|| v.get("message"))
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .unwrap_or(text);

        if error_type.contains("ResourceExistsException") || status == StatusCode::CONFLICT {
            return Err(CatalogError::AlreadyExists(message));
        }
        if error_type.contains("ResourceNotFoundException") || status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(message));
        }
        Err(CatalogError::Operation {
            op,
            message: format!("{status}: {message}"),
        })
    }
}

#[async_trait]
impl DatasetCatalog for QuickSightCatalog {
    async fn describe_dataset(
        &self,
        dataset_id: &str,
    ) -> Result<DatasetDescriptor, CatalogError> {
        let op = "DescribeDataSet";
        let value = self
            .call(
                op,
                Method::GET,
                format!("/accounts/{}/data-sets/{dataset_id}", self.account_id),
                Vec::new(),
                None,
            )
            .await?;

        let mut descriptor: DatasetDescriptor =
            serde_json::from_value(value.get("DataSet").cloned().unwrap_or(Value::Null))
                .map_err(|e| CatalogError::Operation {
                    op,
                    message: format!("unexpected response shape: {e}"),
                })?;
        descriptor.data_source_id = descriptor
            .first_custom_sql()
            .map(|sql| arn::extract_id(&sql.data_source_arn))
            .filter(|id| !id.is_empty());
        Ok(descriptor)
    }

    async fn create_dataset(
        &self,
        descriptor: &DatasetDescriptor,
        grantee_arn: &str,
    ) -> Result<String, CatalogError> {
        let op = "CreateDataSet";
        let body = json!({
            "DataSetId": descriptor.data_set_id,
            "Name": format!("{}_copy", descriptor.name),
            "PhysicalTableMap": &descriptor.physical_table_map,
            "LogicalTableMap": &descriptor.logical_table_map,
            "ImportMode": descriptor.import_mode,
            "Permissions": [{
                "Principal": grantee_arn,
                "Actions": DATASET_ACTIONS,
            }],
        });

        let value = self
            .call(
                op,
                Method::POST,
                format!("/accounts/{}/data-sets", self.account_id),
                Vec::new(),
                Some(body),
            )
            .await?;

        value
            .get("Arn")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| CatalogError::Operation {
                op,
                message: "response carried no Arn".to_string(),
            })
    }
}

#[async_trait]
impl AnalysisCatalog for QuickSightCatalog {
    async fn describe_analysis(
        &self,
        analysis_id: &str,
    ) -> Result<AnalysisSummary, CatalogError> {
        let op = "DescribeAnalysis";
        let value = self
            .call(
                op,
                Method::GET,
                format!("/accounts/{}/analyses/{analysis_id}", self.account_id),
                Vec::new(),
                None,
            )
            .await?;

        serde_json::from_value(value.get("Analysis").cloned().unwrap_or(Value::Null)).map_err(
            |e| CatalogError::Operation {
                op,
                message: format!("unexpected response shape: {e}"),
            },
        )
    }

    async fn describe_analysis_definition(
        &self,
        analysis_id: &str,
    ) -> Result<AnalysisDefinition, CatalogError> {
        let op = "DescribeAnalysisDefinition";
        let value = self
            .call(
                op,
                Method::GET,
                format!(
                    "/accounts/{}/analyses/{analysis_id}/definition",
                    self.account_id
                ),
                Vec::new(),
                None,
            )
            .await?;

        serde_json::from_value(value).map_err(|e| CatalogError::Operation {
            op,
            message: format!("unexpected response shape: {e}"),
        })
    }

    async fn create_analysis(&self, definition: &AnalysisDefinition) -> Result<(), CatalogError> {
        let mut body = json!({
            "Name": definition.name,
            "Definition": &definition.definition,
        });
        if let Some(theme_arn) = &definition.theme_arn {
            body["ThemeArn"] = json!(theme_arn);
        }

        self.call(
            "CreateAnalysis",
            Method::POST,
            format!(
                "/accounts/{}/analyses/{}",
                self.account_id, definition.analysis_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn create_analysis_from_template(
        &self,
        analysis: &AnalysisSummary,
        template: &TemplateDescriptor,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError> {
        let body = source_template_body(analysis, template, dataset_references);
        self.call(
            "CreateAnalysis",
            Method::POST,
            format!(
                "/accounts/{}/analyses/{}",
                self.account_id, analysis.analysis_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn update_analysis_from_template(
        &self,
        analysis: &AnalysisSummary,
        template: &TemplateDescriptor,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError> {
        let body = source_template_body(analysis, template, dataset_references);
        self.call(
            "UpdateAnalysis",
            Method::PUT,
            format!(
                "/accounts/{}/analyses/{}",
                self.account_id, analysis.analysis_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn list_analyses(&self) -> Result<Vec<AnalysisListEntry>, CatalogError> {
        let op = "ListAnalyses";
        let mut entries = Vec::new();
        let mut next_token: Option<String> = None;

        // Explicit pagination loop; the accumulator stays with the caller.
        loop {
            let mut query = vec![("max-results".to_string(), "100".to_string())];
            if let Some(token) = &next_token {
                query.push(("next-token".to_string(), token.clone()));
            }

            let value = self
                .call(
                    op,
                    Method::GET,
                    format!("/accounts/{}/analyses", self.account_id),
                    query,
                    None,
                )
                .await?;

            if let Some(list) = value.get("AnalysisSummaryList").and_then(Value::as_array) {
                for entry in list {
                    let entry: AnalysisListEntry = serde_json::from_value(entry.clone())
                        .map_err(|e| CatalogError::Operation {
                            op,
                            message: format!("unexpected response shape: {e}"),
                        })?;
                    entries.push(entry);
                }
            }

            next_token = value
                .get("NextToken")
                .and_then(Value::as_str)
                .map(String::from);
            if next_token.is_none() {
                break;
            }
        }

        Ok(entries)
    }

    async fn restore_analysis(&self, analysis_id: &str) -> Result<(), CatalogError> {
        self.call(
            "RestoreAnalysis",
            Method::POST,
            format!(
                "/accounts/{}/restore/analyses/{analysis_id}",
                self.account_id
            ),
            Vec::new(),
            None,
        )
        .await?;
        Ok(())
    }

    async fn grant_analysis_permissions(
        &self,
        analysis_id: &str,
        user_arn: &str,
    ) -> Result<(), CatalogError> {
        let body = json!({
            "GrantPermissions": [{
                "Principal": user_arn,
                "Actions": ANALYSIS_ACTIONS,
            }],
        });

        self.call(
            "UpdateAnalysisPermissions",
            Method::PUT,
            format!(
                "/accounts/{}/analyses/{analysis_id}/permissions",
                self.account_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateCatalog for QuickSightCatalog {
    async fn create_template(
        &self,
        analysis: &AnalysisSummary,
        comment: &str,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError> {
        let body = template_body(analysis, comment, dataset_references);
        self.call(
            "CreateTemplate",
            Method::POST,
            format!(
                "/accounts/{}/templates/{}",
                self.account_id, analysis.analysis_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn update_template(
        &self,
        analysis: &AnalysisSummary,
        comment: &str,
        dataset_references: &[DataSetReference],
    ) -> Result<(), CatalogError> {
        let body = template_body(analysis, comment, dataset_references);
        self.call(
            "UpdateTemplate",
            Method::PUT,
            format!(
                "/accounts/{}/templates/{}",
                self.account_id, analysis.analysis_id
            ),
            Vec::new(),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn describe_template(
        &self,
        template_id: &str,
        version: Option<i64>,
    ) -> Result<TemplateDescriptor, CatalogError> {
        let op = "DescribeTemplate";
        let mut query = Vec::new();
        if let Some(version) = version {
            query.push(("version-number".to_string(), version.to_string()));
        }

        let value = self
            .call(
                op,
                Method::GET,
                format!("/accounts/{}/templates/{template_id}", self.account_id),
                query,
                None,
            )
            .await?;

        let template = value.get("Template").cloned().unwrap_or(Value::Null);
        Ok(TemplateDescriptor {
            arn: template
                .get("Arn")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            template_id: template
                .get("TemplateId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: template
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            version: template
                .get("Version")
                .and_then(|v| v.get("VersionNumber"))
                .and_then(Value::as_i64),
            description: template
                .get("Version")
                .and_then(|v| v.get("Description"))
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

#[async_trait]
impl UserCatalog for QuickSightCatalog {
    async fn lookup_user_arn(&self, email: &str) -> Result<String, CatalogError> {
        let value = self
            .call(
                "ListUsers",
                Method::GET,
                format!(
                    "/accounts/{}/namespaces/default/users",
                    self.account_id
                ),
                Vec::new(),
                None,
            )
            .await?;

        value
            .get("UserList")
            .and_then(Value::as_array)
            .and_then(|users| {
                users.iter().find(|user| {
                    user.get("Email").and_then(Value::as_str) == Some(email)
                })
            })
            .and_then(|user| user.get("Arn").and_then(Value::as_str))
            .map(String::from)
            .ok_or_else(|| CatalogError::NotFound(format!("no user with email {email}")))
    }
}

fn template_body(
    analysis: &AnalysisSummary,
    comment: &str,
    dataset_references: &[DataSetReference],
) -> Value {
    json!({
        "Name": format!("{}_template", analysis.name),
        "SourceEntity": {
            "SourceAnalysis": {
                "Arn": analysis.arn,
                "DataSetReferences": dataset_references,
            }
        },
        "VersionDescription": comment,
    })
}

fn source_template_body(
    analysis: &AnalysisSummary,
    template: &TemplateDescriptor,
    dataset_references: &[DataSetReference],
) -> Value {
    json!({
        "Name": analysis.name,
        "SourceEntity": {
            "SourceTemplate": {
                "Arn": template.arn,
                "DataSetReferences": dataset_references,
            }
        },
    })
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// RFC-3986 Encoding wie von SigV4 verlangt
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Query-Parameter sortiert und encodiert, identisch für Signatur und URL
fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

struct SignatureParts {
    authorization: String,
    amz_date: String,
}

/// Erstelle SigV4 Authorization Header (HMAC-SHA256 Signing Chain)
#[allow(clippy::too_many_arguments)]
fn sign_request(
    method: &Method,
    host: &str,
    path: &str,
    canonical_query: &str,
    payload_hash: &str,
    region: &str,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> SignatureParts {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut canonical_headers = format!("host:{host}\nx-amz-date:{amz_date}\n");
    let mut signed_headers = String::from("host;x-amz-date");
    if let Some(token) = credentials.session_token() {
        canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
        signed_headers.push_str(";x-amz-security-token");
    }

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.as_str(),
        uri_encode(path, false),
        canonical_query,
        canonical_headers,
        signed_headers,
        payload_hash,
    );

    let scope = format!("{date}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let mut key = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key()).as_bytes(),
        date.as_bytes(),
    );
    key = hmac_sha256(&key, region.as_bytes());
    key = hmac_sha256(&key, SERVICE.as_bytes());
    key = hmac_sha256(&key, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id()
    );

    SignatureParts {
        authorization,
        amz_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_credentials(session_token: Option<&str>) -> Credentials {
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            session_token.map(String::from),
            None,
            "static",
        )
    }

    #[test]
    fn test_signature_shape() {
        let now = Utc
            .with_ymd_and_hms(2015, 8, 30, 12, 36, 0)
            .single()
            .expect("valid timestamp");
        let parts = sign_request(
            &Method::GET,
            "quicksight.us-east-1.amazonaws.com",
            "/accounts/123456789012/analyses/analysis-1",
            "",
            &sha256_hex(b""),
            "us-east-1",
            &test_credentials(None),
            now,
        );

        assert!(parts.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/quicksight/aws4_request, \
             SignedHeaders=host;x-amz-date, Signature="
        ));
        let signature = parts
            .authorization
            .rsplit("Signature=")
            .next()
            .expect("signature present");
        assert_eq!(signature.len(), 64); // SHA256 hex = 64 chars
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts.amz_date, "20150830T123600Z");
    }

    #[test]
    fn test_signature_is_deterministic() {
        let now = Utc
            .with_ymd_and_hms(2015, 8, 30, 12, 36, 0)
            .single()
            .expect("valid timestamp");
        let sign = || {
            sign_request(
                &Method::POST,
                "quicksight.us-west-2.amazonaws.com",
                "/accounts/123456789012/data-sets",
                "",
                &sha256_hex(b"{\"DataSetId\":\"ds-1\"}"),
                "us-west-2",
                &test_credentials(None),
                now,
            )
            .authorization
        };
        assert_eq!(sign(), sign());
    }

    #[test]
    fn test_session_token_is_signed() {
        let now = Utc
            .with_ymd_and_hms(2015, 8, 30, 12, 36, 0)
            .single()
            .expect("valid timestamp");
        let parts = sign_request(
            &Method::GET,
            "quicksight.us-east-1.amazonaws.com",
            "/accounts/123456789012/analyses",
            "",
            &sha256_hex(b""),
            "us-east-1",
            &test_credentials(Some("TOKEN")),
            now,
        );
        assert!(parts
            .authorization
            .contains("SignedHeaders=host;x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn test_canonical_query_sorted_and_encoded() {
        let query = vec![
            ("next-token".to_string(), "abc/def==".to_string()),
            ("max-results".to_string(), "100".to_string()),
        ];
        assert_eq!(
            canonical_query(&query),
            "max-results=100&next-token=abc%2Fdef%3D%3D"
        );
    }
}
