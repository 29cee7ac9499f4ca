use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::storage::models::ArchiveRecord;

/// Senke für Archivdatensätze. Schreibfehler werden beim Aufrufer geloggt,
/// nie propagiert; das Archiv ist best-effort.
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    /// Schreibe den Datensatz und gib den Ablageort zurück
    async fn put_record(
        &self,
        record: &ArchiveRecord,
        stakeholder: Option<&str>,
    ) -> Result<String>;
}

/// S3 Archive Layer
pub struct S3ArchiveStore {
    client: Client,
    bucket: String,
}

impl S3ArchiveStore {
    /// Erstelle neue S3 Store Instanz
    pub async fn new(bucket: String) -> Result<Self> {
        let config = aws_config::load_from_env().await;
        let client = Client::new(&config);

        Ok(Self { client, bucket })
    }
}

#[async_trait]
impl ArchiveWriter for S3ArchiveStore {
    async fn put_record(
        &self,
        record: &ArchiveRecord,
        stakeholder: Option<&str>,
    ) -> Result<String> {
        let key = record.object_key(stakeholder);
        let body = serde_json::to_vec_pretty(record)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await?;

        tracing::info!("archive record written to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}
