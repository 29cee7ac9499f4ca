pub mod models;
pub mod s3;

pub use models::ArchiveRecord;
pub use s3::{ArchiveWriter, S3ArchiveStore};
