use crate::domain::model::{output_path_for, OutputTable, SourceRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;

    fn output_path(&self) -> String {
        output_path_for(self.input_path())
    }
}

/// Source of "now" for expiration times and title dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceRecord>>;
    async fn transform(&self, data: Vec<SourceRecord>) -> Result<OutputTable>;
    async fn load(&self, result: OutputTable) -> Result<String>;
}
