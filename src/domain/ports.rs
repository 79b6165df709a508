use crate::domain::model::{SourceFiles, SourceMode, TransformResult, UnresolvedPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_mode(&self) -> &SourceMode;
    fn output_path(&self) -> &Path;
    fn unresolved_policy(&self) -> UnresolvedPolicy;
    fn user_agent(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn input_delimiter(&self) -> u8;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Human readable description of where the source data comes from.
    fn source(&self) -> String;
    fn unresolved_policy(&self) -> UnresolvedPolicy;

    async fn extract(&self) -> Result<SourceFiles>;
    async fn transform(&self, sources: SourceFiles) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<String>;
}
