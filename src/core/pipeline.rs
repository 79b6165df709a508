use crate::core::acquire;
use crate::core::reference::ReferenceIndex;
use crate::core::registration::{RegistrationReader, RegistrationTransformer};
use crate::core::writer;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    ProcessingStats, SourceFiles, SourceMode, TransformResult, UnresolvedPolicy,
};
use crate::utils::error::Result;
use reqwest::Client;

/// FAA registry to EmComm Tools conversion.
pub struct FaaPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> FaaPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FaaPipeline<S, C> {
    fn source(&self) -> String {
        self.config.source_mode().to_string()
    }

    fn unresolved_policy(&self) -> UnresolvedPolicy {
        self.config.unresolved_policy()
    }

    async fn extract(&self) -> Result<SourceFiles> {
        match self.config.source_mode() {
            SourceMode::Download { url } => {
                let archive = acquire::download_archive(
                    &self.client,
                    url,
                    self.config.user_agent(),
                    self.config.request_timeout(),
                )
                .await?;
                acquire::extract_sources(&archive)
            }
            SourceMode::Local {
                registration,
                reference,
            } => acquire::read_local_sources(&self.storage, registration, reference).await,
        }
    }

    async fn transform(&self, sources: SourceFiles) -> Result<TransformResult> {
        let delimiter = self.config.input_delimiter();
        let mut stats = ProcessingStats::default();

        tracing::info!("Parsing aircraft reference data");
        let index = ReferenceIndex::from_reader(sources.reference.as_slice(), delimiter, &mut stats)?;
        tracing::info!(
            "Indexed {} aircraft codes ({} rows, {} malformed, {} duplicates)",
            index.len(),
            stats.reference_rows,
            stats.malformed_reference_rows,
            stats.duplicate_reference_codes
        );

        tracing::info!("Parsing aircraft registration data");
        let reader = RegistrationReader::new(sources.registration.as_slice(), delimiter)?;
        let rows = RegistrationTransformer::new(&index, self.config.unresolved_policy())
            .rows(reader, &mut stats)
            .collect::<Result<Vec<_>>>()?;

        Ok(TransformResult { rows, stats })
    }

    async fn load(&self, result: &TransformResult) -> Result<String> {
        let output_path = self.config.output_path();
        tracing::info!("Creating ETC database file {}", output_path.display());

        writer::write_output(&self.storage, output_path, &result.rows).await?;
        Ok(output_path.display().to_string())
    }
}
