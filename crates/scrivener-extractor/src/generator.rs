//! Generation pipeline
//!
//! Prompt → provider → parse/repair → validate → normalize → reconstruct.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::normalizer::FieldNormalizer;
use crate::parser::{parse_response, validate_required};
use crate::prompt::PromptBuilder;
use crate::reconstructor::Reconstructor;
use crate::types::{
    FieldSelection, FieldWarning, GenerationMetadata, GenerationRequest, GenerationResult,
};
use scrivener_domain::{DocNode, FieldCatalog, KeyGenerator, LlmProvider, ValueMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns notes into documents for one target catalog
pub struct Generator<L, K>
where
    L: LlmProvider,
    K: KeyGenerator,
{
    llm_provider: Arc<L>,
    keys: Arc<K>,
    config: ExtractorConfig,
}

impl<L, K> Generator<L, K>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
    K: KeyGenerator + 'static,
{
    /// Create a new Generator
    pub fn new(llm_provider: L, keys: K, config: ExtractorConfig) -> Self {
        Self {
            llm_provider: Arc::new(llm_provider),
            keys: Arc::new(keys),
            config,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Expand a note into a document
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, ExtractorError> {
        let start_time = Instant::now();

        let note_length = request.note_length();
        if note_length > self.config.max_note_length {
            return Err(ExtractorError::NoteTooLong(
                note_length,
                self.config.max_note_length,
            ));
        }

        info!(
            "Starting generation for type '{}', note length {}",
            request.document_type, note_length
        );

        let prompt = PromptBuilder::new(&request.title, &request.body, &request.document_type)
            .with_fields(&request.catalog, &request.selection)
            .build();
        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(self.config.generation_timeout(), self.call_llm(prompt))
            .await
            .map_err(|_| ExtractorError::Timeout)??;
        debug!("Provider response length: {} chars", response.len());

        let mut result = self
            .process_response(&response, &request.catalog, &request.selection)
            .await?;
        result.metadata.processing_time_ms = start_time.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Turn a raw provider response into a document
    ///
    /// Fails only when no repair stage yields an object or when an enabled
    /// field is missing; every other problem becomes a warning.
    pub async fn process_response(
        &self,
        raw: &str,
        catalog: &FieldCatalog,
        selection: &FieldSelection,
    ) -> Result<GenerationResult, ExtractorError> {
        let start_time = Instant::now();

        let parsed = parse_response(raw, self.config.diagnostic_excerpt_chars)?;
        validate_required(&parsed.values, catalog, selection)?;

        let fields_generated = parsed.values.len();
        let (values, warnings) = self.normalize_all(parsed.values, catalog).await?;

        let reconstruction = Reconstructor::new(catalog, self.keys.as_ref()).reconstruct(values);
        if !reconstruction.unmatched_keys.is_empty() {
            warn!(
                "{} generated keys had no place in '{}'",
                reconstruction.unmatched_keys.len(),
                catalog.document_type()
            );
        }

        let document = DocNode::Tagged {
            tag: catalog.document_type().to_string(),
            key: None,
            fields: reconstruction.fields,
        };

        info!(
            "Generated '{}' document: {} values, {} warnings",
            catalog.document_type(),
            fields_generated,
            warnings.len()
        );

        Ok(GenerationResult {
            document,
            warnings,
            unmatched_keys: reconstruction.unmatched_keys,
            metadata: GenerationMetadata {
                document_type: catalog.document_type().to_string(),
                model_name: self.llm_provider.model_name().to_string(),
                repair_stage: parsed.stage,
                fields_generated,
                processing_time_ms: start_time.elapsed().as_millis() as u64,
            },
        })
    }

    /// Normalize every entry on the blocking pool, keeping emission order
    async fn normalize_all(
        &self,
        values: ValueMap,
        catalog: &FieldCatalog,
    ) -> Result<(ValueMap, Vec<FieldWarning>), ExtractorError> {
        let normalizer = FieldNormalizer::new(self.config.normalize_markdown);
        let catalog = Arc::new(catalog.clone());
        let mut tasks = JoinSet::new();

        for (index, (key, value)) in values.into_iter().enumerate() {
            let catalog = Arc::clone(&catalog);
            let keys = Arc::clone(&self.keys);
            tasks.spawn_blocking(move || {
                let (value, warnings) =
                    normalizer.normalize_entry(&key, value, &catalog, keys.as_ref());
                (index, key, value, warnings)
            });
        }

        let mut done = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let entry = joined
                .map_err(|e| ExtractorError::Normalization(format!("Task join error: {}", e)))?;
            done.push(entry);
        }
        done.sort_by_key(|(index, ..)| *index);

        let mut warnings = Vec::new();
        let values = done
            .into_iter()
            .map(|(_, key, value, mut field_warnings)| {
                warnings.append(&mut field_warnings);
                (key, value)
            })
            .collect();
        Ok((values, warnings))
    }

    /// Call the provider
    async fn call_llm(&self, prompt: String) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);

        // LlmProvider is synchronous
        tokio::task::spawn_blocking(move || {
            llm.generate(&prompt)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Llm(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_domain::{FieldKind, FieldPath, SchemaField, SequentialKeys};
    use scrivener_llm::MockProvider;

    fn catalog() -> FieldCatalog {
        let mut catalog = FieldCatalog::new("post");
        for (path, kind) in [("title", FieldKind::String), ("publishedAt", FieldKind::Date)] {
            catalog
                .insert(SchemaField::new(FieldPath::parse(path).unwrap(), kind, path))
                .unwrap();
        }
        catalog
    }

    fn generator(response: &str) -> Generator<MockProvider, SequentialKeys> {
        Generator::new(
            MockProvider::new(response),
            SequentialKeys::default(),
            ExtractorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_process_response_builds_tagged_document() {
        let catalog = catalog();
        let result = generator("{}")
            .process_response(
                r#"{"title": "Hi [2]", "publishedAt": "March 5, 2024"}"#,
                &catalog,
                &FieldSelection::all(&catalog),
            )
            .await
            .unwrap();

        assert_eq!(result.document.tag(), Some("post"));
        let fields = result.document.fields().unwrap();
        assert_eq!(fields["title"].as_str(), Some("Hi"));
        assert_eq!(fields["publishedAt"].as_str(), Some("2024-03-05"));
        assert_eq!(result.metadata.fields_generated, 2);
        assert_eq!(result.metadata.model_name, "mock");
    }

    #[test]
    fn test_process_response_on_current_thread_runtime() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        let generator = generator("{}");
        let result = tokio_test::block_on(generator.process_response(
            r#"{"title": "x", "publishedAt": "2024-01-01"}"#,
            &catalog,
            &selection,
        ));
        assert_eq!(result.unwrap().metadata.repair_stage.to_string(), "direct");
    }

    #[tokio::test]
    async fn test_normalization_keeps_emission_order() {
        let catalog = FieldCatalog::new("post");
        let keys: Vec<String> = (0..20).map(|i| format!("f{}", i)).collect();
        let body = keys
            .iter()
            .map(|k| format!("\"{}\": \"v\"", k))
            .collect::<Vec<_>>()
            .join(", ");

        let generator = generator("{}");
        let parsed = parse_response(&format!("{{{}}}", body), 100).unwrap();
        let (values, _) = generator.normalize_all(parsed.values, &catalog).await.unwrap();
        let order: Vec<&str> = values.keys().collect();
        assert_eq!(order, keys.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
