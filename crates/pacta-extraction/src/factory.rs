use anyhow::{Context, Result};
use std::sync::Arc;

use crate::claude::{ClaudeExtraction, ClaudeExtractionConfig};
use crate::provider::ExtractionProvider;
use crate::static_provider::StaticExtraction;
use pacta_core::Config;

/// Create the extraction provider named by configuration.
pub fn create_provider(config: &Config) -> Result<Arc<dyn ExtractionProvider>> {
    match config.extraction_provider.as_str() {
        "claude" => {
            let api_key = config
                .anthropic_api_key()
                .context("ANTHROPIC_API_KEY must be set for the claude provider")?
                .to_string();
            let provider = ClaudeExtraction::new(ClaudeExtractionConfig {
                api_key,
                model: config.anthropic_model().to_string(),
                max_tokens: 2048,
            })?;
            Ok(Arc::new(provider))
        }
        "static" => Ok(Arc::new(StaticExtraction::with_defaults())),
        other => Err(anyhow::anyhow!("Unknown extraction provider: {}", other)),
    }
}
