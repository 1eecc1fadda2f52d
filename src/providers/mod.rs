/*!
 * Provider implementations for different translation services.
 *
 * This module contains the client side of the translation pipeline:
 * - `google`: HTTP adapter for the public Google Translate endpoint
 * - `mock`: Scripted provider used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Short identifier of the provider, used in logs
    fn name(&self) -> &str;

    /// Translate a text from one language to another
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - ISO 639-1 code of the text
    /// * `target_language` - ISO 639-1 code to translate into
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or a classified failure.
    ///   Blank input yields an empty string without contacting the provider.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the provider is reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub mod google;
pub mod mock;

pub use google::GoogleTranslateClient;
pub use mock::MockProvider;
