use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use super::{AncestorSelections, OptionProvider, ProviderError};
use crate::types::FilterOption;

/// Adapts an async closure into an [`OptionProvider`].
pub struct FnProvider<F> {
    f: F,
}

impl<F> fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider").finish_non_exhaustive()
    }
}

/// ```ignore
/// let countries = provider_fn(|ancestors: AncestorSelections| async move {
///     api.countries(ancestors.constraint("continent")).await
/// });
/// ```
pub fn provider_fn<F, Fut>(f: F) -> FnProvider<F>
where
    F: Fn(AncestorSelections) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<FilterOption>, ProviderError>> + Send + 'static,
{
    FnProvider { f }
}

#[async_trait]
impl<F, Fut> OptionProvider for FnProvider<F>
where
    F: Fn(AncestorSelections) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<FilterOption>, ProviderError>> + Send + 'static,
{
    async fn fetch(&self, ancestors: &AncestorSelections) -> Result<Vec<FilterOption>, ProviderError> {
        (self.f)(ancestors.clone()).await
    }
}
