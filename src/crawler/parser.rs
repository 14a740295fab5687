//! HTML extractor for following pages
//!
//! Every user entry on a following page carries a link element marked with
//! a name class. The link target of each such element is the identifier of
//! the followed user.

use crate::{ConfigError, Identifier};
use scraper::{Html, Selector};

/// Default selector for user links on a following page
pub const DEFAULT_SELECTOR: &str = ".name";

/// A validated CSS selector for identifier links
#[derive(Debug, Clone)]
pub struct IdentifierSelector {
    source: String,
    selector: Selector,
}

impl IdentifierSelector {
    /// Parses a CSS selector
    ///
    /// # Returns
    ///
    /// * `Ok(IdentifierSelector)` - The selector is valid
    /// * `Err(ConfigError::InvalidSelector)` - The selector does not parse
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(source)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", source, e)))?;

        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    /// The selector text as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Extracts the identifiers referenced on a following page
///
/// Takes the `href` of every element matching `selector`, in document order.
/// Elements without an `href` (or with a blank one) are skipped. An empty
/// result means the following list has no more entries.
///
/// # Example
///
/// ```
/// use follow_ripple::crawler::{extract_identifiers, IdentifierSelector};
///
/// let html = r#"<ul><li><a class="name" href="/bob/">Bob</a></li></ul>"#;
/// let selector = IdentifierSelector::parse(".name").unwrap();
/// assert_eq!(extract_identifiers(html, &selector), vec!["/bob/"]);
/// ```
pub fn extract_identifiers(html: &str, selector: &IdentifierSelector) -> Vec<Identifier> {
    let document = Html::parse_document(html);

    document
        .select(&selector.selector)
        .filter_map(|element| match element.value().attr("href") {
            Some(href) if !href.trim().is_empty() => Some(href.trim().to_string()),
            _ => {
                tracing::trace!("Skipping <{}> without href", element.value().name());
                None
            }
        })
        .collect()
}
