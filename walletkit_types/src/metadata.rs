//! https://specs.walletconnect.com/2.0/specs/clients/sign/data-structures

use serde::{Deserialize, Serialize};

/// Descriptive record shown to wallet users by the WalletConnect service.
///
/// Immutable once built. All four fields are always serialized; an empty
/// `icons` list stays an empty array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    name: String,
    description: String,
    url: String,
    #[serde(default)]
    icons: Vec<String>,
}

impl Metadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            icons: Vec::new(),
        }
    }

    /// Sets the icon URLs, keeping their order.
    pub fn with_icons<I, S>(mut self, icons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.icons = icons.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn icons(&self) -> &[String] {
        &self.icons
    }
}
