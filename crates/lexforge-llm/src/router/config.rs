//! Router configuration

use serde::{Deserialize, Serialize};

fn default_locale() -> String {
    "pt-BR".to_string()
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Locale tag every selected model must support
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}
