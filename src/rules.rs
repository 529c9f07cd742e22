//! Declarative rate limit rules.
//!
//! This module handles loading limiter definitions from configuration.
//! A rules file maps scope names to limit settings, and `build` turns the
//! whole file into ready limiters over one shared store.
//!
//! ```yaml
//! scopes:
//!   api:
//!     max: 100
//!     window: minute
//!     strategy: endpoint
//!   login:
//!     max: 5
//!     window: minute
//!     strategy: credential
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, TollgateError};
use crate::key::KeyStrategy;
use crate::limiter::RateLimiter;
use crate::store::Store;
use crate::window::TimeWindow;

/// A complete rules file: scope name to limit settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub scopes: HashMap<String, ScopeRule>,
}

/// Limit settings for a single scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRule {
    /// Maximum requests allowed in the window.
    pub max: u64,
    /// The time window.
    pub window: TimeWindow,
    /// How keys are derived for this scope.
    #[serde(default = "default_strategy")]
    pub strategy: KeyStrategy,
}

fn default_strategy() -> KeyStrategy {
    KeyStrategy::ClientAddr
}

impl RulesConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TollgateError::Config(format!("Failed to parse rules: {}", e)))
    }

    /// Get the rule for a scope.
    pub fn get(&self, scope: &str) -> Option<&ScopeRule> {
        self.scopes.get(scope)
    }

    /// Build one limiter per scope over a shared store.
    ///
    /// Fails on the first invalid rule; a bad rules file should stop startup
    /// rather than silently drop a limit.
    pub fn build(&self, store: Arc<dyn Store>) -> Result<HashMap<String, RateLimiter>> {
        let mut limiters = HashMap::with_capacity(self.scopes.len());

        for (scope, rule) in &self.scopes {
            let limiter = RateLimiter::new(
                scope.clone(),
                rule.max,
                rule.window,
                rule.strategy,
                store.clone(),
            )?;
            limiters.insert(scope.clone(), limiter);
        }

        Ok(limiters)
    }
}
