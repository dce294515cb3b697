//! Role-keyed system prompts loaded from YAML.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::{ConfigError, Role};

/// Built-in templates used when no file is supplied
pub const DEFAULT_TEMPLATES: &str = include_str!("../prompts/agents.yaml");

#[derive(Debug, Clone, Deserialize)]
struct RoleTemplate {
    system_prompt: String,
}

/// System prompts for every agent role, validated at load time.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    prompts: HashMap<Role, String>,
}

impl PromptTemplates {
    /// Parse templates from YAML text.
    ///
    /// Unknown role keys are ignored; each of retriever, synthesizer and
    /// critic must be present with a non-empty `system_prompt`.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, RoleTemplate> = serde_yaml::from_str(yaml)?;

        let mut prompts = HashMap::new();
        for (key, template) in raw {
            match key.parse::<Role>() {
                Ok(role) if role != Role::User => {
                    prompts.insert(role, template.system_prompt.trim().to_string());
                }
                _ => debug!(key = %key, "Ignoring unknown template role"),
            }
        }

        for role in Role::AGENTS {
            match prompts.get(&role) {
                Some(prompt) if !prompt.is_empty() => {}
                _ => return Err(ConfigError::MissingRole(role.to_string())),
            }
        }

        Ok(Self { prompts })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given, otherwise use the built-in set.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_yaml(DEFAULT_TEMPLATES),
        }
    }

    /// System prompt for an agent role.
    ///
    /// Every agent role is guaranteed present after validation; `User` has none.
    pub fn system_prompt(&self, role: Role) -> Option<&str> {
        self.prompts.get(&role).map(String::as_str)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let prompts = Role::AGENTS
            .into_iter()
            .map(|role| (role, format!("You are a {} agent in a multi-agent system.", role)))
            .collect();
        Self { prompts }
    }
}
