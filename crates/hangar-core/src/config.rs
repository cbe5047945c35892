//! Environment-sourced application configuration. Load from TOML or env.

use serde::Deserialize;

/// Azure OpenAI connection settings. All three fields are required for the
/// external-delegation path; absence disables only that path, never the data
/// routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzureConfig {
    pub endpoint: Option<String>,
    pub key: Option<String>,
    pub deployment: Option<String>,
}

impl AzureConfig {
    /// All required credentials, or None when any is missing/blank.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        let endpoint = self.endpoint.as_deref().filter(|s| !s.is_empty())?;
        let key = self.key.as_deref().filter(|s| !s.is_empty())?;
        let deployment = self.deployment.as_deref().filter(|s| !s.is_empty())?;
        Some((endpoint, key, deployment))
    }
}

/// Alternate provider (Neuro-SAN) connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeuroConfig {
    pub api_url: Option<String>,
    pub project: Option<String>,
}

impl NeuroConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let api_url = self.api_url.as_deref().filter(|s| !s.is_empty())?;
        let project = self.project.as_deref().filter(|s| !s.is_empty())?;
        Some((api_url, project))
    }
}

/// Global application configuration for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Directory holding flights.json, per-flight overrides, tuner.json, and logs/.
    pub data_dir: String,
    /// Directory with the single-page app shell served for unmatched routes.
    pub public_dir: String,
    /// Prompt template file: `{ "default": "...", ... }`.
    pub prompts_file: String,
    /// Environment name (development, production, ...). Informational only.
    pub environment: String,
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub neuro: NeuroConfig,
}

impl AppConfig {
    /// Load config from file and environment. Precedence: env `HANGAR_CONFIG`
    /// path > `config/gateway.toml` > defaults, with `HANGAR`-prefixed
    /// environment variables on top (e.g. `HANGAR_AZURE__ENDPOINT`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("HANGAR_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "A400 Squadron Gateway")?
            .set_default("port", 3000_i64)?
            .set_default("data_dir", "./data")?
            .set_default("public_dir", "./public")?
            .set_default("prompts_file", "config/prompts.json")?
            .set_default("environment", "development")?;

        // with_name resolves the extension, so "config/gateway" finds
        // config/gateway.toml; an absent file is not an error
        let built = builder
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("HANGAR").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_disable_the_azure_path() {
        let azure = AzureConfig {
            endpoint: Some("https://example.openai.azure.com".into()),
            key: Some(String::new()),
            deployment: Some("gpt4".into()),
        };
        assert!(azure.credentials().is_none());

        let azure = AzureConfig {
            endpoint: Some("https://example.openai.azure.com".into()),
            key: Some("secret".into()),
            deployment: Some("gpt4".into()),
        };
        let (endpoint, key, deployment) = azure.credentials().unwrap();
        assert_eq!(endpoint, "https://example.openai.azure.com");
        assert_eq!(key, "secret");
        assert_eq!(deployment, "gpt4");
    }

    #[test]
    fn config_file_is_found_without_its_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("gateway.toml"), "port = 4321\n").unwrap();

        // extensionless path, as the default "config/gateway" is
        std::env::set_var("HANGAR_CONFIG", dir.path().join("gateway"));
        let loaded = AppConfig::load();
        std::env::remove_var("HANGAR_CONFIG");

        assert_eq!(loaded.unwrap().port, 4321);
    }
}
