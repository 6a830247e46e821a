use crate::config::providers::ProviderSettings;
use crate::config::scenario::ScenarioConfig;
use crate::core::experiment::SUMMARY_FILE;
use crate::utils::error::{BenchError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_unique, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSection,
    #[serde(default)]
    pub providers: ProviderSettings,
    pub variants: Vec<VariantConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSection {
    pub name: String,
    pub n_replications: usize,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    #[serde(flatten)]
    pub scenario: ScenarioConfig,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

impl ExperimentConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BenchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of `VAR`; unknown variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn name(&self) -> &str {
        &self.experiment.name
    }

    pub fn n_replications(&self) -> usize {
        self.experiment.n_replications
    }

    pub fn log_dir(&self) -> &str {
        &self.experiment.log_dir
    }

    /// Model names referenced by any variant, in first-seen order.
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::new();
        for variant in &self.variants {
            if !models.contains(&variant.scenario.model.as_str()) {
                models.push(&variant.scenario.model);
            }
        }
        models
    }
}

impl Validate for ExperimentConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("experiment.name", &self.experiment.name)?;
        validate_dir_name("experiment.name", &self.experiment.name)?;
        validate_positive_number("experiment.n_replications", self.experiment.n_replications, 1)?;
        validate_path("experiment.log_dir", &self.experiment.log_dir)?;
        self.providers.validate()?;

        validate_positive_number("variants", self.variants.len(), 1)?;
        for variant in &self.variants {
            validate_non_empty_string("variants.name", &variant.name)?;
            validate_dir_name("variants.name", &variant.name)?;
            if variant.name == SUMMARY_FILE {
                return Err(BenchError::InvalidConfigValueError {
                    field: "variants.name".to_string(),
                    value: variant.name.clone(),
                    reason: format!("'{}' is written next to the variant directories", SUMMARY_FILE),
                });
            }
            variant.scenario.validate()?;
        }
        validate_unique("variants.name", self.variants.iter().map(|v| v.name.as_str()))
    }
}

/// Names that end up as a single path component under the log directory.
fn validate_dir_name(field: &str, name: &str) -> Result<()> {
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(BenchError::InvalidConfigValueError {
            field: field.to_string(),
            value: name.to_string(),
            reason: "Must be a plain directory name".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[experiment]
name = "baseline"
n_replications = 3
log_dir = "./test-logs"

[[variants]]
name = "skip"
n_agents = 4
n_rounds = 10
energy_usage_rate = 100
starting_energy = 300
model = "always-skip"

[[variants]]
name = "gpt"
n_agents = 3
n_rounds = 5
energy_usage_rate = 50
starting_energy = 100
model = "gpt-4.1"
receiver_index = 2
"#;

    #[test]
    fn test_parse_basic_experiment_config() {
        let config = ExperimentConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.name(), "baseline");
        assert_eq!(config.n_replications(), 3);
        assert_eq!(config.variants.len(), 2);
        assert_eq!(config.variants[1].scenario.receiver_index, 2);
        assert_eq!(config.models(), vec!["always-skip", "gpt-4.1"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ASB_TEST_OPENAI_URL", "http://localhost:4010/v1");

        let toml_content = format!(
            "{}\n[providers.openai]\nbase_url = \"${{ASB_TEST_OPENAI_URL}}\"\nmodel = \"gpt-4.1\"\n",
            BASIC
        );
        let config = ExperimentConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.providers.openai.base_url, "http://localhost:4010/v1");

        std::env::remove_var("ASB_TEST_OPENAI_URL");
    }

    #[test]
    fn test_duplicate_variant_names_rejected() {
        let mut config = ExperimentConfig::from_toml_str(BASIC).unwrap();
        config.variants[1].name = "skip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_names_must_be_plain_directory_names() {
        for bad in ["a/b", "..", ".", "summary.json"] {
            let mut config = ExperimentConfig::from_toml_str(BASIC).unwrap();
            config.variants[0].name = bad.to_string();
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, BenchError::InvalidConfigValueError { ref field, .. } if field == "variants.name"),
                "{} was accepted",
                bad
            );
        }

        let content = BASIC.replace("name = \"baseline\"", "name = \"runs\\\\baseline\"");
        let config = ExperimentConfig::from_toml_str(&content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfigValueError { ref field, .. } if field == "experiment.name"));
    }

    #[test]
    fn test_overflowing_energy_is_a_config_error() {
        let content = BASIC
            .replace("n_agents = 3", "n_agents = 3\ntotal_energy = 9223372036854775807")
            .replace("starting_energy = 100", "starting_energy = 4611686018427387904");
        let config = ExperimentConfig::from_toml_str(&content).unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfigValueError { ref field, .. } if field == "starting_energy"));
    }

    #[test]
    fn test_zero_replications_rejected() {
        let content = BASIC.replace("n_replications = 3", "n_replications = 0");
        let config = ExperimentConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_parsing_error() {
        let err = ExperimentConfig::from_toml_str("[experiment\nname=").unwrap_err();
        assert!(matches!(err, BenchError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = ExperimentConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.log_dir(), "./test-logs");
    }
}
