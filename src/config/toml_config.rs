use crate::core::ConfigProvider;
use crate::domain::model::SearchProgram;
use crate::domain::ports::{
    DEFAULT_EVALUE, DEFAULT_HISTOGRAM_BINS, DEFAULT_NUM_ITERATIONS, DEFAULT_PLOT_FILE,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_evalue, validate_existing_file, validate_non_empty_string, validate_path,
    validate_positive_number, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub run: RunConfig,
    pub search: SearchConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub program: SearchProgram,
    pub database: String,
    pub evalue: Option<f64>,
    pub num_iterations: Option<u32>,
    pub blast_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub ids_file: String,
    pub query_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub matrix: String,
    pub plot: Option<String>,
    pub summary: Option<String>,
    pub histogram_bins: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BLASTDB})；未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Self::placeholder_regex()?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn placeholder_regex() -> Result<Regex> {
        Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })
    }

    /// 未被替換的 ${VAR} 視為缺少的設定
    fn check_unresolved(field: &str, value: &str) -> Result<()> {
        if let Some(caps) = Self::placeholder_regex()?.captures(value) {
            return Err(EtlError::MissingConfigError {
                field: format!("{} (environment variable {})", field, &caps[1]),
            });
        }
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        let paths = [
            ("input.ids_file", self.input.ids_file.as_str()),
            ("input.query_folder", self.input.query_folder.as_str()),
            ("search.database", self.search.database.as_str()),
            ("output.matrix", self.output.matrix.as_str()),
            ("output.plot", self.output_png()),
        ];
        for (field, value) in paths {
            Self::check_unresolved(field, value)?;
        }
        if let Some(blast_path) = &self.search.blast_path {
            Self::check_unresolved("search.blast_path", blast_path)?;
        }

        validate_existing_file("input.ids_file", &self.input.ids_file)?;
        validate_path("input.query_folder", &self.input.query_folder)?;
        validate_non_empty_string("search.database", &self.search.database)?;
        validate_path("output.matrix", &self.output.matrix)?;
        validate_path("output.plot", self.output_png())?;
        validate_evalue("search.evalue", self.evalue())?;
        validate_positive_number(
            "search.num_iterations",
            self.num_iterations() as usize,
            1,
        )?;
        validate_positive_number("output.histogram_bins", self.histogram_bins(), 1)?;

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn run_name(&self) -> &str {
        self.run.name.as_deref().unwrap_or("blast-etl")
    }
}

impl ConfigProvider for TomlConfig {
    fn ids_file(&self) -> &str {
        &self.input.ids_file
    }

    fn query_folder(&self) -> &str {
        &self.input.query_folder
    }

    fn database(&self) -> &str {
        &self.search.database
    }

    fn program(&self) -> SearchProgram {
        self.search.program
    }

    fn evalue(&self) -> f64 {
        self.search.evalue.unwrap_or(DEFAULT_EVALUE)
    }

    fn num_iterations(&self) -> u32 {
        self.search.num_iterations.unwrap_or(DEFAULT_NUM_ITERATIONS)
    }

    fn blast_path(&self) -> Option<&str> {
        self.search.blast_path.as_deref()
    }

    fn output_file(&self) -> &str {
        &self.output.matrix
    }

    fn output_png(&self) -> &str {
        self.output.plot.as_deref().unwrap_or(DEFAULT_PLOT_FILE)
    }

    fn summary_path(&self) -> Option<&str> {
        self.output.summary.as_deref()
    }

    fn histogram_bins(&self) -> usize {
        self.output.histogram_bins.unwrap_or(DEFAULT_HISTOGRAM_BINS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
