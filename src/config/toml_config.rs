use crate::core::leak::LeakAssumptions;
use crate::domain::model::Business;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub google: Option<GoogleConfig>,
    pub supabase: Option<SupabaseConfig>,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub assumptions: LeakAssumptions,
    #[serde(default)]
    pub businesses: Vec<Business>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            concurrent_requests: 4,
            user_agent: crate::adapters::http::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_output_formats")]
    pub formats: Vec<String>,
    #[serde(default)]
    pub compress: bool,
}

fn default_output_formats() -> Vec<String> {
    vec!["json".to_string(), "csv".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub min_confidence: f32,
    pub max_handle_guesses: usize,
    pub search_enabled: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.35,
            max_handle_guesses: 4,
            search_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    #[serde(default = "default_supabase_table")]
    pub table: String,
}

fn default_supabase_table() -> String {
    "leads".to_string()
}

/// 各來源的基底網址，測試時指向 mock server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub instagram_web: String,
    pub instagram_api: String,
    pub google_search: String,
    pub google_places: String,
    pub booking: String,
    pub duckduckgo: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            instagram_web: "https://www.instagram.com".to_string(),
            instagram_api: "https://i.instagram.com".to_string(),
            google_search: "https://www.google.com".to_string(),
            google_places: "https://maps.googleapis.com".to_string(),
            booking: "https://www.booking.com".to_string(),
            duckduckgo: "https://html.duckduckgo.com".to_string(),
        }
    }
}

impl Endpoints {
    /// 所有來源指向同一個基底網址
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            instagram_web: base.clone(),
            instagram_api: base.clone(),
            google_search: base.clone(),
            google_places: base.clone(),
            booking: base.clone(),
            duckduckgo: base,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LeadError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_KEY})；找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("engine.name", &self.engine.name)?;
        validation::validate_positive_number(
            "http.concurrent_requests",
            self.http.concurrent_requests,
            1,
        )?;
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 120)?;
        validation::validate_path("output.path", &self.output.path)?;

        if self.output.formats.is_empty() {
            return Err(LeadError::ConfigValidationError {
                field: "output.formats".to_string(),
                message: "At least one output format is required".to_string(),
            });
        }

        let valid_formats = ["json", "csv"];
        for (index, format) in self.output.formats.iter().enumerate() {
            if self.output.formats[..index].contains(format) {
                return Err(LeadError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: format.clone(),
                    reason: "Duplicate format".to_string(),
                });
            }
            if !valid_formats.contains(&format.as_str()) {
                return Err(LeadError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        validation::validate_range(
            "discovery.min_confidence",
            self.discovery.min_confidence,
            0.0,
            1.0,
        )?;
        self.assumptions.validate()?;

        if let Some(supabase) = &self.supabase {
            validation::validate_url("supabase.url", &supabase.url)?;
            validation::validate_non_empty_string("supabase.table", &supabase.table)?;
            if !is_resolved(&supabase.key) {
                return Err(LeadError::MissingConfigError {
                    field: "supabase.key".to_string(),
                });
            }
        }

        for (index, business) in self.businesses.iter().enumerate() {
            let field = |name: &str| format!("businesses[{}].{}", index, name);
            validation::validate_non_empty_string(&field("name"), &business.name)?;
            validation::validate_non_empty_string(&field("city"), &business.city)?;
            for (name, value) in [
                ("website", &business.website),
                ("tripadvisor_url", &business.tripadvisor_url),
                ("booking_url", &business.booking_url),
            ] {
                if let Some(url) = value {
                    validation::validate_url(&field(name), url)?;
                }
            }
        }

        Ok(())
    }

    /// 未設定或環境變數未替換時回傳 None
    pub fn google_api_key(&self) -> Option<&str> {
        self.google
            .as_ref()
            .and_then(|g| g.api_key.as_deref())
            .filter(|key| is_resolved(key))
    }

    pub fn supabase(&self) -> Option<&SupabaseConfig> {
        self.supabase.as_ref()
    }
}

fn is_resolved(value: &str) -> bool {
    !value.trim().is_empty() && !ENV_VAR_RE.is_match(value)
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn compress_output(&self) -> bool {
        self.output.compress
    }

    fn concurrent_requests(&self) -> usize {
        self.http.concurrent_requests
    }

    fn businesses(&self) -> &[Business] {
        &self.businesses
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
