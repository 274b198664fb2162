//! Configuration management for the risk service

use crate::error::StartupError;
use crate::web::layout::{FieldConfig, GroupConfig, LayoutKind, WidgetConfig};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "DELIRIUM_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub model: ModelInfoConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
        }
    }
}

/// Model and config artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// ONNX export of the classifier
    pub model_path: PathBuf,
    /// JSON with `optimal_threshold` and `selected_features`
    pub config_path: PathBuf,
    /// File name offered when downloading the model
    pub model_download_name: String,
    /// File name offered when downloading the config
    pub config_download_name: String,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifacts/shap_simplified_model.onnx"),
            config_path: PathBuf::from("artifacts/shap_simplified_model_threshold.json"),
            model_download_name: "delirium_prediction_model.onnx".to_string(),
            config_download_name: "model_config.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// Descriptive model information shown in the sidebar
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelInfoConfig {
    pub algorithm: String,
}

impl Default for ModelInfoConfig {
    fn default() -> Self {
        Self {
            algorithm: "CatBoost (SHAP Simplified)".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "delirium_risk=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Page copy and form layout.
///
/// The flat layout ignores `groups` and derives one field per model feature.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub layout: LayoutKind,
    pub page_title: String,
    pub title: String,
    pub subtitle: String,
    pub instructions: Vec<String>,
    pub groups: Vec<GroupConfig>,
    /// List every model feature in the sidebar
    pub show_feature_list: bool,
    pub development_notes: String,
    pub team: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Grouped,
            page_title: "ICU Delirium Prediction Tool".to_string(),
            title: "Delirium Prediction Tool for Sepsis Patients in ICU".to_string(),
            subtitle: "ICU脓毒症患者谵妄预测工具".to_string(),
            instructions: vec![
                "Please enter the patient information below. The system will predict the probability of delirium occurring within 7 days after ICU admission for sepsis patients based on the externally validated SHAP interpretable model.".to_string(),
                "All measured variables should use average values from the first 24 hours after ICU admission (except GCS which uses the lowest value within the first 24 hours).".to_string(),
                "请输入以下的患者信息，系统将基于经外部验证的SHAP可解释性模型预测ICU脓毒症患者在ICU入科7天内发生谵妄的概率。以下所有需测量的变量均需使用入ICU后第1天内的平均值数据（GCS为取入ICU1天内最低值）。".to_string(),
            ],
            groups: default_groups(),
            show_feature_list: false,
            development_notes: "This tool was developed based on MIMIC database (version 3.1) research data, using SHAP feature selection to identify the 14 most important predictors from 51 engineered features, and externally validated using eICU-CRD (version 2.0) data.".to_string(),
            team: vec![
                "Principal Investigator & Data Analyst: Dr. Jianyuan Liu".to_string(),
                "Clinical Consultant: Prof. Shubin Guo".to_string(),
            ],
        }
    }
}

fn number(default: f64, min: Option<f64>, max: Option<f64>, step: f64) -> WidgetConfig {
    WidgetConfig::Number {
        default,
        min,
        max,
        step,
    }
}

fn field(feature: &str, label: &str, widget: WidgetConfig) -> FieldConfig {
    FieldConfig {
        feature: feature.to_string(),
        label: label.to_string(),
        widget,
    }
}

/// Grouped layout for the 14-feature SHAP simplified model
fn default_groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig {
            title: "Basic Information / 基础情况".to_string(),
            fields: vec![
                field("admission_age", "Age / 年龄 (years)", number(60.0, Some(0.0), Some(120.0), 0.1)),
                field("hypertension", "Hypertension / 高血压", WidgetConfig::Flag { default: 0 }),
            ],
        },
        GroupConfig {
            title: "Bedside Signs / 床旁体征".to_string(),
            fields: vec![
                field("sbp", "Systolic Blood Pressure (SBP) / 收缩压 (mmHg)", number(120.0, Some(0.0), Some(300.0), 0.1)),
                field("spo2", "Oxygen Saturation (SpO₂) / 血氧饱和度 (%)", number(98.0, Some(0.0), Some(100.0), 0.1)),
                field("temperature", "Temperature / 体温 (℃)", number(36.5, Some(30.0), Some(45.0), 0.1)),
                field("urineoutput_24h", "24-hour Urine Output / 24小时内尿量 (ml)", number(1000.0, Some(0.0), None, 0.1)),
            ],
        },
        GroupConfig {
            title: "Laboratory Tests / 实验室检查".to_string(),
            fields: vec![
                field("platelet", "Platelet Count / 血小板计数 (K/μL)", number(200.0, Some(0.0), None, 0.1)),
                field("creatinine", "Serum Creatinine / 血清肌酐 (mg/dL, 1mg/dL=88.4μmol/L)", number(0.8, Some(0.0), None, 0.1)),
                field("potassium", "Potassium Concentration / 钾离子浓度 (mmol/L)", number(4.0, Some(0.0), None, 0.1)),
                field("hemoglobin", "Hemoglobin / 血红蛋白 (g/dL)", number(12.0, Some(0.0), None, 0.1)),
            ],
        },
        GroupConfig {
            title: "Clinical Scores / 临床评分".to_string(),
            fields: vec![
                field("charlson_comorbidity_index", "Charlson Comorbidity Index / Charlson共病指数", WidgetConfig::Integer { default: 0, min: Some(0) }),
                field("gcs_min", "Glasgow Coma Scale (GCS) Min / 最低格拉斯哥昏迷评分", WidgetConfig::Slider { min: 3, max: 15, default: 15 }),
                field("apsiii", "Acute Physiology Score III (APS III) / 急性生理评分III", number(30.0, Some(0.0), None, 1.0)),
                field("oasis", "Oxford Acute Disease Severity Score (OASIS) / 牛津急性疾病严重程度评分", number(30.0, Some(0.0), None, 1.0)),
            ],
        },
    ]
}

/// `DELIRIUM_SECTION__KEY` overrides, e.g. `DELIRIUM_SERVER__PORT=9000`
fn environment() -> Environment {
    Environment::with_prefix("DELIRIUM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::build(File::from(Path::new(&path)).required(false), environment())
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true), environment())
    }

    fn build(
        file: File<config::FileSourceFile, config::FileFormat>,
        env: Environment,
    ) -> Result<Self> {
        let config = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.artifacts.onnx_threads == 0 {
            return Err(StartupError::Settings(
                "artifacts.onnx_threads must be at least 1".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(StartupError::Settings(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            )));
        }

        self.listen_addr()?;
        Ok(())
    }

    /// Socket address the server binds to
    pub fn listen_addr(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                StartupError::Settings(format!(
                    "invalid listen address {}:{}: {}",
                    self.server.host, self.server.port, e
                ))
            })
    }
}
