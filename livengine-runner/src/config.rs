//! Parameter files: YAML, JSON or TOML into one validated run configuration.
//!
//! Files are parsed into a generic JSON document first, then each recognized
//! key is looked up under its canonical name and its legacy aliases across
//! the sections a parameter file may use:
//!
//! ```yaml
//! strategy:            # optional section; flat top-level keys also work
//!   name: imm_core
//!   lookback_fast: 12
//! entropy:             # legacy block
//!   P_threshold: 0.02
//!   NP_threshold: 0.025
//!   CollapseThreshold: 0.03
//! signals:
//!   EmaFast: 12
//!   EmaSlow: 48
//! logging:
//!   EnableProofBridge: true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use livengine_core::{ParamsBuilder, ParamsError, StrategyKind, StrategyParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read parameter file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported parameter file type '{0}' (expected .yaml, .yml, .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("parameter document must be a mapping at the top level")]
    NotAMapping,

    #[error("'{key}' must be a string, got {value}")]
    NotAString { key: String, value: String },

    #[error("'{key}' must be a boolean, got {value}")]
    NotABool { key: String, value: String },

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("failed to hash parameters: {0}")]
    Hash(#[source] serde_json::Error),
}

/// Supported parameter file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsFormat {
    Yaml,
    Json,
    Toml,
}

impl ParamsFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ParamsFormat::Yaml),
            Some("json") => Ok(ParamsFormat::Json),
            Some("toml") => Ok(ParamsFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Where proof and blotter artifacts go, relative to the run directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub enable_proof_bridge: bool,
    pub blotter_file: String,
    pub proof_ledger_file: String,
    pub proof_capsule_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_proof_bridge: true,
            blotter_file: "trades.csv".into(),
            proof_ledger_file: "proof_ledger.csv".into(),
            proof_capsule_file: "capsules.jsonl".into(),
        }
    }
}

/// Everything a parameter file can set for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunConfig {
    pub params: StrategyParams,
    pub resample: Option<String>,
    pub logging: LoggingConfig,
}

/// Read, parse and resolve a parameter file.
pub fn load_run_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let format = ParamsFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_document(&text, format, path)?;
    resolve_run_config(&doc)
}

/// Parse text into a generic document. An empty YAML file is an empty mapping.
pub fn parse_document(text: &str, format: ParamsFormat, path: &Path) -> Result<Value, ConfigError> {
    let doc = match format {
        ParamsFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?;
            serde_json::to_value(yaml_non_finite_as_text(yaml)).map_err(|source| {
                ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
        ParamsFormat::Json => serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        ParamsFormat::Toml => {
            let table: toml::Value = toml::from_str(text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_value(toml_non_finite_as_text(table)).map_err(|source| {
                ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
    };

    match doc {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(doc),
        _ => Err(ConfigError::NotAMapping),
    }
}

// JSON has no NaN or infinity: converting would turn `.nan`/`inf` into null
// and the key would silently fall back to its default. Carry them as text so
// they reach validation and fail there.

fn yaml_non_finite_as_text(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Yaml::String(f.to_string()),
            _ => Yaml::Number(n),
        },
        Yaml::Sequence(items) => {
            Yaml::Sequence(items.into_iter().map(yaml_non_finite_as_text).collect())
        }
        Yaml::Mapping(map) => Yaml::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, yaml_non_finite_as_text(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_non_finite_as_text(tagged.value),
        other => other,
    }
}

fn toml_non_finite_as_text(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Float(f) if !f.is_finite() => toml::Value::String(f.to_string()),
        toml::Value::Array(items) => {
            toml::Value::Array(items.into_iter().map(toml_non_finite_as_text).collect())
        }
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_non_finite_as_text(v)))
                .collect(),
        ),
        other => other,
    }
}

// ─── Key resolution ─────────────────────────────────────────────────

/// Sections searched for a key, in priority order.
fn sections(doc: &Value) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    if let Some(section) = doc.get("strategy").and_then(Value::as_object) {
        out.push(section);
    }
    if let Some(root) = doc.as_object() {
        out.push(root);
    }
    for name in ["params", "entropy", "signals"] {
        if let Some(section) = doc.get(name).and_then(Value::as_object) {
            out.push(section);
        }
    }
    out
}

/// First non-null value for any of `names`, with the name that matched.
fn lookup<'a>(doc: &'a Value, names: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    sections(doc).into_iter().find_map(|section| {
        names
            .iter()
            .find_map(|&name| section.get(name).filter(|v| !v.is_null()).map(|v| (name, v)))
    })
}

fn as_number(key: &str, value: &Value) -> Result<f64, ParamsError> {
    let not_numeric = || ParamsError::NotNumeric {
        key: key.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
        _ => Err(not_numeric()),
    }
}

fn number(doc: &Value, names: &[&'static str]) -> Result<Option<f64>, ParamsError> {
    lookup(doc, names)
        .map(|(key, value)| as_number(key, value))
        .transpose()
}

fn integer(doc: &Value, names: &[&'static str], max: f64) -> Result<Option<u64>, ParamsError> {
    let Some((key, value)) = lookup(doc, names) else {
        return Ok(None);
    };
    let n = as_number(key, value)?;
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > max {
        return Err(ParamsError::NotInteger {
            key: key.to_string(),
            value: n,
        });
    }
    Ok(Some(n as u64))
}

fn window(doc: &Value, names: &[&'static str]) -> Result<Option<usize>, ParamsError> {
    Ok(integer(doc, names, u32::MAX as f64)?.map(|n| n as usize))
}

fn string<'a>(key: &str, value: &'a Value) -> Result<&'a str, ConfigError> {
    value.as_str().ok_or_else(|| ConfigError::NotAString {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn strategy_kind(doc: &Value) -> Result<Option<StrategyKind>, ConfigError> {
    let named = match doc.get("strategy") {
        Some(Value::String(name)) => Some(name.as_str()),
        Some(Value::Object(section)) => match section.get("name").or_else(|| section.get("kind")) {
            Some(v) => Some(string("strategy.name", v)?),
            None => None,
        },
        _ => None,
    };
    Ok(named.map(StrategyKind::parse).transpose()?)
}

/// Build the parameter set from a parsed document.
pub fn resolve_params(doc: &Value) -> Result<StrategyParams, ConfigError> {
    let builder = ParamsBuilder {
        strategy: strategy_kind(doc)?,
        lookback_fast: window(doc, &["lookback_fast", "EmaFast", "ema_fast"])?,
        lookback_slow: window(doc, &["lookback_slow", "EmaSlow", "ema_slow"])?,
        atr_period: window(doc, &["atr_period"])?,
        entropy_window: window(doc, &["entropy_window"])?,
        entropy_threshold: number(doc, &["entropy_threshold", "P_threshold"])?,
        np_threshold: number(doc, &["np_threshold", "NP_threshold"])?,
        entropy_exit: number(doc, &["entropy_exit", "CollapseThreshold"])?,
        recovery_window: integer(doc, &["recovery_window"], u32::MAX as f64)?.map(|n| n as u32),
        ma_buffer: number(doc, &["ma_buffer"])?,
        unit_size: number(doc, &["unit_size"])?,
        starting_cash: number(doc, &["starting_cash"])?,
    };
    Ok(builder.build()?)
}

fn logging_config(doc: &Value) -> Result<LoggingConfig, ConfigError> {
    let mut cfg = LoggingConfig::default();
    let Some(section) = doc.get("logging").and_then(Value::as_object) else {
        return Ok(cfg);
    };

    if let Some(v) = section.get("EnableProofBridge").filter(|v| !v.is_null()) {
        cfg.enable_proof_bridge = match v {
            Value::Bool(b) => *b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
            other => {
                return Err(ConfigError::NotABool {
                    key: "logging.EnableProofBridge".into(),
                    value: other.to_string(),
                })
            }
        };
    }
    for (key, slot) in [
        ("BlotterFile", &mut cfg.blotter_file),
        ("ProofLedgerFile", &mut cfg.proof_ledger_file),
        ("ProofCapsuleFile", &mut cfg.proof_capsule_file),
    ] {
        if let Some(v) = section.get(key).filter(|v| !v.is_null()) {
            *slot = string(key, v)?.to_string();
        }
    }
    Ok(cfg)
}

/// Resolve params, resample rule and logging options.
pub fn resolve_run_config(doc: &Value) -> Result<RunConfig, ConfigError> {
    let resample = match lookup(doc, &["resample"]) {
        Some((key, v)) => Some(string(key, v)?.trim().to_string()).filter(|s| !s.is_empty()),
        None => None,
    };
    Ok(RunConfig {
        params: resolve_params(doc)?,
        resample,
        logging: logging_config(doc)?,
    })
}

/// Deterministic BLAKE3 hash of the resolved parameters (hex).
pub fn params_hash(params: &StrategyParams) -> Result<String, ConfigError> {
    let json = serde_json::to_string(params).map_err(ConfigError::Hash)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
