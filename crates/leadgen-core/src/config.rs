use crate::app_config::{AppConfig, FeatureStrategy, Language, SmtpConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive them with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("LEADGEN_LOG_LEVEL", "info");
    let model_path = PathBuf::from(or_default(
        "LEADGEN_MODEL_PATH",
        "./models/lead_model.json",
    ));

    let feature_strategy = parse_feature_strategy(&or_default(
        "LEADGEN_FEATURE_STRATEGY",
        "handcrafted",
    ))?;
    let language = parse_language(&or_default("LEADGEN_LANGUAGE", "english"))?;

    let max_vocabulary = parse_usize("LEADGEN_MAX_VOCABULARY", "1000")?;
    if max_vocabulary == 0 {
        return Err(invalid(
            "LEADGEN_MAX_VOCABULARY",
            "must be greater than zero".to_string(),
        ));
    }

    let decision_threshold = parse_f64("LEADGEN_DECISION_THRESHOLD", "0.5")?;
    if !(0.0..=1.0).contains(&decision_threshold) {
        return Err(invalid(
            "LEADGEN_DECISION_THRESHOLD",
            format!("{decision_threshold} is outside 0.0..=1.0"),
        ));
    }

    let alert_threshold = parse_alert_threshold(&or_default("LEADGEN_ALERT_THRESHOLD", "80"))?;

    let high_intent_sources: Vec<String> =
        or_default("LEADGEN_HIGH_INTENT_SOURCES", "contact_form")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

    let behavior_threshold = parse_f64("LEADGEN_BEHAVIOR_THRESHOLD", "0")?;

    let db_max_connections = parse_u32("LEADGEN_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("LEADGEN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let smtp = match lookup("LEADGEN_SMTP_HOST") {
        Ok(host) if !host.trim().is_empty() => {
            let port = or_default("LEADGEN_SMTP_PORT", "587")
                .parse::<u16>()
                .map_err(|e| invalid("LEADGEN_SMTP_PORT", e.to_string()))?;
            Some(SmtpConfig {
                host,
                port,
                username: require("LEADGEN_SMTP_USERNAME")?,
                password: require("LEADGEN_SMTP_PASSWORD")?,
                from: require("LEADGEN_ALERT_FROM")?,
                to: require("LEADGEN_ALERT_TO")?,
            })
        }
        _ => None,
    };

    Ok(AppConfig {
        database_url,
        log_level,
        model_path,
        feature_strategy,
        language,
        max_vocabulary,
        decision_threshold,
        alert_threshold,
        high_intent_sources,
        behavior_threshold,
        db_max_connections,
        db_acquire_timeout_secs,
        smtp,
    })
}

fn parse_feature_strategy(s: &str) -> Result<FeatureStrategy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "handcrafted" => Ok(FeatureStrategy::Handcrafted),
        "lexical" => Ok(FeatureStrategy::Lexical),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADGEN_FEATURE_STRATEGY".to_string(),
            reason: format!("unknown strategy '{other}'; expected handcrafted or lexical"),
        }),
    }
}

fn parse_language(s: &str) -> Result<Language, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "english" | "en" => Ok(Language::English),
        "spanish" | "es" => Ok(Language::Spanish),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LEADGEN_LANGUAGE".to_string(),
            reason: format!("unsupported language '{other}'"),
        }),
    }
}

fn parse_alert_threshold(s: &str) -> Result<u8, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "LEADGEN_ALERT_THRESHOLD".to_string(),
        reason,
    };
    let value = s.trim().parse::<u8>().map_err(|e| invalid(e.to_string()))?;
    if value > 100 {
        return Err(invalid(format!("{value} is outside 0..=100")));
    }
    Ok(value)
}
