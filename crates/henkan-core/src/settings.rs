//! Conversion tunables.
//!
//! The defaults in `default_settings.toml` are compiled in. A host may swap
//! in its own TOML once with [`init_custom`], before the first call to
//! [`settings`] freezes the active values for the rest of the process.

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Install a custom settings TOML. Fails if it does not validate or if
/// settings were already installed.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Active settings: the custom TOML if one was installed, else the defaults.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub lattice: LatticeSettings,
    pub wordlist: WordListSettings,
    pub metaword: MetaWordSettings,
    pub candidates: CandidateSettings,
    pub learning: LearningSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatticeSettings {
    pub node_max_size: usize,
    pub poisson_lambda: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordListSettings {
    pub max_search_len: usize,
    pub high_freq_threshold: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaWordSettings {
    pub single_char_divisor: i64,
    pub mixed_wrap_divisor: i64,
    pub ochaire_score: i64,
}

/// Base scores per candidate generation method.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSettings {
    pub ochaire_score: i64,
    pub singleword_score: i64,
    pub compound_score: i64,
    pub compound_part_score: i64,
    pub best_score: i64,
    pub noconv_score: i64,
    pub uncertain_bias: i64,
}

/// Caps for the learning record sections.
#[derive(Debug, Clone, Deserialize)]
pub struct LearningSettings {
    pub max_indep_pairs: usize,
    pub max_expand_pairs: usize,
    pub max_ochaire_entries: usize,
    pub max_ochaire_len: usize,
    pub history_depth: usize,
    pub max_history_entries: usize,
    pub max_predictions: usize,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field <= 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive_usize!(lattice.node_max_size);
    if s.lattice.poisson_lambda <= 0.0 {
        return Err(SettingsError::InvalidValue {
            field: "lattice.poisson_lambda".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    check_positive_usize!(wordlist.max_search_len);
    check_positive!(wordlist.high_freq_threshold);

    check_positive!(metaword.single_char_divisor);
    check_positive!(metaword.mixed_wrap_divisor);
    check_positive!(metaword.ochaire_score);

    check_positive!(candidates.ochaire_score);
    check_positive!(candidates.singleword_score);
    check_positive!(candidates.compound_score);
    check_positive!(candidates.compound_part_score);
    check_positive!(candidates.best_score);
    check_positive!(candidates.noconv_score);
    check_positive!(candidates.uncertain_bias);

    check_positive_usize!(learning.max_indep_pairs);
    check_positive_usize!(learning.max_expand_pairs);
    check_positive_usize!(learning.max_ochaire_entries);
    check_positive_usize!(learning.max_ochaire_len);
    check_positive_usize!(learning.max_history_entries);
    check_positive_usize!(learning.max_predictions);
    // Depth 1 would make the most-recent weight depth/2 == 0.
    if s.learning.history_depth < 2 {
        return Err(SettingsError::InvalidValue {
            field: "learning.history_depth".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert_eq!(s.lattice.node_max_size, 50);
        assert!((s.lattice.poisson_lambda - 20.0).abs() < f64::EPSILON);
        assert_eq!(s.wordlist.max_search_len, 30);
        assert_eq!(s.wordlist.high_freq_threshold, 784);
        assert_eq!(s.metaword.single_char_divisor, 10);
        assert_eq!(s.candidates.uncertain_bias, 900_000);
        assert_eq!(s.candidates.ochaire_score, 5_000_000);
        assert_eq!(s.learning.max_indep_pairs, 100);
        assert_eq!(s.learning.max_expand_pairs, 1000);
        assert_eq!(s.learning.max_ochaire_len, 32);
        assert_eq!(s.learning.history_depth, 8);
        assert_eq!(s.learning.max_predictions, 100);
    }

    #[test]
    fn error_zero_node_max_size() {
        let toml = DEFAULT_SETTINGS_TOML.replace("node_max_size = 50", "node_max_size = 0");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert!(err.to_string().contains("lattice.node_max_size"));
    }

    #[test]
    fn error_negative_bias() {
        let toml = DEFAULT_SETTINGS_TOML.replace("uncertain_bias = 900000", "uncertain_bias = -1");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("candidates.uncertain_bias"));
    }

    #[test]
    fn error_shallow_history() {
        let toml = DEFAULT_SETTINGS_TOML.replace("history_depth = 8", "history_depth = 1");
        let err = parse_settings_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("learning.history_depth"));
    }

    #[test]
    fn error_missing_section() {
        let err = parse_settings_toml("[lattice]\nnode_max_size = 50\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
