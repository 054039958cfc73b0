/// Compressor parameter resolution
///
/// Parameters come from four places, highest priority first:
/// command line > JSON `compression` section > adaptive values derived from analysis
/// metadata > built-in defaults.
use crate::error::{MasterError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use soul_core::SampleRate;
use soul_dynamics::CompressorConfig;
use std::path::Path;

pub const DEFAULT_RATIO: f64 = 3.0;
pub const DEFAULT_THRESHOLD_DB: f64 = -20.0;
pub const DEFAULT_ATTACK_MS: f64 = 5.0;
pub const DEFAULT_RELEASE_MS: f64 = 50.0;
pub const DEFAULT_KNEE_DB: f64 = 3.0;

/// Bandwidth above which fast attack/release is chosen
const WIDE_BANDWIDTH_HZ: f64 = 8000.0;
/// Compressor threshold sits this far above the noise gate
const GATE_TO_THRESHOLD_DB: f64 = 10.0;

/// Analysis report as written by an upstream analysis step
///
/// Only the sections used here are modelled; everything else in the file is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub compression: Option<CompressionSection>,

    #[serde(default)]
    pub voice_enhancement: Option<VoiceEnhancementSection>,

    #[serde(default)]
    pub noise_reduction: Option<NoiseReductionSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CompressionSection {
    pub ratio: Option<f64>,
    pub threshold: Option<f64>,
    pub attack: Option<f64>,
    pub release: Option<f64>,
    /// Free text, e.g. "Large dynamic range (30.6 dB)"
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VoiceEnhancementSection {
    /// Free text, e.g. "Wide bandwidth (9755 Hz)"
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NoiseReductionSection {
    pub gate_threshold: Option<f64>,
}

impl AnalysisConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MasterError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;

        if config.compression.is_none() {
            tracing::warn!(path = %path.display(), "'compression' section not found in config");
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn compression(&self) -> CompressionSection {
        self.compression.clone().unwrap_or_default()
    }
}

/// Numbers pulled out of an analysis report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AudioMetadata {
    pub dynamic_range_db: Option<f64>,
    pub bandwidth_hz: Option<f64>,
    pub gate_threshold_db: Option<f64>,
}

impl AudioMetadata {
    pub fn is_empty(&self) -> bool {
        self.dynamic_range_db.is_none()
            && self.bandwidth_hz.is_none()
            && self.gate_threshold_db.is_none()
    }
}

/// Extract dynamic range, bandwidth and gate threshold from an analysis report
pub fn extract_metadata(config: &AnalysisConfig) -> Result<AudioMetadata> {
    let dynamic_range_db = match config.compression.as_ref().and_then(|c| c.reason.as_deref()) {
        Some(reason) => capture_number(r"(\d+\.?\d*)\s*dB", reason)?,
        None => None,
    };

    let bandwidth_hz = match config
        .voice_enhancement
        .as_ref()
        .and_then(|v| v.reason.as_deref())
    {
        Some(reason) => capture_number(r"(\d+)\s*Hz", reason)?,
        None => None,
    };

    let gate_threshold_db = config
        .noise_reduction
        .as_ref()
        .and_then(|n| n.gate_threshold);

    Ok(AudioMetadata {
        dynamic_range_db,
        bandwidth_hz,
        gate_threshold_db,
    })
}

/// First capture group of `pattern` in `text`, parsed as a number
fn capture_number(pattern: &str, text: &str) -> Result<Option<f64>> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok()))
}

/// Parameters suggested by analysis metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AdaptiveParameters {
    pub ratio: Option<f64>,
    pub threshold_db: Option<f64>,
    pub attack_ms: Option<f64>,
    pub release_ms: Option<f64>,
}

/// Derive compressor settings from metadata
///
/// - dynamic range > 25 dB: 4:1, > 15 dB: 3:1, otherwise 2:1
/// - threshold 10 dB above the noise gate
/// - bandwidth > 8 kHz: fast 3/40 ms, otherwise 7/60 ms attack/release
pub fn adaptive_parameters(metadata: &AudioMetadata) -> AdaptiveParameters {
    let ratio = metadata.dynamic_range_db.map(|dr| {
        if dr > 25.0 {
            4.0
        } else if dr > 15.0 {
            3.0
        } else {
            2.0
        }
    });

    let threshold_db = metadata
        .gate_threshold_db
        .map(|gate| gate + GATE_TO_THRESHOLD_DB);

    let (attack_ms, release_ms) = match metadata.bandwidth_hz {
        Some(bw) if bw > WIDE_BANDWIDTH_HZ => (Some(3.0), Some(40.0)),
        Some(_) => (Some(7.0), Some(60.0)),
        None => (None, None),
    };

    AdaptiveParameters {
        ratio,
        threshold_db,
        attack_ms,
        release_ms,
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterOverrides {
    pub ratio: Option<f64>,
    pub threshold_db: Option<f64>,
    pub attack_ms: Option<f64>,
    pub release_ms: Option<f64>,
    pub knee_db: Option<f64>,
}

/// Where a resolved parameter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Cli,
    Config,
    Adaptive,
    Default,
}

impl ParameterSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Adaptive => "adaptive",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Parameter {
    pub value: f64,
    pub source: ParameterSource,
}

fn pick(cli: Option<f64>, config: Option<f64>, adaptive: Option<f64>, default: f64) -> Parameter {
    let (value, source) = cli
        .map(|v| (v, ParameterSource::Cli))
        .or_else(|| config.map(|v| (v, ParameterSource::Config)))
        .or_else(|| adaptive.map(|v| (v, ParameterSource::Adaptive)))
        .unwrap_or((default, ParameterSource::Default));
    Parameter { value, source }
}

/// Final compressor settings with their provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedParameters {
    pub ratio: Parameter,
    pub threshold_db: Parameter,
    pub attack_ms: Parameter,
    pub release_ms: Parameter,
    pub knee_db: Parameter,
}

impl ResolvedParameters {
    /// Resolve every parameter by priority
    pub fn resolve(overrides: &ParameterOverrides, analysis: Option<&AnalysisConfig>) -> Result<Self> {
        let (section, adaptive) = match analysis {
            Some(config) => {
                let metadata = extract_metadata(config)?;
                let adaptive = adaptive_parameters(&metadata);
                tracing::debug!(?metadata, ?adaptive, "adaptive parameters");
                (config.compression(), adaptive)
            }
            None => (CompressionSection::default(), AdaptiveParameters::default()),
        };

        Ok(Self {
            ratio: pick(overrides.ratio, section.ratio, adaptive.ratio, DEFAULT_RATIO),
            threshold_db: pick(
                overrides.threshold_db,
                section.threshold,
                adaptive.threshold_db,
                DEFAULT_THRESHOLD_DB,
            ),
            attack_ms: pick(overrides.attack_ms, section.attack, adaptive.attack_ms, DEFAULT_ATTACK_MS),
            release_ms: pick(
                overrides.release_ms,
                section.release,
                adaptive.release_ms,
                DEFAULT_RELEASE_MS,
            ),
            knee_db: pick(overrides.knee_db, None, None, DEFAULT_KNEE_DB),
        })
    }

    /// Compressor configuration for a given sample rate (validated by `Compressor::new`)
    pub fn compressor_config(&self, sample_rate: SampleRate) -> CompressorConfig {
        CompressorConfig::new(sample_rate)
            .with_ratio(self.ratio.value)
            .with_threshold(self.threshold_db.value)
            .with_attack(self.attack_ms.value)
            .with_release(self.release_ms.value)
            .with_knee(self.knee_db.value)
    }
}

impl Default for ResolvedParameters {
    fn default() -> Self {
        let default = |value| Parameter {
            value,
            source: ParameterSource::Default,
        };
        Self {
            ratio: default(DEFAULT_RATIO),
            threshold_db: default(DEFAULT_THRESHOLD_DB),
            attack_ms: default(DEFAULT_ATTACK_MS),
            release_ms: default(DEFAULT_RELEASE_MS),
            knee_db: default(DEFAULT_KNEE_DB),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "compression": { "reason": "Large dynamic range (30.6 dB)", "recommended": true },
        "voice_enhancement": { "reason": "Wide bandwidth (9755 Hz)" },
        "noise_reduction": { "gate_threshold": -45.0 },
        "unrelated": [1, 2, 3]
    }"#;

    #[test]
    fn unknown_keys_are_ignored() {
        let config = AnalysisConfig::from_json(REPORT).unwrap();
        assert!(config.compression.is_some());
        assert_eq!(config.noise_reduction.unwrap().gate_threshold, Some(-45.0));
    }

    #[test]
    fn metadata_is_extracted_from_reasons() {
        let config = AnalysisConfig::from_json(REPORT).unwrap();
        let metadata = extract_metadata(&config).unwrap();

        assert_eq!(metadata.dynamic_range_db, Some(30.6));
        assert_eq!(metadata.bandwidth_hz, Some(9755.0));
        assert_eq!(metadata.gate_threshold_db, Some(-45.0));
    }

    #[test]
    fn reasons_without_numbers_yield_nothing() {
        let config = AnalysisConfig::from_json(
            r#"{ "compression": { "reason": "sounds fine" }, "voice_enhancement": {} }"#,
        )
        .unwrap();
        assert!(extract_metadata(&config).unwrap().is_empty());
    }

    #[test]
    fn ratio_follows_dynamic_range() {
        let ratio_for = |dr| {
            adaptive_parameters(&AudioMetadata {
                dynamic_range_db: Some(dr),
                ..Default::default()
            })
            .ratio
        };
        assert_eq!(ratio_for(30.0), Some(4.0));
        assert_eq!(ratio_for(25.0), Some(3.0));
        assert_eq!(ratio_for(20.0), Some(3.0));
        assert_eq!(ratio_for(15.0), Some(2.0));
    }

    #[test]
    fn timing_follows_bandwidth() {
        let wide = adaptive_parameters(&AudioMetadata {
            bandwidth_hz: Some(9755.0),
            ..Default::default()
        });
        assert_eq!((wide.attack_ms, wide.release_ms), (Some(3.0), Some(40.0)));

        let narrow = adaptive_parameters(&AudioMetadata {
            bandwidth_hz: Some(8000.0),
            ..Default::default()
        });
        assert_eq!((narrow.attack_ms, narrow.release_ms), (Some(7.0), Some(60.0)));
    }

    #[test]
    fn threshold_sits_above_gate() {
        let adaptive = adaptive_parameters(&AudioMetadata {
            gate_threshold_db: Some(-45.0),
            ..Default::default()
        });
        assert_eq!(adaptive.threshold_db, Some(-35.0));
    }

    #[test]
    fn priority_is_cli_then_config_then_adaptive_then_default() {
        let config = AnalysisConfig::from_json(
            r#"{
                "compression": { "ratio": 6, "reason": "Large dynamic range (30.6 dB)" },
                "voice_enhancement": { "reason": "Wide bandwidth (9755 Hz)" }
            }"#,
        )
        .unwrap();
        let overrides = ParameterOverrides {
            attack_ms: Some(1.0),
            ..Default::default()
        };

        let resolved = ResolvedParameters::resolve(&overrides, Some(&config)).unwrap();
        assert_eq!(resolved.attack_ms.value, 1.0);
        assert_eq!(resolved.attack_ms.source, ParameterSource::Cli);
        assert_eq!(resolved.ratio.value, 6.0);
        assert_eq!(resolved.ratio.source, ParameterSource::Config);
        assert_eq!(resolved.release_ms.value, 40.0);
        assert_eq!(resolved.release_ms.source, ParameterSource::Adaptive);
        assert_eq!(resolved.threshold_db.value, DEFAULT_THRESHOLD_DB);
        assert_eq!(resolved.threshold_db.source, ParameterSource::Default);
        assert_eq!(resolved.knee_db.source, ParameterSource::Default);
    }

    #[test]
    fn no_config_means_defaults() {
        let resolved = ResolvedParameters::resolve(&ParameterOverrides::default(), None).unwrap();
        assert_eq!(resolved, ResolvedParameters::default());

        let compressor = resolved.compressor_config(SampleRate::CD_QUALITY);
        assert_eq!(compressor.ratio, DEFAULT_RATIO);
        assert_eq!(compressor.knee_db, DEFAULT_KNEE_DB);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            AnalysisConfig::from_json("{ not json"),
            Err(MasterError::Json(_))
        ));
    }
}
