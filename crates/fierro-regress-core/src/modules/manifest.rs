use crate::domain::{
    DEFAULT_OUTPUT_RELATIVE_PATH, FieldCheck, RegressError, Scenario, sgh_input_deck,
    sgh_reference_result,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioManifest {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(rename = "defaultFields", default)]
    pub default_fields: Vec<FieldCheck>,
    #[serde(default)]
    pub scenarios: Vec<ManifestScenario>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestScenario {
    pub name: String,
    #[serde(rename = "inputDeck", default)]
    pub input_deck: Option<PathBuf>,
    #[serde(rename = "referenceResult", default)]
    pub reference_result: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub fields: Option<Vec<FieldCheck>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read scenario manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scenario manifest '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid scenario manifest: {0}")]
    Invalid(String),
    #[error("invalid scenario pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("no scenarios match the requested pattern(s): {}", patterns.join(", "))]
    NoMatch { patterns: Vec<String> },
}

impl From<ManifestError> for RegressError {
    fn from(error: ManifestError) -> Self {
        let message = error.to_string();
        match error {
            ManifestError::Read { .. } => RegressError::io_system("IO.MANIFEST", message),
            ManifestError::Parse { .. } | ManifestError::Invalid(_) => {
                RegressError::input_validation("INPUT.MANIFEST", message)
            }
            ManifestError::InvalidPattern { .. } | ManifestError::NoMatch { .. } => {
                RegressError::input_validation("INPUT.SCENARIO_FILTER", message)
            }
        }
    }
}

impl ScenarioManifest {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_with_origin(&content, path)
    }

    pub fn from_json(manifest_json: &str) -> Result<Self, ManifestError> {
        Self::from_json_with_origin(manifest_json, Path::new("<inline-manifest>"))
    }

    fn from_json_with_origin(content: &str, origin: &Path) -> Result<Self, ManifestError> {
        let manifest: Self =
            serde_json::from_str(content).map_err(|source| ManifestError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ManifestError::Invalid(format!(
                    "threshold must be a positive finite percent, got {}",
                    threshold
                )));
            }
        }

        let names = self
            .scenarios
            .iter()
            .map(|scenario| scenario.name.as_str())
            .collect::<Vec<_>>();
        validate_scenario_names(names).map_err(ManifestError::Invalid)?;

        for check in &self.default_fields {
            check
                .validate()
                .map_err(|message| ManifestError::Invalid(format!("defaultFields: {}", message)))?;
        }
        for scenario in &self.scenarios {
            for check in scenario.fields.iter().flatten() {
                check.validate().map_err(|message| {
                    ManifestError::Invalid(format!("scenario '{}': {}", scenario.name, message))
                })?;
            }
        }
        Ok(())
    }

    /// Scenarios in declared order, with unspecified paths filled in from the
    /// SGH layout and unspecified fields from `defaultFields`.
    pub fn scenarios(&self) -> Vec<Scenario> {
        let default_fields = if self.default_fields.is_empty() {
            vec![FieldCheck::positions()]
        } else {
            self.default_fields.clone()
        };

        self.scenarios
            .iter()
            .map(|entry| Scenario {
                name: entry.name.clone(),
                input_deck: entry
                    .input_deck
                    .clone()
                    .unwrap_or_else(|| sgh_input_deck(&entry.name)),
                reference_path: entry
                    .reference_result
                    .clone()
                    .unwrap_or_else(|| sgh_reference_result(&entry.name)),
                output_path: entry
                    .output
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_RELATIVE_PATH)),
                fields: entry
                    .fields
                    .clone()
                    .filter(|fields| !fields.is_empty())
                    .unwrap_or_else(|| default_fields.clone()),
            })
            .collect()
    }
}

/// Names must be non-empty and unique; they key reports and filters.
pub fn validate_scenario_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err("scenario names must not be empty".to_string());
        }
        if !seen.insert(name) {
            return Err(format!("duplicate scenario name '{}'", name));
        }
    }
    Ok(())
}

/// Keeps the scenarios whose names match any of `patterns`, preserving
/// declared order. No patterns selects everything.
pub fn select_scenarios(
    scenarios: Vec<Scenario>,
    patterns: &[String],
) -> Result<Vec<Scenario>, ManifestError> {
    if patterns.is_empty() {
        return Ok(scenarios);
    }

    let matcher = compile_patterns(patterns)?;
    let selected = scenarios
        .into_iter()
        .filter(|scenario| matcher.is_match(&scenario.name))
        .collect::<Vec<_>>();

    if selected.is_empty() {
        return Err(ManifestError::NoMatch {
            patterns: patterns.to_vec(),
        });
    }
    Ok(selected)
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, ManifestError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ManifestError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| ManifestError::InvalidPattern {
            pattern: patterns.join(","),
            source,
        })
}
