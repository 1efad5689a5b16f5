use inspection_model::{LabelRecord, PLACEHOLDER_LABEL_VALUE};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a sample's labels were not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Label count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("Label {name} is not configured")]
    Unconfigured { name: String },
    #[error("Label {name} is missing or empty")]
    MissingValue { name: String },
}

/// Resolve the configured labels of a metric against the raw labels of one sample.
///
/// `aliases` maps raw label name to display alias. Labels come out in the iteration order of
/// `aliases`. A configured label that is absent or empty on the sample rejects the whole sample.
pub fn reconcile_labels(
    aliases: &BTreeMap<String, String>,
    raw: &BTreeMap<String, String>,
) -> Result<Vec<LabelRecord>, ValidationError> {
    let labels = aliases
        .iter()
        .map(|(name, alias)| {
            let value = match raw.get(name) {
                Some(value) if !value.is_empty() => value.clone(),
                _ => {
                    log::debug!("Label [{name}] is missing or empty on sample {raw:?}");
                    PLACEHOLDER_LABEL_VALUE.to_string()
                }
            };

            LabelRecord {
                name: name.clone(),
                alias: alias.clone(),
                value,
            }
        })
        .collect::<Vec<_>>();

    validate_labels(aliases, &labels)?;

    Ok(labels)
}

/// Check resolved labels against the configured aliases.
///
/// Accepts exactly when there is one label per configured alias, every label is configured and no
/// value is empty or the placeholder.
pub fn validate_labels(
    aliases: &BTreeMap<String, String>,
    labels: &[LabelRecord],
) -> Result<(), ValidationError> {
    if labels.len() != aliases.len() {
        return Err(ValidationError::CountMismatch {
            expected: aliases.len(),
            actual: labels.len(),
        });
    }

    for label in labels {
        if !aliases.contains_key(&label.name) {
            return Err(ValidationError::Unconfigured {
                name: label.name.clone(),
            });
        }
        if label.value.is_empty() || label.value == PLACEHOLDER_LABEL_VALUE {
            return Err(ValidationError::MissingValue {
                name: label.name.clone(),
            });
        }
    }

    Ok(())
}
