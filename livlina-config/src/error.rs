//! Failures while assembling a [`LivlinaConfig`](crate::LivlinaConfig).

use std::borrow::Cow;
use std::fmt::Write;
use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist. The default files are
    /// optional and never produce this.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The merged document parsed but some values are out of range.
    #[error("Invalid livlina configuration:\n{}", describe(.0))]
    Validation(#[source] ValidationErrors),

    /// A credential needed by the live channel was never provided.
    #[error("Missing configuration value: {0}")]
    MissingField(&'static str),

    /// A layer could not be read or did not match the expected shape.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),

    #[error("Configuration rendering error: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

/// One `section.field: reason` line per failed check, sorted by path.
fn describe(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect(errors, "", &mut lines);
    lines.sort();

    let mut output = String::new();
    for line in lines {
        let _ = writeln!(output, "  {line}");
    }
    output
}

fn collect(errors: &ValidationErrors, prefix: &str, lines: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = join(prefix, field);
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let reason = failure
                        .message
                        .clone()
                        .unwrap_or_else(|| failure.code.clone());
                    lines.push(format!("{path}: {reason}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, lines),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), lines);
                }
            }
        }
    }
}

fn join(prefix: &str, field: &Cow<'static, str>) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;
    use crate::LivlinaConfig;

    #[test]
    fn nested_failures_name_their_section() {
        let mut config = LivlinaConfig::default();
        config.resolver.timeout_ms = 5;
        config.channel.recipient = Some("not a chat".into());

        let message = ConfigError::from(config.validate().unwrap_err()).to_string();
        assert!(message.starts_with("Invalid livlina configuration:"));
        assert!(message.contains("channel.recipient: "));
        assert!(message.contains("resolver.timeout_ms: range"));
    }

    #[test]
    fn inverted_eta_window_is_reported_by_path() {
        let mut config = LivlinaConfig::default();
        config.intake.eta.min_minutes = 30;
        config.intake.eta.max_minutes = 10;

        let message = ConfigError::from(config.validate().unwrap_err()).to_string();
        assert!(message.contains("intake.eta: eta_min_exceeds_max"));
    }
}
