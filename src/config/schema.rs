use crate::capability::{AssetKind, Capability, CapabilityRegistry};
use crate::document::LineEnding;
use crate::format::FormattingOptions;
use crate::inject::DEFAULT_MODULE_PREFIX;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct InjectorConfig {
    #[serde(default)]
    pub format: FormatSection,
    #[serde(default)]
    pub imports: ImportSection,
    #[serde(default)]
    pub capabilities: Vec<CapabilityDefinition>,
}

impl InjectorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.format.insert_spaces && self.format.tab_size == 0 {
            issues.push(ValidationIssue::InvalidValue {
                capability: None,
                field: "format.tab_size",
                message: "must be at least 1 when insert_spaces is set".to_string(),
            });
        }

        if self.imports.module_prefix.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                capability: None,
                field: "imports.module_prefix",
            });
        }

        let mut seen = HashSet::new();
        for definition in &self.capabilities {
            if definition.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    capability: None,
                    field: "name",
                });
                continue;
            }
            if !is_identifier(&definition.name) {
                issues.push(ValidationIssue::InvalidValue {
                    capability: Some(definition.name.clone()),
                    field: "name",
                    message: "must be a valid identifier".to_string(),
                });
            }
            if let Some(symbol) = &definition.symbol {
                if !is_identifier(symbol) {
                    issues.push(ValidationIssue::InvalidValue {
                        capability: Some(definition.name.clone()),
                        field: "symbol",
                        message: format!("'{symbol}' is not a valid identifier"),
                    });
                }
            }
            if let Some(follow_up) = &definition.follow_up {
                if follow_up.trim().is_empty() || follow_up.contains('\n') {
                    issues.push(ValidationIssue::InvalidValue {
                        capability: Some(definition.name.clone()),
                        field: "follow_up",
                        message: "must be a single non-empty line".to_string(),
                    });
                }
            }
            if !seen.insert(definition.name.as_str()) {
                issues.push(ValidationIssue::Duplicate {
                    capability: definition.name.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Built-in registry with this config's definitions layered on top.
    pub fn registry(&self) -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::builtin();
        for definition in &self.capabilities {
            registry.register(definition.to_capability());
        }
        registry
    }

    pub fn formatting(&self) -> FormattingOptions {
        FormattingOptions {
            tab_size: self.format.tab_size,
            insert_spaces: self.format.insert_spaces,
            line_ending: self.format.line_ending.resolve(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FormatSection {
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,
    #[serde(default)]
    pub insert_spaces: bool,
    #[serde(default)]
    pub line_ending: LineEndingSetting,
}

impl Default for FormatSection {
    fn default() -> Self {
        Self {
            tab_size: default_tab_size(),
            insert_spaces: false,
            line_ending: LineEndingSetting::Auto,
        }
    }
}

fn default_tab_size() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LineEndingSetting {
    /// Follow the document
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl LineEndingSetting {
    pub fn resolve(self) -> Option<LineEnding> {
        match self {
            LineEndingSetting::Auto => None,
            LineEndingSetting::Lf => Some(LineEnding::Lf),
            LineEndingSetting::Crlf => Some(LineEnding::CrLf),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportSection {
    #[serde(default = "default_module_prefix")]
    pub module_prefix: String,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            module_prefix: default_module_prefix(),
        }
    }
}

fn default_module_prefix() -> String {
    DEFAULT_MODULE_PREFIX.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CapabilityDefinition {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub instantiate: bool,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub asset: Option<AssetKind>,
}

impl CapabilityDefinition {
    pub fn to_capability(&self) -> Capability {
        Capability {
            name: self.name.clone(),
            symbol: self.symbol.clone().unwrap_or_else(|| self.name.clone()),
            instantiate: self.instantiate,
            follow_up: self.follow_up.clone(),
            asset: self.asset,
        }
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        capability: Option<String>,
        field: &'static str,
    },
    InvalidValue {
        capability: Option<String>,
        field: &'static str,
        message: String,
    },
    Duplicate {
        capability: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { capability, field } => match capability {
                Some(name) => write!(f, "capability '{name}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidValue {
                capability,
                field,
                message,
            } => match capability {
                Some(name) => write!(f, "capability '{name}' has invalid '{field}': {message}"),
                None => write!(f, "invalid '{field}': {message}"),
            },
            ValidationIssue::Duplicate { capability } => {
                write!(f, "capability '{capability}' is defined more than once")
            }
        }
    }
}
