use std::collections::BTreeMap;

use litprog_parser::RawOption;

use crate::error::DirectiveError;

/// How a directive option's value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    /// Presence only; any value is an error.
    Flag,
    /// Required free text.
    Text,
    /// Required non-negative integer.
    Unsigned,
    /// Non-negative integer that may also be given bare.
    OptionalUnsigned,
}

/// Set of options a directive recognises.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionSpec {
    entries: BTreeMap<&'static str, OptionKind>,
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, kind: OptionKind) -> Self {
        self.entries.insert(name, kind);
        self
    }

    pub fn kind(&self, name: &str) -> Option<OptionKind> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Flag,
    Text(String),
    Number(Option<usize>),
}

/// Validated options of one directive occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectiveOptions {
    values: BTreeMap<String, OptionValue>,
}

impl DirectiveOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<usize> {
        match self.values.get(name) {
            Some(OptionValue::Number(number)) => *number,
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Check raw option lines against `spec`.
pub fn parse_options(
    directive: &str,
    spec: &OptionSpec,
    raw: &[RawOption],
) -> Result<DirectiveOptions, DirectiveError> {
    let mut values = BTreeMap::new();

    for option in raw {
        let Some(kind) = spec.kind(&option.name) else {
            return Err(DirectiveError::UnknownOption {
                directive: directive.to_string(),
                option: option.name.clone(),
            });
        };

        if values.contains_key(&option.name) {
            return Err(DirectiveError::DuplicateOption {
                option: option.name.clone(),
            });
        }

        let value = match (kind, option.value.as_deref()) {
            (OptionKind::Flag, None) => OptionValue::Flag,
            (OptionKind::Flag, Some(_)) => {
                return Err(DirectiveError::UnexpectedValue {
                    option: option.name.clone(),
                })
            }
            (OptionKind::Text, Some(text)) => OptionValue::Text(text.to_string()),
            (OptionKind::Text, None) | (OptionKind::Unsigned, None) => {
                return Err(DirectiveError::MissingValue {
                    option: option.name.clone(),
                })
            }
            (OptionKind::Unsigned, Some(text)) | (OptionKind::OptionalUnsigned, Some(text)) => {
                let number = text
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| DirectiveError::InvalidInteger {
                        option: option.name.clone(),
                        value: text.to_string(),
                    })?;
                OptionValue::Number(Some(number))
            }
            (OptionKind::OptionalUnsigned, None) => OptionValue::Number(None),
        };

        values.insert(option.name.clone(), value);
    }

    Ok(DirectiveOptions { values })
}
