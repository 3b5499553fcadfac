//! Option table model for optbind.
//!
//! A table lists the options a command recognizes plus how many positional
//! arguments it accepts. Tables are plain data: build them in code with the
//! builder methods, or decode them from JSON.
//!
//! ```json
//! {
//!   "positional-capacity": 2,
//!   "options": [
//!     { "name": "verbose", "short": "v", "long": "verbose" },
//!     { "name": "output", "short": "o", "arity": 1 }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One recognized option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionDef {
    /// Identifier used to look the option up after resolution.
    pub name: String,
    /// Matched against a single character of a `-x` token or cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Matched in full against the text after `--`. No abbreviations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    /// Number of argument values consumed each time the option is matched.
    #[serde(default)]
    pub arity: usize,
}

impl OptionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    /// Whether `c` selects this option inside a short token.
    pub fn matches_short(&self, c: char) -> bool {
        self.short == Some(c)
    }

    /// Whether `name` (the text after `--`) selects this option.
    pub fn matches_long(&self, name: &str) -> bool {
        self.long.as_deref() == Some(name)
    }
}

/// Ordered list of options, searched front to back; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionTable {
    /// Maximum number of positional (non-option) tokens accepted.
    #[serde(default)]
    pub positional_capacity: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("option `{0}` has an empty long name and can never match")]
    EmptyLongName(String),
    #[error("option `{0}` has neither a short nor a long name")]
    Unreachable(String),
    #[error("option name `{0}` is defined more than once")]
    DuplicateName(String),
    #[error("invalid option table: {0}")]
    Json(#[from] serde_json::Error),
}

impl OptionTable {
    /// Create an empty table accepting up to `positional_capacity` positional tokens.
    pub fn new(positional_capacity: usize) -> Self {
        Self {
            positional_capacity,
            options: Vec::new(),
        }
    }

    /// Append an option; it is searched after every option already present.
    pub fn option(mut self, def: OptionDef) -> Self {
        self.options.push(def);
        self
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Index of the first option called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|d| d.name == name)
    }

    /// First option selected by the short character `c`.
    pub fn find_short(&self, c: char) -> Option<(usize, &OptionDef)> {
        self.options.iter().enumerate().find(|(_, d)| d.matches_short(c))
    }

    /// First option selected by the long name `name`.
    pub fn find_long(&self, name: &str) -> Option<(usize, &OptionDef)> {
        self.options
            .iter()
            .enumerate()
            .find(|(_, d)| d.matches_long(name))
    }

    /// Report definitions that can never match or that hide each other by name.
    ///
    /// Two options sharing a short or long flag is allowed: the earlier one
    /// shadows the later one.
    pub fn validate(&self) -> Result<(), TableError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for def in &self.options {
            if !seen.insert(def.name.as_str()) {
                return Err(TableError::DuplicateName(def.name.clone()));
            }
            if def.long.as_deref() == Some("") {
                return Err(TableError::EmptyLongName(def.name.clone()));
            }
            if def.short.is_none() && def.long.is_none() {
                return Err(TableError::Unreachable(def.name.clone()));
            }
        }
        Ok(())
    }

    /// Decode a table from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as JSON bytes.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OptionTable {
        OptionTable::new(2)
            .option(OptionDef::new("verbose").short('v').long("verbose"))
            .option(OptionDef::new("output").short('o').arity(1))
    }

    #[test]
    fn json_uses_kebab_case_and_defaults() {
        let json = r#"{
            "positional-capacity": 2,
            "options": [
                { "name": "verbose", "short": "v", "long": "verbose" },
                { "name": "output", "short": "o", "arity": 1 }
            ]
        }"#;
        let table = OptionTable::from_json_str(json).unwrap();
        assert_eq!(table, sample());
    }

    #[test]
    fn json_encoding_omits_absent_names() {
        let bytes = sample().to_json_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let output = &value["options"][1];
        assert_eq!(output["short"], "o");
        assert!(output.get("long").is_none());
        assert_eq!(value["positional-capacity"], 2);
    }

    #[test]
    fn rejects_multi_char_short_name() {
        let json = r#"{ "options": [ { "name": "x", "short": "xy" } ] }"#;
        let err = OptionTable::from_json_str(json).unwrap_err();
        assert!(matches!(err, TableError::Json(_)), "got: {err:?}");
    }

    #[test]
    fn find_prefers_earlier_entries() {
        let table = OptionTable::new(0)
            .option(OptionDef::new("first").short('a').long("all"))
            .option(OptionDef::new("second").short('a').long("all"));
        assert_eq!(table.find_short('a').map(|(i, _)| i), Some(0));
        assert_eq!(table.find_long("all").map(|(_, d)| d.name.as_str()), Some("first"));
        assert!(table.find_long("al").is_none());
        assert!(table.validate().is_ok());
    }

    #[test]
    fn validate_reports_unmatchable_definitions() {
        let table = OptionTable::new(0).option(OptionDef::new("ghost"));
        assert!(matches!(table.validate(), Err(TableError::Unreachable(n)) if n == "ghost"));

        let table = OptionTable::new(0).option(OptionDef::new("blank").long(""));
        assert!(matches!(table.validate(), Err(TableError::EmptyLongName(n)) if n == "blank"));

        let table = sample().option(OptionDef::new("verbose").short('V'));
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"), "got: {err}");
    }
}
