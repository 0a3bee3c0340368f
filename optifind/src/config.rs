use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{OptifindError, Result};

/// Flat `key = value` parameter set, kept in file order.
///
/// Repeated keys keep the position of their first occurrence and the value
/// of their last. The template is never changed in place; per-run copies
/// are made with [`Configuration::with_override`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Configuration {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|_| {
            OptifindError::config_parse(format!(
                "Failed to read parameter file: {}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = match value.split_once('#') {
                Some((before, _)) => before,
                None => value,
            };
            config.insert(key.trim(), value.trim());
        }

        if config.is_empty() {
            return Err(OptifindError::config_parse(
                "No valid parameter settings found.",
            ));
        }
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy with `key` set to `value`. Existing keys stay where they are,
    /// new keys go to the end.
    pub fn with_override(&self, key: &str, value: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.insert(key, value);
        copy
    }

    /// Serialises as `key\t=\tvalue` lines, the layout SoFiA 2 reads.
    pub fn to_parameter_file_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.iter() {
            let _ = writeln!(out, "{}\t=\t{}", key, value);
        }
        out
    }

    fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
            }
        }
    }
}
