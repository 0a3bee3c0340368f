use std::collections::HashMap;

use crate::error::{WcsError, WcsResult};
use crate::header::Header;

pub trait KeywordProvider {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_float(&self, key: &str) -> Option<f64>;
    fn get_int(&self, key: &str) -> Option<i64>;

    fn require_float(&self, key: &str) -> WcsResult<f64> {
        self.get_float(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }

    fn require_string(&self, key: &str) -> WcsResult<String> {
        self.get_string(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }

    fn require_int(&self, key: &str) -> WcsResult<i64> {
        self.get_int(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }
}

impl KeywordProvider for Header {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_keyword_value(key)?
            .as_string()
            .map(|s| s.to_string())
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get_keyword_value(key)?.as_real()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get_keyword_value(key)?.as_integer()
    }
}

/// In-memory keyword source, handy for building cube descriptions by hand.
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    strings: HashMap<String, String>,
    floats: HashMap<String, f64>,
    ints: HashMap<String, i64>,
}

impl KeywordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.strings.insert(key.into(), value.into());
        self
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.floats.insert(key.into(), value);
        self
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.ints.insert(key.into(), value);
        self
    }
}

impl KeywordProvider for KeywordMap {
    fn get_string(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.floats
            .get(key)
            .copied()
            .or_else(|| self.ints.get(key).map(|&i| i as f64))
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.get(key).copied()
    }
}
