use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            comment: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<KeywordValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Commentary cards carry free text instead of a value.
    pub fn is_commentary(&self) -> bool {
        matches!(self.name.as_str(), "COMMENT" | "HISTORY" | "") && self.value.is_none()
    }
}

impl KeywordValue {
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for KeywordValue {
    fn from(value: bool) -> Self {
        Self::Logical(value)
    }
}

impl From<i64> for KeywordValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for KeywordValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for KeywordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for KeywordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_accessor_widens_integers() {
        assert_eq!(KeywordValue::Integer(64).as_real(), Some(64.0));
        assert_eq!(KeywordValue::Real(1.5).as_real(), Some(1.5));
        assert_eq!(KeywordValue::String("1.5".into()).as_real(), None);
    }

    #[test]
    fn integer_accessor_rejects_reals() {
        assert_eq!(KeywordValue::Real(3.0).as_integer(), None);
        assert_eq!(KeywordValue::Integer(3).as_integer(), Some(3));
    }

    #[test]
    fn display_matches_fits_notation() {
        assert_eq!(KeywordValue::Logical(true).to_string(), "T");
        assert_eq!(KeywordValue::Logical(false).to_string(), "F");
        assert_eq!(KeywordValue::String("FREQ".into()).to_string(), "'FREQ'");
    }

    #[test]
    fn commentary_detection() {
        assert!(Keyword::new("HISTORY").with_comment("reduced").is_commentary());
        assert!(!Keyword::new("NAXIS").with_value(3i64).is_commentary());
    }
}
