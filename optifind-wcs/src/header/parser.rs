use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::str;

use crate::error::{WcsError, WcsResult};
use crate::header::{Keyword, KeywordValue};

pub const CARD_SIZE: usize = 80;
pub const HEADER_BLOCK_SIZE: usize = 2880;

#[derive(Debug, Clone, Default)]
pub struct Header {
    keywords: Vec<Keyword>,
    keyword_index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: Option<String>,
    pub comment: Option<String>,
}

pub struct HeaderParser;

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword. For repeated names the first occurrence stays indexed,
    /// except for commentary cards which are never indexed.
    pub fn add_keyword(&mut self, keyword: Keyword) {
        let index = self.keywords.len();
        if !keyword.is_commentary() {
            self.keyword_index
                .entry(keyword.name.clone())
                .or_insert(index);
        }
        self.keywords.push(keyword);
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keyword_index
            .get(name)
            .and_then(|&index| self.keywords.get(index))
    }

    pub fn get_keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.get_keyword(name)?.value.as_ref()
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn is_primary(&self) -> bool {
        self.get_keyword_value("SIMPLE")
            .and_then(|v| v.as_logical())
            .unwrap_or(false)
    }
}

impl HeaderCard {
    pub fn parse(data: &[u8; CARD_SIZE]) -> WcsResult<Self> {
        if !data.is_ascii() {
            return Err(WcsError::invalid_header("Non-ASCII byte in header card"));
        }
        let card_str = str::from_utf8(data)
            .map_err(|_| WcsError::invalid_header("Invalid text in header card"))?;

        let mut card = HeaderCard {
            keyword: card_str[0..8].trim().to_string(),
            value: None,
            comment: None,
        };

        if &card_str[8..10] == "= " {
            Self::parse_value_field(&card_str[10..], &mut card);
        } else {
            let text = card_str[8..].trim();
            if !text.is_empty() {
                card.comment = Some(text.to_string());
            }
        }
        Ok(card)
    }

    fn parse_value_field(field: &str, card: &mut HeaderCard) {
        let trimmed = field.trim_start();
        let (value, rest) = if trimmed.starts_with('\'') {
            split_quoted(trimmed)
        } else {
            match trimmed.find('/') {
                Some(pos) => (trimmed[..pos].trim_end(), &trimmed[pos..]),
                None => (trimmed.trim_end(), ""),
            }
        };

        if !value.is_empty() {
            card.value = Some(value.to_string());
        }
        let comment = rest.trim_start().trim_start_matches('/').trim();
        if !comment.is_empty() {
            card.comment = Some(comment.to_string());
        }
    }

    pub fn to_keyword(&self) -> Keyword {
        let mut keyword = Keyword::new(self.keyword.clone());
        if let Some(comment) = &self.comment {
            keyword = keyword.with_comment(comment.clone());
        }
        if let Some(value_str) = &self.value {
            keyword = keyword.with_value(Self::parse_value(value_str));
        }
        keyword
    }

    fn parse_value(value_str: &str) -> KeywordValue {
        let trimmed = value_str.trim();

        if trimmed == "T" {
            return KeywordValue::Logical(true);
        }
        if trimmed == "F" {
            return KeywordValue::Logical(false);
        }

        if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
            let content = trimmed[1..trimmed.len() - 1].replace("''", "'");
            return KeywordValue::String(content.trim_end().to_string());
        }

        if let Ok(int_val) = trimmed.parse::<i64>() {
            return KeywordValue::Integer(int_val);
        }

        // Fortran-style exponents ("1.0D+09") are legal in FITS.
        if let Ok(float_val) = trimmed.replace(['D', 'd'], "E").parse::<f64>() {
            return KeywordValue::Real(float_val);
        }

        KeywordValue::String(trimmed.to_string())
    }
}

/// Splits a quoted string value from whatever follows its closing quote.
/// Doubled quotes inside the string are an escaped quote.
fn split_quoted(field: &str) -> (&str, &str) {
    let bytes = field.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return (&field[..=i], &field[i + 1..]);
        }
        i += 1;
    }
    (field.trim_end(), "")
}

impl HeaderParser {
    pub fn parse_header(data: &[u8]) -> WcsResult<Header> {
        if !data.len().is_multiple_of(HEADER_BLOCK_SIZE) {
            return Err(WcsError::invalid_header(
                "Header size must be multiple of 2880 bytes",
            ));
        }

        let mut header = Header::new();
        for chunk in data.chunks_exact(CARD_SIZE) {
            if Self::push_card(&mut header, chunk)? {
                return Ok(header);
            }
        }
        Err(WcsError::invalid_header("Missing END keyword"))
    }

    /// Reads header blocks from the start of a stream until the END card.
    pub fn read_header<R: Read>(reader: &mut R) -> WcsResult<Header> {
        let mut header = Header::new();
        let mut block = [0u8; HEADER_BLOCK_SIZE];

        loop {
            reader.read_exact(&mut block).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => {
                    WcsError::invalid_header("Truncated header block before END keyword")
                }
                _ => WcsError::Io(e),
            })?;

            for chunk in block.chunks_exact(CARD_SIZE) {
                if Self::push_card(&mut header, chunk)? {
                    return Ok(header);
                }
            }
        }
    }

    pub fn read_primary_header(path: impl AsRef<Path>) -> WcsResult<Header> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let header = Self::read_header(&mut reader)?;
        if !header.is_primary() {
            return Err(WcsError::invalid_header(
                "First header is not a primary HDU (SIMPLE = T missing)",
            ));
        }
        Ok(header)
    }

    /// Returns true once the END card has been seen.
    fn push_card(header: &mut Header, chunk: &[u8]) -> WcsResult<bool> {
        let mut card_data = [0u8; CARD_SIZE];
        card_data.copy_from_slice(chunk);
        let card = HeaderCard::parse(&card_data)?;
        if card.keyword == "END" {
            return Ok(true);
        }
        header.add_keyword(card.to_keyword());
        Ok(false)
    }
}
