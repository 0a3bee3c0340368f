mod keywords;
mod parser;
mod provider;

pub use keywords::{Keyword, KeywordValue};
pub use parser::{Header, HeaderCard, HeaderParser, CARD_SIZE, HEADER_BLOCK_SIZE};
pub use provider::{KeywordMap, KeywordProvider};

#[cfg(test)]
pub(crate) use parser::tests::header_bytes;
