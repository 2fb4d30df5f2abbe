use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::DomainError;

/// 正規化済みISBN。ウィッシュリストと所蔵レコードを結び付けるキー。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// 生の値を正規化する。
    ///
    /// 空白区切りで複数並んでいる場合は先頭（電子版ISBN）を採用し、
    /// ハイフンを除去して末尾の `x` を大文字にする。
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let first = raw.split_whitespace().next().unwrap_or("");
        let normalized: String = first
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if Self::is_valid_shape(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(DomainError::InvalidIsbn(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid_shape(s: &str) -> bool {
        let bytes = s.as_bytes();
        match bytes.len() {
            13 => bytes.iter().all(u8::is_ascii_digit),
            10 => {
                let (body, check) = bytes.split_at(9);
                body.iter().all(u8::is_ascii_digit)
                    && (check[0].is_ascii_digit() || check[0] == b'X')
            }
            _ => false,
        }
    }
}

impl TryFrom<String> for Isbn {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
