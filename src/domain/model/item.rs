use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::isbn::Isbn;
use crate::domain::error::DomainError;

/// ウィッシュリスト上の並び順キー。`"3"` や `"2/7"` のような `/` 区切りの整数列。
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey(Vec<u32>);

impl SortKey {
    pub fn new(parts: Vec<u32>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('/')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| DomainError::InvalidSortKey(s.to_string()))
    }
}

impl TryFrom<String> for SortKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "{joined}")
    }
}

/// ウィッシュリストの1項目。Catalogが所有する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    isbn: Isbn,
    title: String,
    author: Option<String>,
    format: Option<String>,
    shop_url: Option<String>,
    sort_key: SortKey,
}

impl WishlistItem {
    pub fn new(isbn: Isbn, title: impl Into<String>, sort_key: SortKey) -> Self {
        Self {
            isbn,
            title: title.into(),
            author: None,
            format: None,
            shop_url: None,
            sort_key,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_shop_url(mut self, url: impl Into<String>) -> Self {
        self.shop_url = Some(url.into());
        self
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn shop_url(&self) -> Option<&str> {
        self.shop_url.as_deref()
    }

    pub fn sort_key(&self) -> &SortKey {
        &self.sort_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_compares_numerically() {
        let a: SortKey = "2".parse().unwrap();
        let b: SortKey = "10".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn sort_key_compares_segments() {
        let a: SortKey = "1/9".parse().unwrap();
        let b: SortKey = "1/10".parse().unwrap();
        let c: SortKey = "2".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn sort_key_rejects_non_numeric() {
        assert!("a/1".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn sort_key_display_roundtrip() {
        let key: SortKey = "3/1".parse().unwrap();
        assert_eq!(key.to_string(), "3/1");
    }

    #[test]
    fn builder_sets_optional_fields() {
        let item = WishlistItem::new(
            Isbn::parse("9780446573016").unwrap(),
            "Becoming a Manager",
            SortKey::new(vec![1]),
        )
        .with_author("Linda A. Hill")
        .with_format("Paperback");

        assert_eq!(item.author(), Some("Linda A. Hill"));
        assert_eq!(item.format(), Some("Paperback"));
        assert!(item.shop_url().is_none());
    }
}
