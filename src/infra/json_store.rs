use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::error::DomainError;
use crate::domain::model::holding::{AvailabilityRecord, NewHolding};
use crate::domain::model::isbn::Isbn;
use crate::domain::model::item::{SortKey, WishlistItem};
use crate::domain::model::preferences::BranchPreferences;
use crate::domain::normalize;
use crate::domain::repository::{CatalogSource, PreferencesRepository};

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}: expected a JSON array", .0.display())]
    NotAnArray(PathBuf),
}

// =============================================================================
// Wire format — 取得処理が書き出すJSON
// =============================================================================

/// 文字列でも数値でも来る値
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireScalar {
    Number(u64),
    Text(String),
}

impl WireScalar {
    fn as_text(&self) -> String {
        match self {
            WireScalar::Number(n) => n.to_string(),
            WireScalar::Text(s) => s.clone(),
        }
    }

    fn as_count(&self) -> Option<u32> {
        match self {
            WireScalar::Number(n) => u32::try_from(*n).ok(),
            WireScalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// 真偽値か状態表記（"Available" など）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireFlag {
    Bool(bool),
    Text(String),
}

impl WireFlag {
    fn is_available(&self) -> bool {
        match self {
            WireFlag::Bool(b) => *b,
            WireFlag::Text(s) => normalize::parse_availability(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireItem {
    isbn: Option<String>,
    title: Option<String>,
    #[serde(alias = "author")]
    by: Option<String>,
    format: Option<String>,
    #[serde(alias = "shop_url")]
    amazon_url: Option<String>,
    sort_key: Option<WireScalar>,
}

impl WireItem {
    /// `position` は並び順キーが無い時の代わり（1始まり）。
    fn into_item(self, position: usize) -> Result<WishlistItem, DomainError> {
        let isbn = Isbn::parse(self.isbn.as_deref().unwrap_or(""))?;
        let sort_key = match &self.sort_key {
            Some(raw) => raw.as_text().parse::<SortKey>()?,
            None => SortKey::new(vec![u32::try_from(position).unwrap_or(u32::MAX)]),
        };
        let title = non_empty(self.title).unwrap_or_else(|| isbn.to_string());

        let mut item = WishlistItem::new(isbn, title, sort_key);
        if let Some(author) = non_empty(self.by) {
            item = item.with_author(author);
        }
        if let Some(format) = non_empty(self.format) {
            item = item.with_format(format);
        }
        if let Some(url) = non_empty(self.amazon_url) {
            item = item.with_shop_url(url);
        }
        Ok(item)
    }
}

#[derive(Debug, Deserialize)]
struct WireItemRef {
    isbn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireHolding {
    isbn: Option<String>,
    item: Option<WireItemRef>,
    library: String,
    branch: String,
    collection: Option<String>,
    #[serde(alias = "call_number")]
    call_num: Option<String>,
    digital_url: Option<String>,
    catalog_url: Option<String>,
    available: Option<WireFlag>,
    copies: Option<WireScalar>,
    holds: Option<WireScalar>,
}

impl WireHolding {
    fn into_record(self) -> Result<AvailabilityRecord, DomainError> {
        let raw_isbn = self
            .isbn
            .or_else(|| self.item.and_then(|item| item.isbn))
            .unwrap_or_default();

        AvailabilityRecord::new(NewHolding {
            isbn: Isbn::parse(&raw_isbn)?,
            library: self.library,
            branch: self.branch,
            collection: self.collection,
            call_number: self.call_num.as_deref().and_then(normalize::clean_call_number),
            digital_url: non_empty(self.digital_url),
            catalog_url: non_empty(self.catalog_url),
            available: self.available.is_some_and(|flag| flag.is_available()),
            copies: self.copies.and_then(|c| c.as_count()).unwrap_or(1),
            holds: self.holds.and_then(|h| h.as_count()).unwrap_or(0),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// JSON配列を読み、要素ごとに変換する。壊れた要素は警告して飛ばす。
fn load_array<T>(
    path: &Path,
    mut convert: impl FnMut(usize, serde_json::Value) -> Result<T, String>,
) -> Result<Vec<T>, JsonStoreError> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(JsonStoreError::NotAnArray(path.to_path_buf()));
    };

    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match convert(i, entry) {
            Ok(v) => out.push(v),
            Err(reason) => {
                tracing::warn!(file = %path.display(), index = i, %reason, "skipped record");
            }
        }
    }
    Ok(out)
}

// =============================================================================
// CatalogSource
// =============================================================================

/// 取得処理が書き出した2つのJSONファイルによるCatalogSource実装。
pub struct JsonCatalogSource {
    wishlist_path: PathBuf,
    holdings_path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(wishlist_path: impl Into<PathBuf>, holdings_path: impl Into<PathBuf>) -> Self {
        Self {
            wishlist_path: wishlist_path.into(),
            holdings_path: holdings_path.into(),
        }
    }
}

impl CatalogSource for JsonCatalogSource {
    type Error = JsonStoreError;

    fn load_wishlist(&self) -> Result<Vec<WishlistItem>, Self::Error> {
        let items = load_array(&self.wishlist_path, |i, value| {
            let wire: WireItem = serde_json::from_value(value).map_err(|e| e.to_string())?;
            wire.into_item(i + 1).map_err(|e| e.to_string())
        })?;
        tracing::info!(count = items.len(), "loaded wishlist");
        Ok(items)
    }

    fn load_holdings(&self) -> Result<Vec<AvailabilityRecord>, Self::Error> {
        let records = load_array(&self.holdings_path, |_, value| {
            let wire: WireHolding = serde_json::from_value(value).map_err(|e| e.to_string())?;
            wire.into_record().map_err(|e| e.to_string())
        })?;
        tracing::info!(count = records.len(), "loaded holdings");
        Ok(records)
    }
}

// =============================================================================
// PreferencesRepository
// =============================================================================

/// JSONファイルによるPreferencesRepository実装。
pub struct JsonPreferencesRepository {
    path: PathBuf,
}

impl JsonPreferencesRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferencesRepository for JsonPreferencesRepository {
    type Error = JsonStoreError;

    fn load(&self) -> Result<Option<BranchPreferences>, Self::Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let prefs: BranchPreferences = serde_json::from_str(&content)?;
        Ok(Some(prefs))
    }

    fn save(&self, prefs: &BranchPreferences) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(prefs)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::preferences::LibraryPreference;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn wishlist_parses_scraper_output() {
        let dir = tempfile::tempdir().unwrap();
        let wishlist = write(
            dir.path(),
            "wishlist.json",
            r#"[
                {"isbn": "9780446573016 0446573019", "title": "Outliers", "by": "Malcolm Gladwell",
                 "format": "Hardcover", "amazon_url": "https://www.amazon.com/dp/0316017922", "sort_key": "2"},
                {"title": "No ISBN here", "sort_key": "1"},
                {"isbn": "978-1-4000-6757-2", "title": "Second", "sort_key": 7}
            ]"#,
        );
        let source = JsonCatalogSource::new(&wishlist, dir.path().join("missing.json"));

        let items = source.load_wishlist().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].isbn().as_str(), "9780446573016");
        assert_eq!(items[0].author(), Some("Malcolm Gladwell"));
        assert_eq!(items[0].sort_key().to_string(), "2");
        assert_eq!(items[1].isbn().as_str(), "9781400067572");
        assert_eq!(items[1].sort_key().to_string(), "7");
    }

    #[test]
    fn wishlist_skips_non_ascii_isbn() {
        let dir = tempfile::tempdir().unwrap();
        let wishlist = write(
            dir.path(),
            "wishlist.json",
            r#"[
                {"isbn": "12345678é", "title": "Garbled", "sort_key": "1"},
                {"isbn": "9780446573016", "title": "Outliers", "sort_key": "2"}
            ]"#,
        );
        let holdings = write(
            dir.path(),
            "library.json",
            r#"[
                {"isbn": "12345678é", "library": "MBLN", "branch": "BPL - Central", "call_num": "302"},
                {"isbn": "9780446573016", "library": "MBLN", "branch": "BPL - Central", "call_num": "302"}
            ]"#,
        );
        let source = JsonCatalogSource::new(&wishlist, &holdings);

        let items = source.load_wishlist().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title(), "Outliers");

        let records = source.load_holdings().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].isbn().as_str(), "9780446573016");
    }

    #[test]
    fn wishlist_position_is_default_sort_key() {
        let dir = tempfile::tempdir().unwrap();
        let wishlist = write(
            dir.path(),
            "wishlist.json",
            r#"[{"isbn": "9780446573016", "title": "A"}, {"isbn": "9781400067572", "title": "B"}]"#,
        );
        let source = JsonCatalogSource::new(&wishlist, dir.path().join("missing.json"));

        let items = source.load_wishlist().unwrap();
        assert_eq!(items[0].sort_key().parts(), &[1]);
        assert_eq!(items[1].sort_key().parts(), &[2]);
    }

    #[test]
    fn holdings_parse_flags_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let holdings = write(
            dir.path(),
            "library.json",
            r#"[
                {"item": {"isbn": "9780446573016", "title": "Outliers"}, "library": "MBLN",
                 "branch": "BPL - Central", "collection": "Nonfiction",
                 "call_num": "302 GLA", "available": "Available"},
                {"isbn": "9780446573016", "library": "MBLN", "branch": "INTERNET",
                 "collection": "Overdrive", "call_num": "INTERNET",
                 "digital_url": "https://example.org/ebook", "available": true,
                 "copies": "3", "holds": "5"},
                {"isbn": "9780446573016", "library": "Minuteman", "branch": "CAMBRIDGE",
                 "available": "Checked out"},
                {"library": "Minuteman", "branch": "SOMERVILLE", "call_num": "302 GLA"}
            ]"#,
        );
        let source = JsonCatalogSource::new(dir.path().join("missing.json"), &holdings);

        let records = source.load_holdings().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].call_number(), Some("302 GLA"));
        assert!(records[0].is_available());
        assert_eq!(records[0].copies(), 1);
        assert_eq!(records[0].holds(), 0);

        assert_eq!(records[1].digital_url(), Some("https://example.org/ebook"));
        assert_eq!(records[1].copies(), 3);
        assert_eq!(records[1].holds(), 5);
    }

    #[test]
    fn non_array_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let holdings = write(dir.path(), "library.json", r#"{"isbn": "9780446573016"}"#);
        let source = JsonCatalogSource::new(dir.path().join("missing.json"), &holdings);

        assert!(matches!(
            source.load_holdings(),
            Err(JsonStoreError::NotAnArray(_))
        ));
    }

    #[test]
    fn preferences_roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("libraries.json");
        let repo = JsonPreferencesRepository::new(&path);

        // 初回loadはNone
        assert!(repo.load().unwrap().is_none());

        let prefs = BranchPreferences::new(vec![LibraryPreference::new(
            "Harvard",
            vec!["Widener".into(), "Lamont".into()],
        )]);
        repo.save(&prefs).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded, prefs);
        assert!(!path.with_extension("tmp").exists());
    }
}
