//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use wishlist_libraries::application::service::WishlistService;
use wishlist_libraries::domain::model::holding::{AvailabilityRecord, NewHolding};
use wishlist_libraries::domain::model::isbn::Isbn;
use wishlist_libraries::domain::model::item::{SortKey, WishlistItem};
use wishlist_libraries::domain::model::preferences::BranchPreferences;
use wishlist_libraries::domain::repository::{CatalogSource, PreferencesRepository};

// =============================================================================
// In-memory repositories — テスト用
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("in-memory store error")]
pub struct InMemoryError;

/// ファイルI/O不要のCatalogSource。
pub struct InMemorySource {
    items: Vec<WishlistItem>,
    holdings: Vec<AvailabilityRecord>,
}

impl InMemorySource {
    pub fn new(items: Vec<WishlistItem>, holdings: Vec<AvailabilityRecord>) -> Self {
        Self { items, holdings }
    }
}

impl CatalogSource for InMemorySource {
    type Error = InMemoryError;

    fn load_wishlist(&self) -> Result<Vec<WishlistItem>, Self::Error> {
        Ok(self.items.clone())
    }

    fn load_holdings(&self) -> Result<Vec<AvailabilityRecord>, Self::Error> {
        Ok(self.holdings.clone())
    }
}

/// ファイルI/O不要のPreferencesRepository。
pub struct InMemoryPrefs {
    store: RefCell<Option<BranchPreferences>>,
}

impl InMemoryPrefs {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(None),
        }
    }

    pub fn with(prefs: BranchPreferences) -> Self {
        Self {
            store: RefCell::new(Some(prefs)),
        }
    }
}

impl PreferencesRepository for InMemoryPrefs {
    type Error = InMemoryError;

    fn load(&self) -> Result<Option<BranchPreferences>, Self::Error> {
        Ok(self.store.borrow().clone())
    }

    fn save(&self, prefs: &BranchPreferences) -> Result<(), Self::Error> {
        *self.store.borrow_mut() = Some(prefs.clone());
        Ok(())
    }
}

// =============================================================================
// Fixture builders
// =============================================================================

pub fn isbn(raw: &str) -> Isbn {
    Isbn::parse(raw).unwrap()
}

pub fn item(raw_isbn: &str, title: &str, author: &str, key: &str) -> WishlistItem {
    WishlistItem::new(isbn(raw_isbn), title, key.parse::<SortKey>().unwrap()).with_author(author)
}

/// 請求記号つきの1冊
pub fn shelf(
    raw_isbn: &str,
    library: &str,
    branch: &str,
    call: &str,
    available: bool,
) -> AvailabilityRecord {
    AvailabilityRecord::new(NewHolding {
        isbn: isbn(raw_isbn),
        library: library.into(),
        branch: branch.into(),
        collection: None,
        call_number: Some(call.into()),
        digital_url: None,
        catalog_url: None,
        available,
        copies: 1,
        holds: 0,
    })
    .unwrap()
}

/// 電子版の1冊
pub fn online(raw_isbn: &str, library: &str, branch: &str, url: &str) -> AvailabilityRecord {
    AvailabilityRecord::new(NewHolding {
        isbn: isbn(raw_isbn),
        library: library.into(),
        branch: branch.into(),
        collection: Some("eBook".into()),
        call_number: None,
        digital_url: Some(url.into()),
        catalog_url: None,
        available: true,
        copies: 1,
        holds: 0,
    })
    .unwrap()
}

pub const OUTLIERS: &str = "9780316017923";
pub const MANAGER: &str = "9781591391821";
pub const EVERYDAY: &str = "9780465050659";
pub const ORPHAN: &str = "9780000000002";

// =============================================================================
// TestData — 標準的なウィッシュリスト + 所蔵
// =============================================================================

pub struct TestData {
    pub items: Vec<WishlistItem>,
    pub holdings: Vec<AvailabilityRecord>,
}

impl TestData {
    /// 標準的なテストデータ（既定の優先分館設定を前提とする）:
    /// ```text
    /// 1. Outliers          MBLN: BPL - Central (available), Brighton (out)
    ///                      Minuteman: CAMBRIDGE (out), SOMERVILLE (available)
    /// 2. Becoming a Manager  Minuteman: INTERNET (online), NEWTON (out)
    /// 3. Everyday Things   (no holdings)
    /// + 1 holding for an ISBN not on the wishlist
    /// ```
    /// アイテムは並び順キーと異なる順で渡す。
    pub fn standard() -> Self {
        let items = vec![
            item(EVERYDAY, "The Design of Everyday Things", "Don Norman", "3"),
            item(OUTLIERS, "Outliers: The Story of Success", "Malcolm Gladwell", "1"),
            item(MANAGER, "Becoming a Manager", "Linda A. Hill", "2"),
        ];

        let holdings = vec![
            shelf(OUTLIERS, "MBLN", "Brighton", "302 GLA", false),
            shelf(OUTLIERS, "MBLN", "BPL - Central", "302 GLA", true),
            shelf(OUTLIERS, "Minuteman", "CAMBRIDGE", "302 G", false),
            shelf(OUTLIERS, "Minuteman", "SOMERVILLE", "302 G", true),
            online(MANAGER, "Minuteman", "INTERNET", "https://ebooks.minlib.net/title/1"),
            shelf(MANAGER, "Minuteman", "NEWTON", "658.4 HIL", false),
            shelf(ORPHAN, "MBLN", "BPL - Central", "000 ORP", true),
        ];

        Self { items, holdings }
    }

    /// InMemoryなServiceを返す（設定は未保存＝既定値）。
    pub fn service(&self) -> WishlistService<InMemorySource, InMemoryPrefs> {
        WishlistService::new(
            InMemorySource::new(self.items.clone(), self.holdings.clone()),
            InMemoryPrefs::new(),
        )
    }
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
