use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::holding::AvailabilityRecord;
use super::isbn::Isbn;
use super::item::WishlistItem;
use super::preferences::BranchPreferences;
use super::recommendation::Recommendation;
use crate::domain::ranking;

/// 1アイテム分のレポート行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub item: WishlistItem,
    /// 設定順の図書館ごとの推薦
    pub recommendations: Vec<Recommendation>,
    /// 全図書館の推薦分館の和集合
    pub display_branches: Vec<String>,
    pub holding_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistReport {
    pub items: Vec<ItemReport>,
}

/// ウィッシュリストと所蔵レコードの集約ルート。
/// アイテムは並び順キー順、所蔵はISBNで索引する。
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<WishlistItem>,
    holdings: BTreeMap<Isbn, Vec<AvailabilityRecord>>,
    dropped_holdings: usize,
}

impl Catalog {
    /// ISBNがウィッシュリストにない所蔵は捨てる。重複ISBNのアイテムは先勝ち。
    pub fn new(items: Vec<WishlistItem>, holdings: Vec<AvailabilityRecord>) -> Self {
        let mut unique: Vec<WishlistItem> = Vec::with_capacity(items.len());
        for item in items {
            if unique.iter().any(|u| u.isbn() == item.isbn()) {
                tracing::warn!(isbn = %item.isbn(), "duplicate wishlist item ignored");
                continue;
            }
            unique.push(item);
        }
        unique.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

        let mut index: BTreeMap<Isbn, Vec<AvailabilityRecord>> = unique
            .iter()
            .map(|item| (item.isbn().clone(), Vec::new()))
            .collect();

        let mut dropped_holdings = 0;
        for holding in holdings {
            match index.get_mut(holding.isbn()) {
                Some(list) => list.push(holding),
                None => {
                    tracing::warn!(
                        isbn = %holding.isbn(),
                        library = holding.library(),
                        "holding references no wishlist item"
                    );
                    dropped_holdings += 1;
                }
            }
        }

        Self {
            items: unique,
            holdings: index,
            dropped_holdings,
        }
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.values().map(Vec::len).sum()
    }

    pub fn dropped_holdings(&self) -> usize {
        self.dropped_holdings
    }

    pub fn get(&self, isbn: &Isbn) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.isbn() == isbn)
    }

    /// 1始まりのウィッシュリスト番号で引く。
    pub fn at_position(&self, position: usize) -> Option<&WishlistItem> {
        position.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// 1始まりのウィッシュリスト番号を返す。
    pub fn position_of(&self, isbn: &Isbn) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.isbn() == isbn)
            .map(|i| i + 1)
    }

    /// タイトル部分一致（大小無視）
    pub fn search_title(&self, fragment: &str) -> Vec<&WishlistItem> {
        let query = fragment.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.title().to_lowercase().contains(&query))
            .collect()
    }

    pub fn holdings_for(&self, isbn: &Isbn) -> &[AvailabilityRecord] {
        self.holdings.get(isbn).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 1アイテム分のレポート行を作る。
    pub fn report_item(&self, item: &WishlistItem, prefs: &BranchPreferences) -> ItemReport {
        let holdings = self.holdings_for(item.isbn());
        let recommendations: Vec<Recommendation> = prefs
            .libraries()
            .iter()
            .map(|pref| ranking::recommend(holdings, pref))
            .collect();
        let display_branches = ranking::display_branches(&recommendations);

        ItemReport {
            item: item.clone(),
            recommendations,
            display_branches,
            holding_count: holdings.len(),
        }
    }

    /// ウィッシュリスト順に全アイテムのレポートを作る。
    pub fn build_report(&self, prefs: &BranchPreferences) -> WishlistReport {
        WishlistReport {
            items: self
                .items
                .iter()
                .map(|item| self.report_item(item, prefs))
                .collect(),
        }
    }
}
