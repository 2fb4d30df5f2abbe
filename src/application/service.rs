use crate::domain::model::catalog::{Catalog, ItemReport, WishlistReport};
use crate::domain::model::holding::AvailabilityRecord;
use crate::domain::model::isbn::Isbn;
use crate::domain::model::item::WishlistItem;
use crate::domain::model::preferences::BranchPreferences;
use crate::domain::repository::{CatalogSource, PreferencesRepository};

use super::error::AppError;

/// ウィッシュリスト × 所蔵に対するユースケース。
/// 呼ばれるたびに入力を読み直して計算する。
pub struct WishlistService<C: CatalogSource, P: PreferencesRepository> {
    source: C,
    prefs: P,
}

impl<C: CatalogSource, P: PreferencesRepository> WishlistService<C, P> {
    pub fn new(source: C, prefs: P) -> Self {
        Self { source, prefs }
    }

    /// ウィッシュリストと所蔵を読み込んでCatalogを組み立てる。
    pub fn load_catalog(&self) -> Result<Catalog, AppError> {
        let items = self
            .source
            .load_wishlist()
            .map_err(|e| AppError::Storage(Box::new(e)))?;
        let holdings = self
            .source
            .load_holdings()
            .map_err(|e| AppError::Storage(Box::new(e)))?;

        let catalog = Catalog::new(items, holdings);
        tracing::info!(
            items = catalog.item_count(),
            holdings = catalog.holding_count(),
            dropped = catalog.dropped_holdings(),
            "catalog assembled"
        );
        Ok(catalog)
    }

    /// 優先分館設定。未保存なら既定値。
    pub fn preferences(&self) -> Result<BranchPreferences, AppError> {
        Ok(self
            .prefs
            .load()
            .map_err(|e| AppError::Storage(Box::new(e)))?
            .unwrap_or_default())
    }

    /// 図書館の優先分館リストを置き換えて保存する。
    pub fn set_preferred_branches(
        &self,
        library: &str,
        branches: Vec<String>,
    ) -> Result<BranchPreferences, AppError> {
        let mut prefs = self.preferences()?;
        prefs.set_preferred_branches(library, branches)?;
        self.prefs
            .save(&prefs)
            .map_err(|e| AppError::Storage(Box::new(e)))?;
        tracing::info!(library, "preferred branches updated");
        Ok(prefs)
    }

    /// 全アイテムのレポート
    pub fn report(&self) -> Result<WishlistReport, AppError> {
        let catalog = self.load_catalog()?;
        let prefs = self.preferences()?;
        Ok(catalog.build_report(&prefs))
    }

    /// 1アイテムのレポートとウィッシュリスト番号
    pub fn item_report(&self, query: &str) -> Result<(usize, ItemReport), AppError> {
        let catalog = self.load_catalog()?;
        let prefs = self.preferences()?;
        let item = resolve_item(&catalog, query)?;
        let position = catalog.position_of(item.isbn()).unwrap_or(0);
        Ok((position, catalog.report_item(item, &prefs)))
    }

    /// 1アイテムの生の所蔵レコード（図書館・分館名順）
    pub fn item_holdings(
        &self,
        query: &str,
    ) -> Result<(usize, WishlistItem, Vec<AvailabilityRecord>), AppError> {
        let catalog = self.load_catalog()?;
        let item = resolve_item(&catalog, query)?;
        let position = catalog.position_of(item.isbn()).unwrap_or(0);

        let mut holdings = catalog.holdings_for(item.isbn()).to_vec();
        holdings.sort_by(|a, b| {
            (a.library(), a.branch(), a.collection())
                .cmp(&(b.library(), b.branch(), b.collection()))
        });
        Ok((position, item.clone(), holdings))
    }
}

/// 番号 / ISBN / タイトル部分一致 → WishlistItem。
///
/// 優先順位:
/// 1. ウィッシュリスト番号（1始まり、範囲内のもの）
/// 2. ISBN（ハイフン可）
/// 3. タイトル部分一致（大小無視、一意であること）
///
/// 範囲外の番号は "1984" のようなタイトルとして引き直す。
pub fn resolve_item<'a>(catalog: &'a Catalog, query: &str) -> Result<&'a WishlistItem, AppError> {
    let query = query.trim();

    // ISBNも数字列なので、短いものだけを番号として扱う
    if query.len() < 10 {
        if let Some(item) = query
            .parse::<usize>()
            .ok()
            .and_then(|position| catalog.at_position(position))
        {
            return Ok(item);
        }
    }

    if let Ok(isbn) = Isbn::parse(query) {
        if let Some(item) = catalog.get(&isbn) {
            return Ok(item);
        }
    }

    let matches = catalog.search_title(query);
    match matches.len() {
        0 => Err(AppError::ItemNotFound(query.to_string())),
        1 => Ok(matches[0]),
        count => Err(AppError::AmbiguousItem {
            query: query.to_string(),
            count,
            candidates: matches
                .iter()
                .map(|item| {
                    let position = catalog.position_of(item.isbn()).unwrap_or(0);
                    format!("'{}' ({})", item.title(), position)
                })
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
