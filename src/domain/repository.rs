use super::model::holding::AvailabilityRecord;
use super::model::item::WishlistItem;
use super::model::preferences::BranchPreferences;

/// 外部の取得処理が書き出したウィッシュリストと所蔵の読み出し。Infra層が実装する。
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_wishlist(&self) -> Result<Vec<WishlistItem>, Self::Error>;
    fn load_holdings(&self) -> Result<Vec<AvailabilityRecord>, Self::Error>;
}

/// 優先分館設定の永続化。`None` は未設定（既定値を使う）。
pub trait PreferencesRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self) -> Result<Option<BranchPreferences>, Self::Error>;
    fn save(&self, prefs: &BranchPreferences) -> Result<(), Self::Error>;
}
