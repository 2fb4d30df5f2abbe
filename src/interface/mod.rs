use std::path::Path;

use crate::application::service::WishlistService;
use crate::infra::json_store::{JsonCatalogSource, JsonPreferencesRepository};

pub mod cli;
pub mod logging;
pub mod mcp;

/// 取得処理が書き出すウィッシュリスト
pub const WISHLIST_FILE: &str = "wishlist.json";
/// 取得処理が書き出す所蔵レコード
pub const HOLDINGS_FILE: &str = "library.json";
/// 優先分館設定
pub const PREFERENCES_FILE: &str = "libraries.json";

pub type JsonWishlistService = WishlistService<JsonCatalogSource, JsonPreferencesRepository>;

/// データディレクトリ内の既定ファイル名でServiceを組み立てる。
pub fn service_for_dir(data_dir: &Path) -> JsonWishlistService {
    WishlistService::new(
        JsonCatalogSource::new(data_dir.join(WISHLIST_FILE), data_dir.join(HOLDINGS_FILE)),
        JsonPreferencesRepository::new(data_dir.join(PREFERENCES_FILE)),
    )
}
