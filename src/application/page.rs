use std::path::PathBuf;

use minijinja::{context, Environment};
use serde::Serialize;

use crate::domain::model::catalog::{ItemReport, WishlistReport};
use crate::domain::model::item::WishlistItem;
use crate::domain::model::preferences::{BranchPreferences, LibraryPreference};
use crate::domain::model::recommendation::{BranchPick, Recommendation, Tier};
use crate::domain::normalize::{searchable_author, searchable_title};

use super::error::AppError;

const PAGE_TEMPLATE: &str = include_str!("../../templates/page.html");

/// ページ出力フォーマット
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFormat {
    Html,
    Json,
}

impl PageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PageFormat::Html => "html",
            PageFormat::Json => "json",
        }
    }
}

/// ページ書き出し設定
pub struct PageConfig {
    pub output_dir: PathBuf,
    pub filename: String,
    pub title: String,
    pub format: PageFormat,
}

// =============================================================================
// テンプレートに渡すビュー
// =============================================================================

#[derive(Debug, Serialize)]
struct PageLibrary<'a> {
    library: &'a str,
    tier: Tier,
    tier_label: &'static str,
    branches: &'a [BranchPick],
    checked_out_preferred: &'a [BranchPick],
    search_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PageItem<'a> {
    title: &'a str,
    author: Option<&'a str>,
    format: Option<&'a str>,
    isbn: &'a str,
    shop_url: Option<&'a str>,
    display_branches: &'a [String],
    libraries: Vec<PageLibrary<'a>>,
}

/// WishlistReport → HTML / JSON / テキスト要約
pub struct PageService;

impl PageService {
    /// レポートをHTML文字列に変換する。
    pub fn render_html(
        report: &WishlistReport,
        prefs: &BranchPreferences,
        title: &str,
    ) -> Result<String, AppError> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)?;
        let template = env.get_template("page.html")?;

        let items: Vec<PageItem<'_>> = report
            .items
            .iter()
            .map(|row| Self::page_item(row, prefs))
            .collect();

        let html = template.render(context! { title, items })?;
        Ok(html)
    }

    /// レポートをJSON文字列に変換する。
    pub fn render_json(report: &WishlistReport) -> Result<String, AppError> {
        serde_json::to_string_pretty(report).map_err(AppError::RenderJson)
    }

    /// 番号付きのテキスト要約（1アイテム2行）。
    pub fn render_summary(report: &WishlistReport) -> String {
        let mut buf = format!("# Wishlist ({} items)\n\n", report.items.len());
        for (i, row) in report.items.iter().enumerate() {
            let item = &row.item;
            match item.author() {
                Some(author) => buf.push_str(&format!(
                    "{}. {} — {} [{}]\n",
                    i + 1,
                    item.title(),
                    author,
                    item.isbn()
                )),
                None => buf.push_str(&format!("{}. {} [{}]\n", i + 1, item.title(), item.isbn())),
            }

            if row.display_branches.is_empty() {
                buf.push_str("   → not owned by any library\n");
            } else {
                buf.push_str(&format!("   → {}\n", row.display_branches.join(", ")));
            }
        }
        buf
    }

    /// 1アイテムの図書館ごとの詳細（テキスト）。
    pub fn render_item_detail(position: usize, row: &ItemReport) -> String {
        let item = &row.item;
        let mut buf = format!("# {}. {}\n\n", position, item.title());
        if let Some(author) = item.author() {
            buf.push_str(&format!("by {}\n", author));
        }
        buf.push_str(&format!(
            "ISBN {} — {} holdings\n",
            item.isbn(),
            row.holding_count
        ));

        for rec in &row.recommendations {
            buf.push('\n');
            Self::render_recommendation(rec, &mut buf);
        }
        buf
    }

    /// ファイルに書き出す。
    pub fn publish(
        report: &WishlistReport,
        prefs: &BranchPreferences,
        config: &PageConfig,
    ) -> Result<PathBuf, AppError> {
        let content = match config.format {
            PageFormat::Html => Self::render_html(report, prefs, &config.title)?,
            PageFormat::Json => Self::render_json(report)?,
        };

        let path = config.output_dir.join(&config.filename);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(AppError::PageIo)?;
        }

        std::fs::write(&path, content).map_err(AppError::PageIo)?;
        tracing::info!(path = %path.display(), items = report.items.len(), "page written");
        Ok(path)
    }

    /// 所蔵がない時の蔵書検索URL。検索設定の無い図書館は `None`。
    pub fn search_link(pref: &LibraryPreference, item: &WishlistItem) -> Option<String> {
        let url = pref.search_url()?;
        let query = pref
            .search_query()?
            .replace("{title}", &searchable_title(item.title()))
            .replace("{author}", &searchable_author(item.author().unwrap_or("")));
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        Some(url.replace("{query}", &encoded))
    }

    fn page_item<'a>(row: &'a ItemReport, prefs: &BranchPreferences) -> PageItem<'a> {
        let libraries = row
            .recommendations
            .iter()
            .map(|rec| PageLibrary {
                library: &rec.library,
                tier: rec.tier,
                tier_label: rec.tier.label(),
                branches: &rec.branches,
                checked_out_preferred: &rec.checked_out_preferred,
                search_url: if rec.is_empty() {
                    prefs
                        .get(&rec.library)
                        .and_then(|pref| Self::search_link(pref, &row.item))
                } else {
                    None
                },
            })
            .collect();

        PageItem {
            title: row.item.title(),
            author: row.item.author(),
            format: row.item.format(),
            isbn: row.item.isbn().as_str(),
            shop_url: row.item.shop_url(),
            display_branches: &row.display_branches,
            libraries,
        }
    }

    fn render_recommendation(rec: &Recommendation, buf: &mut String) {
        buf.push_str(&format!("## {} ({})\n", rec.library, rec.tier.label()));

        if !rec.checked_out_preferred.is_empty() {
            let names: Vec<&str> = rec
                .checked_out_preferred
                .iter()
                .map(|b| b.branch.as_str())
                .collect();
            buf.push_str(&format!("  checked out at: {}\n", names.join(", ")));
        }

        for pick in &rec.branches {
            let marker = if pick.preferred { "★ " } else { "" };
            buf.push_str(&format!(
                "- {}{} — {}/{} available",
                marker, pick.branch, pick.available_copies, pick.copies
            ));
            if pick.holds > 0 {
                buf.push_str(&format!(", {} holds", pick.holds));
            }
            buf.push('\n');
            if !pick.call_numbers.is_empty() {
                buf.push_str(&format!("  call number: {}\n", pick.call_numbers.join(" | ")));
            }
            if let Some(url) = &pick.digital_url {
                buf.push_str(&format!("  online: {}\n", url));
            }
        }
    }
}
