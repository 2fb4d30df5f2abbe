//! 図書館サイトごとに表記が揺れる値の正規化。

/// 貸出可能を意味する状態表記（小文字）
const AVAILABLE_STATUSES: &[&str] = &["available", "in", "not checked out"];

/// 状態表記を貸出可否に変換する。未知の表記は貸出不可とみなす。
pub fn parse_availability(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    AVAILABLE_STATUSES.contains(&status.as_str())
}

/// 請求記号のNBSPを通常の空白に置き換えて前後の空白を除く。空なら `None`。
pub fn clean_call_number(raw: &str) -> Option<String> {
    let cleaned = raw.replace('\u{a0}', " ").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// 蔵書検索用のタイトル。末尾のサブタイトルと括弧書きを落とす。
pub fn searchable_title(title: &str) -> String {
    let mut title = title.to_string();

    if let Some(pos) = title.rfind([':', ';']) {
        if !title[pos + 1..].is_empty() {
            title.truncate(pos);
        }
    }

    if title.ends_with(')') {
        if let Some(open) = title.find('(') {
            title.truncate(open);
            let trimmed = title.trim_end().len();
            title.truncate(trimmed);
        }
    }

    title
}

/// 蔵書検索用の著者名。末尾の学位表記（Ph.D. など）を落とす。
pub fn searchable_author(author: &str) -> String {
    if let Some(idx) = author.rfind("Ph") {
        let (head, tail) = author.split_at(idx);
        if head.ends_with(char::is_whitespace) && is_doctorate_suffix(tail) {
            return head.trim_end().to_string();
        }
    }
    author.to_string()
}

fn is_doctorate_suffix(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("Ph") else {
        return false;
    };
    let rest = rest.strip_prefix('.').unwrap_or(rest).trim_start();
    matches!(rest.strip_prefix('D'), Some("") | Some("."))
}
