//! 外部APIレスポンスのキャッシュ。
//!
//! リクエストキー（URL）→ レスポンス本文の辞書を1つのJSONファイルに持つ。
//! 読み出しは有効期限内のものだけ返し、書き込みは上書きのみ。

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 既定の有効期限（18時間）
pub const DEFAULT_TTL: Duration = Duration::from_secs(18 * 60 * 60);

/// レート制限時の既定の待ち時間
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 取得処理の失敗。`RateLimited` だけが再試行の対象。
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited")]
    RateLimited,
    #[error("fetch failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    stored_at: DateTime<Utc>,
}

pub struct ResponseCache {
    path: PathBuf,
    ttl: Duration,
    retry_delay: Duration,
    entries: BTreeMap<String, CacheEntry>,
}

impl ResponseCache {
    /// キャッシュファイルを開く。無ければ空で始める。
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            ttl: DEFAULT_TTL,
            retry_delay: DEFAULT_RETRY_DELAY,
            entries,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 有効期限内のエントリだけ返す。
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<&str> {
        let entry = self.entries.get(key)?;
        // 未来時刻で保存されたものは新しいとみなす
        let fresh = match now.signed_duration_since(entry.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        };
        fresh.then_some(entry.body.as_str())
    }

    pub fn put(&mut self, key: impl Into<String>, body: impl Into<String>, now: DateTime<Utc>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                body: body.into(),
                stored_at: now,
            },
        );
    }

    /// 一時ファイルに書いてからrenameする。
    pub fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read-through / write-through で取得する。
    ///
    /// レート制限されたら `retry_delay` 待って1回だけ再試行する。
    pub fn fetch_through<F>(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
        mut fetch: F,
    ) -> Result<String, FetchError>
    where
        F: FnMut() -> Result<String, FetchError>,
    {
        if let Some(body) = self.get(key, now) {
            tracing::debug!(key, "response cache hit");
            return Ok(body.to_string());
        }

        let body = match fetch() {
            Err(FetchError::RateLimited) => {
                tracing::warn!(
                    key,
                    delay_ms = self.retry_delay.as_millis() as u64,
                    "rate limited, retrying once"
                );
                std::thread::sleep(self.retry_delay);
                fetch()?
            }
            other => other?,
        };

        self.put(key, body.clone(), now);
        Ok(body)
    }
}
