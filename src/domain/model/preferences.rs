use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// 1図書館システム分の優先分館設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPreference {
    library: String,
    preferred_branches: Vec<String>,
    /// 蔵書検索URL。`{query}` が検索式に置換される。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    search_url: Option<String>,
    /// 検索式。`{title}` と `{author}` を含む。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    search_query: Option<String>,
}

/// 分館名が優先リストのどこに一致したか。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreferenceMatch {
    /// 優先リスト内の位置（0始まり）
    pub rank: usize,
    /// 表記どおりに一致したか（trim・大小無視の一致より優先）
    pub exact: bool,
}

impl LibraryPreference {
    pub fn new(library: impl Into<String>, preferred_branches: Vec<String>) -> Self {
        Self {
            library: library.into(),
            preferred_branches,
            search_url: None,
            search_query: None,
        }
    }

    pub fn with_search(mut self, url: impl Into<String>, query: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self.search_query = Some(query.into());
        self
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn preferred_branches(&self) -> &[String] {
        &self.preferred_branches
    }

    pub fn search_url(&self) -> Option<&str> {
        self.search_url.as_deref()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    /// 分館名を優先リストと照合する。
    pub fn match_branch(&self, branch: &str) -> Option<PreferenceMatch> {
        let folded = branch.trim().to_lowercase();
        self.preferred_branches
            .iter()
            .enumerate()
            .find_map(|(rank, preferred)| {
                if preferred == branch {
                    Some(PreferenceMatch { rank, exact: true })
                } else if preferred.trim().to_lowercase() == folded {
                    Some(PreferenceMatch { rank, exact: false })
                } else {
                    None
                }
            })
    }

    pub(crate) fn set_preferred_branches(&mut self, branches: Vec<String>) {
        self.preferred_branches = branches;
    }
}

/// 全図書館の優先分館設定。並び順がそのまま表示順になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPreferences {
    libraries: Vec<LibraryPreference>,
}

impl Default for BranchPreferences {
    fn default() -> Self {
        Self::new(vec![
            LibraryPreference::new(
                "MBLN",
                vec!["BPL - Central".to_string(), "INTERNET".to_string()],
            )
            .with_search(
                "http://bpl.bibliocommons.com/search?searchscope=MBLN&suppress=true&custom_edit=false&custom_query={query}",
                "title:({title}) AND contributor:({author})",
            ),
            LibraryPreference::new(
                "Minuteman",
                vec!["CAMBRIDGE".to_string(), "INTERNET".to_string()],
            )
            .with_search(
                "http://library.minlib.net/search/X?searchscope=1&SEARCH={query}",
                "t:({title}) and a:({author})",
            ),
        ])
    }
}

impl BranchPreferences {
    pub fn new(libraries: Vec<LibraryPreference>) -> Self {
        Self { libraries }
    }

    pub fn libraries(&self) -> &[LibraryPreference] {
        &self.libraries
    }

    pub fn get(&self, library: &str) -> Option<&LibraryPreference> {
        self.libraries.iter().find(|l| l.library() == library)
    }

    /// 優先分館リストを置き換える。空白のみの分館名は拒否する。
    pub fn set_preferred_branches(
        &mut self,
        library: &str,
        branches: Vec<String>,
    ) -> Result<(), DomainError> {
        let branches: Vec<String> = branches.into_iter().map(|b| b.trim().to_string()).collect();
        if branches.iter().any(|b| b.is_empty()) {
            return Err(DomainError::EmptyBranchName);
        }

        let pref = self
            .libraries
            .iter_mut()
            .find(|l| l.library() == library)
            .ok_or_else(|| DomainError::UnknownLibrary(library.to_string()))?;
        pref.set_preferred_branches(branches);
        Ok(())
    }
}
