use serde::{Deserialize, Serialize};

/// どの段階のフォールバックで推薦が決まったか。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 優先分館に貸出可能な本がある
    PreferredAvailable,
    /// 優先分館は全て貸出中だが、他の分館に貸出可能な本がある
    AvailableElsewhere,
    /// どこにも貸出可能な本がない（所蔵分館を全て列挙）
    OwnedOnly,
    /// この図書館システムは所蔵していない
    NotOwned,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::PreferredAvailable => "available at a preferred branch",
            Tier::AvailableElsewhere => "available elsewhere",
            Tier::OwnedOnly => "owned, nothing on the shelf",
            Tier::NotOwned => "not owned",
        }
    }
}

/// 推薦分館1件分。同一分館の複数冊を集約したもの。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPick {
    pub branch: String,
    pub preferred: bool,
    /// 所蔵冊数（同一分館のレコードの合計）
    pub copies: u32,
    pub available_copies: u32,
    pub holds: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_url: Option<String>,
}

/// 1アイテム × 1図書館システムの推薦結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub library: String,
    pub tier: Tier,
    pub branches: Vec<BranchPick>,
    /// 所蔵はあるが全冊貸出中の優先分館（AvailableElsewhereの時のみ）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked_out_preferred: Vec<BranchPick>,
}

impl Recommendation {
    pub fn empty(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            tier: Tier::NotOwned,
            branches: Vec::new(),
            checked_out_preferred: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.branch.as_str()).collect()
    }
}
