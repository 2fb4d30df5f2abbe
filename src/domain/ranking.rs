//! 分館ランキング。
//!
//! 1アイテムの所蔵レコードと1図書館システムの優先分館設定から、
//! 表示すべき分館とその順序を決める。
//!
//! 1. 優先分館のどこかに貸出可能な本があれば、所蔵している優先分館を全て推薦する。
//! 2. 優先分館が全て貸出中なら、貸出可能な分館を推薦する（優先分館が先）。
//! 3. どこにも貸出可能な本がなければ、所蔵分館を全て推薦する（優先分館が先）。
//!
//! 優先分館同士は優先リストの順、それ以外は分館名の順に並べる。

use std::collections::BTreeMap;

use super::model::holding::AvailabilityRecord;
use super::model::preferences::{LibraryPreference, PreferenceMatch};
use super::model::recommendation::{BranchPick, Recommendation, Tier};

struct RankedBranch {
    matched: Option<PreferenceMatch>,
    pick: BranchPick,
}

impl RankedBranch {
    fn is_preferred(&self) -> bool {
        self.matched.is_some()
    }

    fn is_available(&self) -> bool {
        self.pick.available_copies > 0
    }

    /// 優先分館（リスト順、表記一致が先）→ その他（名前順）
    fn sort_key(&self) -> (bool, usize, bool, &str) {
        match self.matched {
            Some(m) => (false, m.rank, !m.exact, self.pick.branch.as_str()),
            None => (true, 0, false, self.pick.branch.as_str()),
        }
    }
}

/// 1アイテム分の所蔵から、指定図書館システムの推薦分館を決める。
///
/// `holdings` は他の図書館システムのレコードを含んでいてよい。
pub fn recommend(holdings: &[AvailabilityRecord], pref: &LibraryPreference) -> Recommendation {
    let ranked = rank(holdings, pref);

    if ranked.is_empty() {
        return Recommendation::empty(pref.library());
    }

    let (tier, branches, checked_out_preferred): (Tier, Vec<RankedBranch>, Vec<RankedBranch>) =
        if ranked.iter().any(|b| b.is_preferred() && b.is_available()) {
            let branches = ranked.into_iter().filter(|b| b.is_preferred()).collect();
            (Tier::PreferredAvailable, branches, Vec::new())
        } else if ranked.iter().any(|b| b.is_available()) {
            let (branches, rest): (Vec<_>, Vec<_>) =
                ranked.into_iter().partition(|b| b.is_available());
            let checked_out = rest.into_iter().filter(|b| b.is_preferred()).collect();
            (Tier::AvailableElsewhere, branches, checked_out)
        } else {
            (Tier::OwnedOnly, ranked, Vec::new())
        };

    tracing::debug!(
        library = pref.library(),
        ?tier,
        branches = branches.len(),
        "ranked branches"
    );

    Recommendation {
        library: pref.library().to_string(),
        tier,
        branches: branches.into_iter().map(|b| b.pick).collect(),
        checked_out_preferred: checked_out_preferred.into_iter().map(|b| b.pick).collect(),
    }
}

/// 推薦分館名の和集合を、最初に現れた順で返す。
pub fn display_branches(recommendations: &[Recommendation]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in recommendations.iter().flat_map(|r| r.branch_names()) {
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// 指定図書館のレコードを分館ごとに集約し、表示順に並べる。
fn rank(holdings: &[AvailabilityRecord], pref: &LibraryPreference) -> Vec<RankedBranch> {
    let mut by_branch: BTreeMap<&str, BranchPick> = BTreeMap::new();

    for holding in holdings.iter().filter(|h| h.library() == pref.library()) {
        let pick = by_branch
            .entry(holding.branch())
            .or_insert_with(|| BranchPick {
                branch: holding.branch().to_string(),
                preferred: false,
                copies: 0,
                available_copies: 0,
                holds: 0,
                call_numbers: Vec::new(),
                collections: Vec::new(),
                digital_url: None,
            });

        let copies = holding.copies().max(1);
        pick.copies = pick.copies.saturating_add(copies);
        if holding.is_available() {
            pick.available_copies = pick.available_copies.saturating_add(copies);
        }
        pick.holds = pick.holds.saturating_add(holding.holds());
        push_distinct(&mut pick.call_numbers, holding.call_number());
        push_distinct(&mut pick.collections, holding.collection());
        if pick.digital_url.is_none() {
            pick.digital_url = holding.digital_url().map(String::from);
        }
    }

    let mut ranked: Vec<RankedBranch> = by_branch
        .into_values()
        .map(|mut pick| {
            let matched = pref.match_branch(&pick.branch);
            pick.preferred = matched.is_some();
            RankedBranch { matched, pick }
        })
        .collect();
    ranked.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    ranked
}

fn push_distinct(values: &mut Vec<String>, value: Option<&str>) {
    if let Some(v) = value {
        if !values.iter().any(|existing| existing == v) {
            values.push(v.to_string());
        }
    }
}
