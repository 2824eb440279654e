//! Filter - work item を作るべきケースを選ぶ
//!
//! # フロー
//! 1. スキャンで集めた CandidateSet を case id 昇順に走査
//! 2. actionable な action を 1 件以上持つケースだけを残す
//! 3. 先頭から `max_batch` 件で打ち切る

use chrono::NaiveDate;

use crate::domain::{CandidateSet, CaseRecord};

/// 期限切れ・未解消・未フラグの action を 1 件以上持つなら true
pub fn is_actionable(case: &CaseRecord, cutoff: NaiveDate) -> bool {
    case.has_actionable(cutoff)
}

/// actionable なケースを case id 順に残し、`max_batch` 件までに絞る
///
/// `max_batch` はスキャン件数とは独立に、下流へのイベント数の上限になる。
pub fn select_candidates(
    candidates: CandidateSet,
    cutoff: NaiveDate,
    max_batch: usize,
) -> Vec<CaseRecord> {
    candidates
        .into_iter()
        .filter(|case| is_actionable(case, cutoff))
        .take(max_batch)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, CaseState, CaseType, FollowUpAction};
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cutoff() -> NaiveDate {
        date(2024, 3, 8)
    }

    fn case_with(id: u64, actions: Vec<FollowUpAction>) -> CaseRecord {
        let mut case = CaseRecord::new(CaseId::new(id), CaseType::new("ET_EnglandWales"), CaseState::Accepted);
        case.actions = actions;
        case
    }

    fn expired() -> FollowUpAction {
        FollowUpAction::new("bf-1", date(2024, 3, 7))
    }

    #[rstest]
    #[case::expired_open(vec![expired()], true)]
    #[case::due_on_cutoff(vec![FollowUpAction::new("bf-1", date(2024, 3, 8))], true)]
    #[case::cleared(vec![expired().cleared_with("2024-03-07")], false)]
    #[case::already_flagged(vec![expired().with_work_item_created()], false)]
    #[case::not_yet_due(vec![FollowUpAction::new("bf-1", date(2024, 3, 9))], false)]
    #[case::no_actions(vec![], false)]
    #[case::one_of_many(vec![expired().cleared_with("done"), expired().with_work_item_created(), expired()], true)]
    fn actionable_truth_table(#[case] actions: Vec<FollowUpAction>, #[case] expected: bool) {
        assert_eq!(is_actionable(&case_with(1, actions), cutoff()), expected);
    }

    #[test]
    fn selection_drops_inactive_cases_and_caps_batch() {
        let mut set = CandidateSet::new();
        for id in 1..=6 {
            let action = if id % 2 == 0 {
                expired().cleared_with("done")
            } else {
                expired()
            };
            set.insert(case_with(id, vec![action]));
        }

        let all = select_candidates(set.clone(), cutoff(), 10);
        assert_eq!(
            all.iter().map(|c| c.id.as_u64()).collect::<Vec<_>>(),
            vec![1, 3, 5]
        );

        let capped = select_candidates(set, cutoff(), 2);
        assert_eq!(
            capped.iter().map(|c| c.id.as_u64()).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }
}
