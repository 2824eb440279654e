//! CaseScanner - カーソル方式のページングで候補ケースを集める
//!
//! # フロー
//! 1. カーソルなしで最初のページを検索（空なら空集合を返す）
//! 2. 結果を CandidateSet に入れる（重複は吸収）
//! 3. カーソルをページ最後のケース id に進める
//! 4. 集合が予算未満かつ直前のページが空でない間、次のページを検索
//!
//! 1 ページ分の超過は許容するため、取得件数の上限は `budget + page_size - 1`。
//! 検索は前のページのカーソルに依存するので、必ず逐次に行う。

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    CandidateSet, CaseQuery, CaseType, ExpiryWindow, ScanCursor, ScanError,
};
use crate::ports::CaseStore;

pub struct CaseScanner {
    store: Arc<dyn CaseStore>,
    case_type: CaseType,
    page_size: usize,
}

impl CaseScanner {
    pub fn new(store: Arc<dyn CaseStore>, case_type: CaseType, page_size: usize) -> Self {
        Self {
            store,
            case_type,
            page_size,
        }
    }

    /// 最大 `scan_budget` 件（+1 ページ分の超過）の重複なし候補を集める
    ///
    /// 検索が途中で失敗した場合、集めた候補は捨ててエラーを返す。
    pub async fn scan(
        &self,
        window: &ExpiryWindow,
        scan_budget: usize,
    ) -> Result<CandidateSet, ScanError> {
        let mut candidates = CandidateSet::new();
        let mut cursor = ScanCursor::new();
        let mut pages = 0usize;

        loop {
            let query = CaseQuery::build(window, self.page_size, cursor.position());
            let page = self
                .store
                .search(&self.case_type, &query)
                .await
                .map_err(|source| ScanError::Query { pages, source })?;
            pages += 1;

            let Some(last) = page.last().map(|case| case.id) else {
                debug!(case_type = %self.case_type, pages, "search exhausted");
                break;
            };

            let fetched = page.len();
            let mut added = 0usize;
            for case in page {
                if candidates.insert(case) {
                    added += 1;
                }
            }

            let previous = cursor.position();
            if !cursor.advance(last) {
                // advance が失敗するのは previous が Some の場合だけ
                return Err(ScanError::CursorStalled {
                    cursor: previous.unwrap_or(last),
                    last,
                });
            }

            debug!(
                case_type = %self.case_type,
                page = pages,
                fetched,
                added,
                cursor = %last,
                total = candidates.len(),
                "scanned page"
            );

            if candidates.len() >= scan_budget {
                info!(
                    case_type = %self.case_type,
                    budget = scan_budget,
                    total = candidates.len(),
                    "scan budget reached"
                );
                break;
            }
        }

        Ok(candidates)
    }
}
