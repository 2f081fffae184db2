//! # 受信者解析
//!
//! 投稿とイベントから通知の受信者を決定し、許可リストで絞り込む。
//!
//! | イベント種別 | 受信者 |
//! |---|---|
//! | approval-requested-newuser | 投稿者 |
//! | approval-requested | 投稿者 |
//! | changes-requested | 準備者 |
//! | submitted | 準備者 |
//! | cancelled（投稿者が実行） | 準備者 |
//! | cancelled（それ以外が実行） | 投稿者 |
//!
//! 未知のイベント種別は [`DomainError::UnsupportedEventType`] で失敗する。

use std::collections::BTreeSet;

use super::Whitelist;
use crate::{
    DomainError,
    submission::{Submission, SubmissionEvent, SubmissionEventType, UserId},
};

/// 受信者解析
#[derive(Debug, Clone, Default)]
pub struct RecipientAnalyzer {
    whitelist: Whitelist,
}

impl RecipientAnalyzer {
    pub fn new(whitelist: Whitelist) -> Self {
        Self { whitelist }
    }

    /// 受信者を決定する
    ///
    /// 戻り値は許可リスト適用後の集合。
    pub fn analyze(
        &self,
        submission: &Submission,
        event: &SubmissionEvent,
    ) -> Result<BTreeSet<UserId>, DomainError> {
        let submitter = || BTreeSet::from([submission.submitter.clone()]);
        let preparers = || submission.preparers.iter().cloned().collect::<BTreeSet<_>>();

        let raw = match &event.event_type {
            SubmissionEventType::ApprovalRequestedNewuser
            | SubmissionEventType::ApprovalRequested => submitter(),
            SubmissionEventType::ChangesRequested | SubmissionEventType::Submitted => {
                preparers()
            }
            SubmissionEventType::Cancelled if event.performed_by == submission.submitter => {
                preparers()
            }
            SubmissionEventType::Cancelled => submitter(),
            SubmissionEventType::Unrecognized(raw) => {
                return Err(DomainError::UnsupportedEventType(raw.clone()));
            }
        };

        Ok(self.whitelist.filter(&raw))
    }
}
