//! # 通知内リンク
//!
//! 投稿画面へのリンクを `link_metadata` パラメータとして組み立てる。
//!
//! | イベント種別 | rel |
//! |---|---|
//! | approval-requested-newuser | `submission-review-invite` |
//! | approval-requested / changes-requested | `submission-review` |
//! | その他 | `submission-view` |

use passnotify_domain::{
    notification::{Link, link_rel},
    submission::{SubmissionEventType, SubmissionId},
};

/// リンク生成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    app_base_url: String,
}

impl LinkBuilder {
    pub fn new(app_base_url: impl Into<String>) -> Self {
        Self {
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 投稿とイベント種別からリンクを組み立てる
    pub fn links(&self, submission: &SubmissionId, event_type: &SubmissionEventType) -> Vec<Link> {
        let rel = match event_type {
            SubmissionEventType::ApprovalRequestedNewuser => link_rel::SUBMISSION_REVIEW_INVITE,
            SubmissionEventType::ApprovalRequested | SubmissionEventType::ChangesRequested => {
                link_rel::SUBMISSION_REVIEW
            }
            _ => link_rel::SUBMISSION_VIEW,
        };

        vec![Link {
            rel:  rel.to_string(),
            href: format!(
                "{}/submissions/{}",
                self.app_base_url,
                urlencoding::encode(submission.as_str())
            ),
        }]
    }
}
