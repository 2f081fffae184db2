//! # 同梱テンプレート
//!
//! 通知種別ごとの既定テンプレートを `include_str!` でバイナリに埋め込む。
//! 設定ファイルからは `bundled:notifications/<通知種別>/<区分>.txt` で参照する。

use passnotify_infra::template::BundledTemplateResolver;

macro_rules! bundled {
    ($($notification:literal),* $(,)?) => {
        [$(
            bundled!(@entry $notification, "subject"),
            bundled!(@entry $notification, "body"),
            bundled!(@entry $notification, "footer"),
        )*]
    };
    (@entry $notification:literal, $section:literal) => {
        (
            concat!("notifications/", $notification, "/", $section, ".txt"),
            include_str!(concat!(
                "../../../templates/notifications/",
                $notification,
                "/",
                $section,
                ".txt"
            )),
        )
    };
}

/// 同梱テンプレート（パス, 本体）
pub const BUNDLED_TEMPLATES: [(&str, &str); 15] = bundled![
    "SUBMISSION_APPROVAL_INVITE",
    "SUBMISSION_APPROVAL_REQUESTED",
    "SUBMISSION_CHANGES_REQUESTED",
    "SUBMISSION_SUBMISSION_SUBMITTED",
    "SUBMISSION_SUBMISSION_CANCELLED",
];

/// 同梱テンプレートを解決するリゾルバを構築する
pub fn bundled_resolver() -> BundledTemplateResolver {
    BundledTemplateResolver::new(BUNDLED_TEMPLATES)
}
