/// リソース URI ベースの ID 型を定義する宣言型マクロ
///
/// 投稿・投稿イベント・ユーザーはリソースストア上の URI で識別される。
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ、serde は透過）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)`
/// - `new()`: 任意の文字列から作成（検証しない、不透明な参照として扱う）
/// - `as_str()`: 内部文字列への参照
///
/// # 使用例
///
/// ```rust
/// use passnotify_domain::submission::SubmissionId;
///
/// let id = SubmissionId::new("https://pass.example.org/submissions/1");
/// assert_eq!(id.as_str(), "https://pass.example.org/submissions/1");
/// assert_eq!(id.to_string(), "https://pass.example.org/submissions/1");
/// ```
macro_rules! define_resource_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        $vis struct $Name(String);

        impl $Name {
            /// 文字列から ID を作成する
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $Name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}
