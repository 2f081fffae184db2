//! # 許可リスト
//!
//! 受信者候補を許可リストで絞り込む。比較は大文字小文字を区別しない。
//! 許可リストが空の場合は候補をそのまま返す。

use std::collections::{BTreeSet, HashSet};

/// 受信者の許可リスト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    /// 小文字化済みのエントリ
    entries: HashSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// 全員を許可する許可リストかどうか
    pub fn allows_all(&self) -> bool {
        self.entries.is_empty()
    }

    /// 候補のうち許可リストに含まれるものを返す
    ///
    /// 入力は変更せず、新しい集合を返す。
    pub fn filter<T>(&self, candidates: &BTreeSet<T>) -> BTreeSet<T>
    where
        T: AsRef<str> + Ord + Clone,
    {
        if self.allows_all() {
            return candidates.clone();
        }

        candidates
            .iter()
            .filter(|c| self.entries.contains(&c.as_ref().to_lowercase()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn 空の許可リストは候補をそのまま返す() {
        let candidates = btreeset! {"mailto:a@x.edu", "mailto:b@x.edu"};

        let filtered = Whitelist::default().filter(&candidates);

        assert_eq!(filtered, candidates);
    }

    #[test]
    fn 未設定の許可リストも全員許可として扱う() {
        let whitelist = Whitelist::new(Vec::<String>::new());
        assert!(whitelist.allows_all());
    }

    #[test]
    fn 許可リストとの大文字小文字を区別しない共通部分を返す() {
        let whitelist = Whitelist::new(["MAILTO:A@X.EDU", "mailto:c@x.edu"]);
        let candidates = btreeset! {"mailto:a@x.edu", "mailto:b@x.edu"};

        let filtered = whitelist.filter(&candidates);

        assert_eq!(filtered, btreeset! {"mailto:a@x.edu"});
    }

    #[test]
    fn 一致しない場合は空集合を返す() {
        let whitelist = Whitelist::new(["mailto:z@x.edu"]);
        let candidates = btreeset! {"mailto:a@x.edu"};

        assert!(whitelist.filter(&candidates).is_empty());
    }

    #[test]
    fn フィルタは入力を変更しない() {
        let whitelist = Whitelist::new(["mailto:a@x.edu"]);
        let candidates = btreeset! {"mailto:a@x.edu", "mailto:b@x.edu"};

        let _ = whitelist.filter(&candidates);

        assert_eq!(candidates.len(), 2);
    }
}
