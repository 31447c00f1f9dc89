use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// `customElements.define('tag-name', Constructor)` 形式の登録呼び出し
///
/// テキストに対する単純なパターンマッチで、スコープは考慮しない。
/// 再エクスポート、分割代入や別名での束縛、リテラル以外のタグ名は検出しない。
static REGISTRATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"customElements\.define\('(?P<tag_name>[a-z0-9-]+)', (?P<constructor_name>[A-Za-z0-9]+)\)",
    )
    .expect("registration pattern is valid")
});

/// コンストラクタ名 -> タグ名 の対応を集める
///
/// 同じコンストラクタが複数回登録されていれば後のものが残る。
pub fn scan_registrations(text: &str) -> HashMap<String, String> {
    REGISTRATION_PATTERN
        .captures_iter(text)
        .map(|captures| {
            (
                captures["constructor_name"].to_string(),
                captures["tag_name"].to_string(),
            )
        })
        .collect()
}
