use std::path::{Component, Path, PathBuf};

use tower_lsp::lsp_types::{Position, Url};
use tree_sitter::Node;

/// 構文木を行きがけ順にたどる
///
/// 再帰せず `TreeCursor` だけで移動するので、深くネストした入力でも
/// スタックを消費しない。`visit` がErrを返した時点で打ち切る。
pub fn walk_preorder<'tree, E>(
    root: Node<'tree>,
    mut visit: impl FnMut(Node<'tree>) -> Result<(), E>,
) -> Result<(), E> {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node())?;
        if cursor.goto_first_child() {
            continue;
        }
        // 次の兄弟が見つかるまで親へ戻る。rootまで戻れば終了
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}

/// ログ表示用のパス（file URIでなければURIそのもの）
pub fn display_path(uri: &Url) -> String {
    uri.to_file_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| uri.to_string())
}

/// 行・列付きのファイルリンク
/// 例: "/src/my-button.js#L3,7"（1始まり）
pub fn file_link(uri: &Url, start: Position) -> String {
    format!(
        "{}#L{},{}",
        display_path(uri),
        start.line + 1,
        start.character + 1
    )
}

/// 親ディレクトリを起点として相対パスを解決する
///
/// ファイルシステムには触れず、`.` と `..` を字句的に畳み込む。
pub fn resolve_relative_path(parent_dir: &Path, specifier: &str) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in parent_dir.join(specifier).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}
