use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Url;
use tree_sitter::Node;

use crate::model::ImportEdge;
use crate::util::resolve_relative_path;

/// `./` か `../` で始まり `.js` で終わる指定子だけを辿る
static RELATIVE_JS_SPECIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.+/.*\.js$").expect("import pattern is valid"));

/// import文からimportエッジを作る
///
/// 認識パターン:
/// ```javascript
/// import './my-button.js';
/// import { MyCard } from '../cards/my-card.js';
/// ```
/// パッケージ名や拡張子なしの指定子は対象外。
pub(super) fn import_edge(node: Node, source: &str, importer: &Path) -> Option<ImportEdge> {
    let specifier = node.child_by_field_name("source")?;
    let raw = &source[specifier.byte_range()];
    let value = raw.get(1..raw.len().saturating_sub(1))?;
    if !RELATIVE_JS_SPECIFIER.is_match(value) {
        return None;
    }

    let file_path = resolve_relative_path(importer.parent()?, value);
    let uri = Url::from_file_path(&file_path).ok()?;
    Some(ImportEdge { uri, file_path })
}
