use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Url;

use super::span::Span;

/// 1ドキュメント分の解析結果
///
/// 再解析のたびに丸ごと置き換えられる（マージはしない）。
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub file_path: PathBuf,
    /// 宣言順。重複もそのまま保持する
    pub imports: Vec<ImportEdge>,
    /// タグ名 -> 要素定義（後の登録が前の登録を上書き）
    pub elements: HashMap<String, ElementDefinition>,
    pub templates: Vec<TemplateBlock>,
}

impl AnalysisRecord {
    pub fn element(&self, tag_name: &str) -> Option<&ElementDefinition> {
        self.elements.get(tag_name)
    }

    /// 全テンプレートのトークンをソース順に列挙
    pub fn tokens(&self) -> impl Iterator<Item = &TemplateToken> {
        self.templates.iter().flat_map(|template| template.tokens.iter())
    }
}

/// 相対パスの `.js` import（まだ辿っていないエッジ）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub uri: Url,
    pub file_path: PathBuf,
}

/// カスタム要素の定義（コンストラクタのクラス）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub constructor_name: String,
    /// クラス名識別子の範囲（定義ジャンプ先）
    pub name_span: Span,
    pub properties: Vec<PropertyDescriptor>,
}

/// `static properties()` が返すオブジェクトの1エントリ
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub key: String,
    pub span: Span,
    /// `type: String` などの識別子名
    pub type_name: Option<String>,
    pub internal: bool,
    /// `compute` を持つ、または `readOnly: true`
    pub read_only: bool,
}

/// `html` タグ付きテンプレートリテラル
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateBlock {
    pub span: Span,
    pub tokens: Vec<TemplateToken>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    StartTagName,
    EndTagName,
}

/// テンプレート内のタグ名（ハイフンを含むもののみ保持）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateToken {
    pub kind: TokenKind,
    pub span: Span,
    pub tag_name: String,
}
