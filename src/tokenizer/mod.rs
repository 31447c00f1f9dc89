//! テンプレートリテラルのマークアップをタグ名トークンに分解する機能
//!
//! アナライザーからは `MarkupTokenizer` トレイトとしてのみ見える。
//! 実体は初回利用時に一度だけロードされ、以降は共有される。

mod html;

use std::sync::Arc;

use crate::error::TokenizerError;

pub use html::HtmlTagTokenizer;

/// テンプレートリテラルの文字列部分（`${...}` で区切られた断片）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSegment {
    /// エスケープ解釈後の文字列。不正なエスケープを含む場合はNone
    pub cooked: Option<String>,
    /// ソース上の文字列そのまま
    pub raw: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupTokenKind {
    StartTagName,
    EndTagName,
    AttributeName,
}

/// トークン1件分の通知
///
/// `start` / `end` は `segment` 番目の断片（raw）先頭からのバイトオフセット。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenEvent<'a> {
    pub kind: MarkupTokenKind,
    pub segment: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

pub trait MarkupTokenizer: Send + Sync {
    /// 断片列をトークン化し、トークンごとに `on_token` を呼ぶ
    ///
    /// エラーを返す場合でも、それまでに通知したトークンは有効。
    fn tokenize(
        &self,
        segments: &[TemplateSegment],
        on_token: &mut dyn FnMut(TokenEvent<'_>),
    ) -> Result<(), TokenizerError>;
}

/// トークナイザーを生成する関数（ロードは一度だけ行われる）
pub type TokenizerLoader = fn() -> Result<Arc<dyn MarkupTokenizer>, TokenizerError>;

/// デフォルトのローダー（tree-sitter-html）
pub fn load_html_tokenizer() -> Result<Arc<dyn MarkupTokenizer>, TokenizerError> {
    let tokenizer: Arc<dyn MarkupTokenizer> = Arc::new(HtmlTagTokenizer::load()?);
    Ok(tokenizer)
}
