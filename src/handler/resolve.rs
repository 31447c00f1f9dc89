use std::sync::Arc;

use tower_lsp::lsp_types::{LocationLink, Position, Url};

use crate::cache::DocumentStore;
use crate::model::{AnalysisRecord, ElementDefinition, Span, TemplateBlock, TemplateToken};

/// テンプレート内のタグ名から要素定義への参照
#[derive(Clone, Debug, PartialEq)]
pub struct DefinitionLink {
    /// 参照元のタグ名トークンの範囲
    pub origin: Span,
    pub target_uri: Url,
    /// 定義先のクラス名の範囲（表示範囲とジャンプ先を兼ねる）
    pub target: Span,
}

impl DefinitionLink {
    pub fn to_location_link(&self) -> LocationLink {
        LocationLink {
            origin_selection_range: Some(self.origin.to_lsp_range()),
            target_uri: self.target_uri.clone(),
            target_range: self.target.to_lsp_range(),
            target_selection_range: self.target.to_lsp_range(),
        }
    }
}

/// カーソル位置のタグ名トークンを探す
///
/// テンプレートの範囲とトークンの範囲はどちらも開区間で判定する。
pub fn token_at(templates: &[TemplateBlock], position: Position) -> Option<&TemplateToken> {
    templates
        .iter()
        .filter(|template| template.span.encloses(position))
        .flat_map(|template| template.tokens.iter())
        .find(|token| token.span.encloses(position))
}

/// タグ名を定義へ解決する
///
/// 自ファイルの定義を優先し、なければ import 先を宣言順に調べる。
/// キャッシュを読むだけで、未解析の import 先は解析しない。
pub struct Resolver {
    store: Arc<DocumentStore>,
}

impl Resolver {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub fn resolve_definition(&self, uri: &Url, token: &TemplateToken) -> Option<DefinitionLink> {
        let analysis = self.store.analysis(uri)?;
        self.resolve_in(uri, &analysis, token)
            .map(|(link, _)| link)
    }

    /// 定義リンクと、定義先の要素定義を返す
    pub fn resolve_in(
        &self,
        uri: &Url,
        analysis: &AnalysisRecord,
        token: &TemplateToken,
    ) -> Option<(DefinitionLink, ElementDefinition)> {
        let tag_name = token.tag_name.as_str();

        if let Some(element) = analysis.element(tag_name) {
            let link = DefinitionLink {
                origin: token.span,
                target_uri: uri.clone(),
                target: element.name_span,
            };
            return Some((link, element.clone()));
        }

        analysis.imports.iter().find_map(|import| {
            let imported = self.store.analysis(&import.uri)?;
            let element = imported.element(tag_name)?;
            let link = DefinitionLink {
                origin: token.span,
                target_uri: import.uri.clone(),
                target: element.name_span,
            };
            Some((link, element.clone()))
        })
    }
}
