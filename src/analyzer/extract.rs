use std::collections::HashMap;
use std::convert::Infallible;

use tracing::debug;
use tree_sitter::Node;

use super::element::element_definition;
use super::import::import_edge;
use super::parser::JsParser;
use super::registration::scan_registrations;
use super::template::html_template;
use crate::document::TextDocument;
use crate::error::AnalyzerError;
use crate::model::{AnalysisRecord, Span, TemplateBlock, TemplateToken, TokenKind};
use crate::tokenizer::{MarkupTokenKind, MarkupTokenizer};
use crate::util::walk_preorder;

/// 1ドキュメントからAnalysisRecordを組み立てる
///
/// CPUのみを使う同期処理。import先は読まない。
pub fn extract(
    document: &TextDocument,
    tokenizer: &dyn MarkupTokenizer,
) -> Result<AnalysisRecord, AnalyzerError> {
    let uri = document.uri();
    let file_path = uri
        .to_file_path()
        .map_err(|_| AnalyzerError::NotAFile(uri.clone()))?;

    let source = document.text();
    let mut parser = JsParser::new();
    let tree = parser
        .parse_module(source)
        .ok_or_else(|| AnalyzerError::SyntaxParseFailure(uri.clone()))?;

    let mut extractor = Extractor {
        source,
        document,
        tokenizer,
        registrations: scan_registrations(source),
        record: AnalysisRecord {
            file_path,
            ..Default::default()
        },
    };
    walk_preorder(tree.root_node(), |node| {
        extractor.visit_node(node);
        Ok::<(), Infallible>(())
    })
    .unwrap_or_else(|never| match never {});
    Ok(extractor.record)
}

struct Extractor<'a> {
    source: &'a str,
    document: &'a TextDocument,
    tokenizer: &'a dyn MarkupTokenizer,
    /// コンストラクタ名 -> タグ名
    registrations: HashMap<String, String>,
    record: AnalysisRecord,
}

impl Extractor<'_> {
    /// ASTノードを1つ訪問し、種類に応じた解析を行う（子は呼び出し側がたどる）
    ///
    /// 認識するノード:
    /// - `call_expression`: `html`...`` タグ付きテンプレート
    /// - `class_declaration`: 登録済みのカスタム要素クラス
    /// - `import_statement`: 相対パスの `.js` import
    fn visit_node(&mut self, node: Node) {
        match node.kind() {
            "call_expression" => self.analyze_template(node),
            "class_declaration" => self.analyze_class(node),
            "import_statement" => self.analyze_import(node),
            _ => {}
        }
    }

    fn analyze_template(&mut self, node: Node) {
        let Some(template) = html_template(node, self.source) else {
            return;
        };

        let document = self.document;
        let offsets = &template.offsets;
        let mut tokens = Vec::new();
        let result = self.tokenizer.tokenize(&template.segments, &mut |event| {
            let kind = match event.kind {
                MarkupTokenKind::StartTagName => TokenKind::StartTagName,
                MarkupTokenKind::EndTagName => TokenKind::EndTagName,
                MarkupTokenKind::AttributeName => return,
            };
            // カスタム要素名には必ずハイフンが含まれる
            if !event.text.contains('-') {
                return;
            }
            let Some(&base) = offsets.get(event.segment) else {
                return;
            };
            tokens.push(TemplateToken {
                kind,
                span: Span::from_positions(
                    document.position_at(base + event.start),
                    document.position_at(base + event.end),
                ),
                tag_name: event.text.to_string(),
            });
        });
        if let Err(e) = result {
            debug!(
                "tokenizer stopped early in {} ({} tokens kept): {}",
                document.uri(),
                tokens.len(),
                e
            );
        }

        self.record.templates.push(TemplateBlock {
            span: Span::from_positions(
                document.position_at(template.range.start),
                document.position_at(template.range.end),
            ),
            tokens,
        });
    }

    fn analyze_class(&mut self, node: Node) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let Some(tag_name) = self.registrations.get(&self.source[name.byte_range()]) else {
            return;
        };
        let definition = element_definition(node, name, self.source, self.document);
        debug!(
            "element <{}> defined by {} at {:?}",
            tag_name, definition.constructor_name, definition.name_span
        );
        self.record.elements.insert(tag_name.clone(), definition);
    }

    fn analyze_import(&mut self, node: Node) {
        if let Some(edge) = import_edge(node, self.source, &self.record.file_path) {
            self.record.imports.push(edge);
        }
    }
}
