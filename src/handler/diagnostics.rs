use std::sync::Arc;

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, DocumentDiagnosticReport, DocumentDiagnosticReportResult,
    FullDocumentDiagnosticReport, RelatedFullDocumentDiagnosticReport, Url,
};
use tracing::debug;

use super::resolve::Resolver;
use crate::cache::DocumentStore;
use crate::config::DocumentSettings;
use crate::model::TokenKind;

pub const DIAGNOSTIC_SOURCE: &str = "XElement";

/// 診断ハンドラー
///
/// 開始タグのうち、自ファイルにも直接の import 先にも定義がないものを警告する。
pub struct DiagnosticsHandler {
    store: Arc<DocumentStore>,
    settings: DocumentSettings,
}

impl DiagnosticsHandler {
    pub fn new(store: Arc<DocumentStore>, settings: DocumentSettings) -> Self {
        Self { store, settings }
    }

    /// 解析済みのドキュメントを検証する
    ///
    /// 解析結果がなければ空。件数は `maxNumberOfProblems` で打ち切る。
    pub fn diagnose(&self, uri: &Url) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let Some(analysis) = self.store.analysis(uri) else {
            return diagnostics;
        };

        let resolver = Resolver::new(Arc::clone(&self.store));
        let limit = self.settings.max_number_of_problems;
        for token in analysis.tokens() {
            if diagnostics.len() >= limit {
                debug!("diagnostics for {} capped at {}", uri, limit);
                break;
            }
            if token.kind != TokenKind::StartTagName {
                continue;
            }
            if resolver.resolve_in(uri, &analysis, token).is_some() {
                continue;
            }

            diagnostics.push(Diagnostic {
                range: token.span.to_lsp_range(),
                severity: Some(DiagnosticSeverity::WARNING),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: format!(
                    "Could not find local or imported definition for <{}>.",
                    token.tag_name
                ),
                ..Default::default()
            });
        }

        diagnostics
    }
}

/// `textDocument/diagnostic` への応答（常に全件を返す）
pub fn full_report(items: Vec<Diagnostic>) -> DocumentDiagnosticReportResult {
    DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
        RelatedFullDocumentDiagnosticReport {
            related_documents: None,
            full_document_diagnostic_report: FullDocumentDiagnosticReport {
                result_id: None,
                items,
            },
        },
    ))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::model::{AnalysisRecord, ElementDefinition, Span, TemplateBlock, TemplateToken};

    fn uri() -> Url {
        Url::parse("file:///project/app.js").unwrap()
    }

    fn token(kind: TokenKind, tag_name: &str, col: u32) -> TemplateToken {
        TemplateToken {
            kind,
            span: Span::new(1, col, 1, col + tag_name.len() as u32),
            tag_name: tag_name.to_string(),
        }
    }

    fn store_with(tokens: Vec<TemplateToken>) -> Arc<DocumentStore> {
        let store = Arc::new(DocumentStore::new());
        let mut record = AnalysisRecord {
            templates: vec![TemplateBlock {
                span: Span::new(0, 0, 5, 0),
                tokens,
            }],
            ..Default::default()
        };
        record.elements.insert(
            "ok-el".to_string(),
            ElementDefinition {
                constructor_name: "OkEl".to_string(),
                name_span: Span::new(0, 6, 0, 10),
                properties: Vec::new(),
            },
        );
        store.set_analysis(&uri(), record);
        store
    }

    fn settings(max_number_of_problems: usize) -> DocumentSettings {
        DocumentSettings {
            max_number_of_problems,
        }
    }

    #[test]
    fn test_unresolved_start_tag() {
        let store = store_with(vec![
            token(TokenKind::StartTagName, "ok-el", 1),
            token(TokenKind::EndTagName, "ok-el", 10),
            token(TokenKind::StartTagName, "missing-el", 20),
            token(TokenKind::EndTagName, "missing-el", 35),
        ]);
        let diagnostics = DiagnosticsHandler::new(store, DocumentSettings::default()).diagnose(&uri());

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(
            diagnostic.message,
            "Could not find local or imported definition for <missing-el>."
        );
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diagnostic.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
        assert_eq!(diagnostic.range, Span::new(1, 20, 1, 30).to_lsp_range());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(100, 3)]
    fn test_max_number_of_problems(#[case] max: usize, #[case] expected: usize) {
        let store = store_with(vec![
            token(TokenKind::StartTagName, "a-one", 1),
            token(TokenKind::StartTagName, "a-two", 10),
            token(TokenKind::StartTagName, "a-three", 20),
        ]);
        let diagnostics = DiagnosticsHandler::new(store, settings(max)).diagnose(&uri());
        assert_eq!(diagnostics.len(), expected);
    }

    #[test]
    fn test_full_report_carries_items() {
        let store = store_with(vec![token(TokenKind::StartTagName, "missing-el", 1)]);
        let diagnostics = DiagnosticsHandler::new(store, DocumentSettings::default()).diagnose(&uri());

        let DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(report)) =
            full_report(diagnostics.clone())
        else {
            panic!("expected a full report");
        };
        assert!(report.related_documents.is_none());
        assert!(report.full_document_diagnostic_report.result_id.is_none());
        assert_eq!(report.full_document_diagnostic_report.items, diagnostics);
    }

    #[test]
    fn test_no_analysis_no_diagnostics() {
        let store = Arc::new(DocumentStore::new());
        let diagnostics = DiagnosticsHandler::new(store, DocumentSettings::default()).diagnose(&uri());
        assert!(diagnostics.is_empty());
    }
}
