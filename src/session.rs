use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::{Diagnostic, TextDocumentContentChangeEvent, Url};

use crate::analyzer::{AnalyzeOptions, DocumentAnalyzer};
use crate::cache::DocumentStore;
use crate::config::DocumentSettings;
use crate::document::TextDocument;
use crate::handler::DiagnosticsHandler;

/// 開いているドキュメントと解析キャッシュをまとめたサーバー状態
///
/// プロトコル層（`Client`）に依存しないので、テストから直接使える。
pub struct Session {
    documents: DashMap<Url, TextDocument>,
    store: Arc<DocumentStore>,
    analyzer: DocumentAnalyzer,
}

impl Session {
    pub fn new() -> Self {
        Self::with_store(Arc::new(DocumentStore::new()))
    }

    pub fn with_store(store: Arc<DocumentStore>) -> Self {
        Self::with_analyzer(DocumentAnalyzer::new(Arc::clone(&store)))
    }

    pub fn with_analyzer(analyzer: DocumentAnalyzer) -> Self {
        Self {
            documents: DashMap::new(),
            store: Arc::clone(analyzer.store()),
            analyzer,
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn open(&self, uri: Url, version: i32, text: String) {
        self.documents
            .insert(uri.clone(), TextDocument::new(uri, version, text));
    }

    /// 変更を適用する。開いていないドキュメントなら何もしない
    pub fn change(
        &self,
        uri: &Url,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> bool {
        match self.documents.get_mut(uri) {
            Some(mut document) => {
                document.apply_changes(changes, version);
                true
            }
            None => false,
        }
    }

    /// ドキュメントを閉じる。キャッシュからは設定だけを破棄する
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
        self.store.clear_settings(uri);
    }

    /// 開いているドキュメントのスナップショット
    pub fn document(&self, uri: &Url) -> Option<TextDocument> {
        self.documents.get(uri).map(|document| document.clone())
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn open_uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    /// 最新のテキストで解析し直し、診断を返す
    ///
    /// ドキュメントが閉じられていればNone。解析に失敗しても、
    /// 直前の解析結果があればそれに基づく診断を返す。
    pub async fn refresh(&self, uri: &Url, settings: &DocumentSettings) -> Option<Vec<Diagnostic>> {
        let document = self.document(uri)?;
        self.analyzer
            .analyze(&document, AnalyzeOptions { parse_imports: true })
            .await;

        Some(self.diagnostics(uri, settings))
    }

    /// キャッシュ済みの解析結果だけで診断する（解析し直さない）
    pub fn diagnostics(&self, uri: &Url, settings: &DocumentSettings) -> Vec<Diagnostic> {
        DiagnosticsHandler::new(Arc::clone(&self.store), settings.clone()).diagnose(uri)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
