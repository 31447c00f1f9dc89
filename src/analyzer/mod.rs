//! ドキュメント解析
//!
//! JSモジュールから `html` テンプレート内のカスタム要素タグ、
//! 登録済み要素のクラス定義、相対 `.js` import を取り出し、
//! 結果を [`DocumentStore`] に書き込む。

mod element;
mod extract;
mod import;
mod parser;
mod registration;
mod template;


use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::OnceCell;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::cache::DocumentStore;
use crate::document::TextDocument;
use crate::error::{AnalyzerError, ImportError};
use crate::model::{AnalysisRecord, ImportEdge};
use crate::tokenizer::{MarkupTokenizer, TokenizerLoader, load_html_tokenizer};
use crate::util::display_path;

pub use extract::extract;
pub use parser::JsParser;
pub use registration::scan_registrations;

/// これを超える長さ（UTF-16単位）のドキュメントは解析しない
pub const MAX_DOCUMENT_CHARACTERS: usize = 300_000;

#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyzeOptions {
    /// テンプレートを持つ場合、直接importしている未解析ファイルも解析する
    pub parse_imports: bool,
}

pub struct DocumentAnalyzer {
    store: Arc<DocumentStore>,
    tokenizer: OnceCell<Arc<dyn MarkupTokenizer>>,
    loader: TokenizerLoader,
    /// 読み込み中のimport先（二重読み込み防止）
    importing: DashSet<Url>,
}

impl DocumentAnalyzer {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self::with_tokenizer_loader(store, load_html_tokenizer)
    }

    pub fn with_tokenizer_loader(store: Arc<DocumentStore>, loader: TokenizerLoader) -> Self {
        Self {
            store,
            tokenizer: OnceCell::new(),
            loader,
            importing: DashSet::new(),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// ドキュメントを解析してキャッシュの解析結果を置き換える
    ///
    /// 失敗した場合はキャッシュを変更せずNoneを返す（直前の結果が残る）。
    pub async fn analyze(
        &self,
        document: &TextDocument,
        options: AnalyzeOptions,
    ) -> Option<Arc<AnalysisRecord>> {
        let record = match self.analyze_single(document).await {
            Ok(record) => record,
            Err(e) => {
                debug!("skipped {}: {}", document.uri(), e);
                return None;
            }
        };

        if options.parse_imports && !record.templates.is_empty() {
            for edge in &record.imports {
                self.materialize_import(edge).await;
            }
        }

        Some(record)
    }

    async fn analyze_single(
        &self,
        document: &TextDocument,
    ) -> Result<Arc<AnalysisRecord>, AnalyzerError> {
        let length = document.utf16_len();
        if length > MAX_DOCUMENT_CHARACTERS {
            return Err(AnalyzerError::Oversized {
                length,
                limit: MAX_DOCUMENT_CHARACTERS,
            });
        }

        let tokenizer = self.tokenizer().await?;
        debug!("parsing {}", display_path(document.uri()));

        let owned = document.clone();
        let record = tokio::task::spawn_blocking(move || extract(&owned, tokenizer.as_ref()))
            .await
            .map_err(|e| AnalyzerError::Worker(e.to_string()))??;

        Ok(self.store.set_analysis(document.uri(), record))
    }

    /// 初回のみローダーを呼ぶ。失敗した場合は次回に再試行する
    async fn tokenizer(&self) -> Result<Arc<dyn MarkupTokenizer>, AnalyzerError> {
        let tokenizer = self
            .tokenizer
            .get_or_try_init(|| async { (self.loader)() })
            .await?;
        Ok(Arc::clone(tokenizer))
    }

    /// 未解析のimport先を読み込んで解析する（その先のimportは辿らない）
    async fn materialize_import(&self, edge: &ImportEdge) {
        if self.store.has_analysis(&edge.uri) || !self.importing.insert(edge.uri.clone()) {
            return;
        }

        match read_import(edge).await {
            Ok(document) => {
                if let Err(e) = self.analyze_single(&document).await {
                    debug!("import {} not analyzed: {}", edge.uri, e);
                }
            }
            Err(e) => debug!("{}", e),
        }

        self.importing.remove(&edge.uri);
    }
}

async fn read_import(edge: &ImportEdge) -> Result<TextDocument, ImportError> {
    let text = tokio::fs::read_to_string(&edge.file_path)
        .await
        .map_err(|source| ImportError::Unreadable {
            path: edge.file_path.clone(),
            source,
        })?;
    Ok(TextDocument::new(edge.uri.clone(), 1, text))
}
