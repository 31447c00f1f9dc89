use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tower_lsp::lsp_types::Url;

use super::lru::RecencyCache;
use crate::config::DocumentSettings;
use crate::model::AnalysisRecord;

/// 保持するドキュメント数の上限
///
/// 開いているファイルを絞るためではなく、メモリ使用量に上限を設けるための値。
pub const DOCUMENT_CACHE_CAPACITY: usize = 10_000;

/// URIごとのキャッシュエントリ
#[derive(Clone, Debug, Default)]
pub struct CacheEntry {
    /// 遅延取得した診断設定
    pub settings: Option<DocumentSettings>,
    /// 一度も解析に成功していなければNone
    pub analysis: Option<Arc<AnalysisRecord>>,
}

/// 全コンポーネントで共有するドキュメントキャッシュ
///
/// 参照系のメソッドも get-or-create でエントリを作り、アクセス順を更新する。
pub struct DocumentStore {
    entries: Mutex<RecencyCache<Url, CacheEntry>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::with_capacity(DOCUMENT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(RecencyCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecencyCache<Url, CacheEntry>> {
        // 書き込み途中でpanicしてもキャッシュ自体は壊れないのでそのまま使う
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn analysis(&self, uri: &Url) -> Option<Arc<AnalysisRecord>> {
        self.lock().get(uri).analysis.clone()
    }

    pub fn has_analysis(&self, uri: &Url) -> bool {
        self.lock().get(uri).analysis.is_some()
    }

    /// 解析結果を丸ごと置き換える
    pub fn set_analysis(&self, uri: &Url, analysis: AnalysisRecord) -> Arc<AnalysisRecord> {
        let analysis = Arc::new(analysis);
        self.lock().get(uri).analysis = Some(Arc::clone(&analysis));
        analysis
    }

    pub fn settings(&self, uri: &Url) -> Option<DocumentSettings> {
        self.lock().get(uri).settings.clone()
    }

    pub fn set_settings(&self, uri: &Url, settings: DocumentSettings) {
        self.lock().get(uri).settings = Some(settings);
    }

    /// 設定だけを破棄する（解析結果は残す）
    pub fn clear_settings(&self, uri: &Url) {
        self.lock().get(uri).settings = None;
    }

    /// 全エントリを破棄する
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.lock().contains_key(uri)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///src/{name}")).unwrap()
    }

    #[test]
    fn test_lookup_creates_entry() {
        let store = DocumentStore::new();
        assert!(store.analysis(&uri("a.js")).is_none());
        assert!(store.contains(&uri("a.js")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_analysis_replaces_record() {
        let store = DocumentStore::new();
        let first = AnalysisRecord {
            file_path: "/src/a.js".into(),
            ..Default::default()
        };
        store.set_analysis(&uri("a.js"), first);

        let second = AnalysisRecord {
            file_path: "/src/other.js".into(),
            ..Default::default()
        };
        store.set_analysis(&uri("a.js"), second);

        let analysis = store.analysis(&uri("a.js")).unwrap();
        assert_eq!(analysis.file_path, std::path::PathBuf::from("/src/other.js"));
    }

    #[test]
    fn test_clear_settings_keeps_analysis() {
        let store = DocumentStore::new();
        store.set_analysis(&uri("a.js"), AnalysisRecord::default());
        store.set_settings(&uri("a.js"), DocumentSettings::default());

        store.clear_settings(&uri("a.js"));

        assert!(store.settings(&uri("a.js")).is_none());
        assert!(store.has_analysis(&uri("a.js")));
    }

    #[test]
    fn test_clear_drops_everything() {
        let store = DocumentStore::new();
        store.set_analysis(&uri("a.js"), AnalysisRecord::default());
        store.set_analysis(&uri("b.js"), AnalysisRecord::default());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_eviction_drops_least_recent_document() {
        let store = DocumentStore::with_capacity(1);
        store.set_analysis(&uri("a.js"), AnalysisRecord::default());
        store.set_analysis(&uri("b.js"), AnalysisRecord::default());
        // a.js を参照して最新にする
        assert!(store.has_analysis(&uri("a.js")));
        store.set_analysis(&uri("c.js"), AnalysisRecord::default());

        assert!(store.contains(&uri("a.js")));
        assert!(!store.contains(&uri("b.js")));
        assert!(store.contains(&uri("c.js")));
    }
}
