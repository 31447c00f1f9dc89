use serde::Deserialize;
use serde_json::Value;
use tower_lsp::lsp_types::ClientCapabilities;

/// `workspace/configuration` で要求するセクション名
pub const SETTINGS_SECTION: &str = "XElement";

/// ドキュメントごとの診断設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    /// 1回の検証で報告する警告の上限（デフォルト: 100）
    #[serde(default = "default_max_number_of_problems")]
    pub max_number_of_problems: usize,
}

fn default_max_number_of_problems() -> usize {
    100
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            max_number_of_problems: default_max_number_of_problems(),
        }
    }
}

impl DocumentSettings {
    /// クライアントから受け取ったJSON値を解釈する。解釈できなければデフォルト
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("Invalid {} settings, using defaults: {}", SETTINGS_SECTION, e);
            Self::default()
        })
    }

    /// `workspace/didChangeConfiguration` の `settings` からセクションを取り出す
    pub fn from_change(settings: &Value) -> Self {
        settings
            .get(SETTINGS_SECTION)
            .cloned()
            .map(Self::from_value)
            .unwrap_or_default()
    }
}

/// initialize時に判定するクライアント機能
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFlags {
    pub has_configuration_capability: bool,
    pub has_workspace_folder_capability: bool,
    pub has_diagnostic_related_information_capability: bool,
}

impl ClientFlags {
    pub fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        Self {
            has_configuration_capability: workspace
                .and_then(|w| w.configuration)
                .unwrap_or(false),
            has_workspace_folder_capability: workspace
                .and_then(|w| w.workspace_folders)
                .unwrap_or(false),
            has_diagnostic_related_information_capability: capabilities
                .text_document
                .as_ref()
                .and_then(|t| t.publish_diagnostics.as_ref())
                .and_then(|p| p.related_information)
                .unwrap_or(false),
        }
    }
}
