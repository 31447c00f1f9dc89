mod scheduler;

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, ClientSocket, LanguageServer, LspService};
use tracing::{debug, info, warn};

use crate::config::{ClientFlags, DocumentSettings, SETTINGS_SECTION};
use crate::handler::{DefinitionHandler, HoverHandler, full_report};
use crate::session::Session;
use crate::util::display_path;

pub use scheduler::{Debouncer, UPDATE_DELAY};

/// カスタム通知 `custom/activeDocumentChanged` を含めたサービスを組み立てる
pub fn build_service(session: Arc<Session>) -> (LspService<Backend>, ClientSocket) {
    LspService::build(|client| Backend::with_session(client, session))
        .custom_method(
            "custom/activeDocumentChanged",
            Backend::active_document_changed,
        )
        .finish()
}

/// `custom/activeDocumentChanged` 通知のパラメータ
///
/// クライアントがアクティブなエディタを切り替えたときに送られる。
#[derive(Debug, Deserialize)]
pub struct ActiveDocumentParams {
    pub uri: Url,
}

/// 解析から診断の送信までの処理
struct Pipeline {
    client: Client,
    session: Arc<Session>,
    flags: RwLock<ClientFlags>,
    /// `workspace/configuration` 非対応のクライアント用
    global_settings: RwLock<DocumentSettings>,
}

impl Pipeline {
    /// ドキュメントの設定を取得する（初回のみクライアントに問い合わせてキャッシュ）
    async fn document_settings(&self, uri: &Url) -> DocumentSettings {
        if !self.flags.read().await.has_configuration_capability {
            return self.global_settings.read().await.clone();
        }

        let store = self.session.store();
        if let Some(settings) = store.settings(uri) {
            return settings;
        }

        let items = vec![ConfigurationItem {
            scope_uri: Some(uri.clone()),
            section: Some(SETTINGS_SECTION.to_string()),
        }];
        let settings = match self.client.configuration(items).await {
            Ok(mut values) => values
                .pop()
                .map(DocumentSettings::from_value)
                .unwrap_or_default(),
            Err(e) => {
                warn!("workspace/configuration failed for {}: {}", uri, e);
                DocumentSettings::default()
            }
        };
        store.set_settings(uri, settings.clone());
        settings
    }

    async fn run(&self, uri: Url) {
        // 閉じた後に設定を取り直してキャッシュに戻さない
        if !self.session.is_open(&uri) {
            debug!("{} was closed before analysis", uri);
            return;
        }

        let started = Instant::now();
        info!("analyzing {}", display_path(&uri));

        let settings = self.document_settings(&uri).await;
        let Some(diagnostics) = self.session.refresh(&uri, &settings).await else {
            debug!("{} was closed before analysis", uri);
            return;
        };
        self.client.publish_diagnostics(uri, diagnostics, None).await;

        info!("  done    took {:.1} ms", started.elapsed().as_secs_f64() * 1000.0);
    }
}

pub struct Backend {
    pipeline: Arc<Pipeline>,
    scheduler: Debouncer<Url>,
    /// shutdown でキャンセルされる。以降のクエリには結果を返さない
    shutdown: CancellationToken,
}

impl Backend {
    pub fn with_session(client: Client, session: Arc<Session>) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                client,
                session,
                flags: RwLock::new(ClientFlags::default()),
                global_settings: RwLock::new(DocumentSettings::default()),
            }),
            scheduler: Debouncer::new(UPDATE_DELAY),
            shutdown: CancellationToken::new(),
        }
    }

    fn session(&self) -> &Arc<Session> {
        &self.pipeline.session
    }

    /// デバウンス後に解析と診断を実行する
    fn schedule_update(&self, uri: Url) {
        let pipeline = Arc::clone(&self.pipeline);
        self.scheduler
            .schedule(uri.clone(), move || async move { pipeline.run(uri).await });
    }

    pub async fn active_document_changed(&self, params: ActiveDocumentParams) {
        if self.session().is_open(&params.uri) {
            self.schedule_update(params.uri);
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let flags = ClientFlags::from_capabilities(&params.capabilities);
        *self.pipeline.flags.write().await = flags;
        debug!("client flags: {:?}", flags);

        let workspace = flags
            .has_workspace_folder_capability
            .then(|| WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: None,
                }),
                file_operations: None,
            });

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: None,
                        inter_file_dependencies: false,
                        workspace_diagnostics: false,
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                    },
                )),
                workspace,
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let flags = *self.pipeline.flags.read().await;
        if flags.has_configuration_capability {
            let registration = Registration {
                id: "x-element-lsp/didChangeConfiguration".to_string(),
                method: "workspace/didChangeConfiguration".to_string(),
                register_options: None,
            };
            if let Err(e) = self.pipeline.client.register_capability(vec![registration]).await {
                warn!("failed to register for configuration changes: {}", e);
            }
        }

        self.pipeline
            .client
            .log_message(MessageType::INFO, "XElement Language Server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.session()
            .open(document.uri.clone(), document.version, document.text);
        self.schedule_update(document.uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if self
            .session()
            .change(&uri, params.text_document.version, params.content_changes)
        {
            self.schedule_update(uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.session().close(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.pipeline.flags.read().await.has_configuration_capability {
            // 設定は次回の検証時に取り直す
            self.session().store().clear();
        } else {
            *self.pipeline.global_settings.write().await =
                DocumentSettings::from_change(&params.settings);
        }

        for uri in self.session().open_uris() {
            self.schedule_update(uri);
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        debug!(
            "workspace folders changed: +{} -{}",
            params.event.added.len(),
            params.event.removed.len()
        );
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let handler = DefinitionHandler::new(Arc::clone(self.session()));
        Ok(handler.goto_definition(params, &self.shutdown))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let handler = HoverHandler::new(Arc::clone(self.session()));
        Ok(handler.hover(params, &self.shutdown))
    }

    /// 直近の解析結果に基づく診断を返す（ここでは解析し直さない）
    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let uri = params.text_document.uri;
        if self.shutdown.is_cancelled() || !self.session().is_open(&uri) {
            return Ok(full_report(Vec::new()));
        }

        let settings = self.pipeline.document_settings(&uri).await;
        Ok(full_report(self.session().diagnostics(&uri, &settings)))
    }
}
