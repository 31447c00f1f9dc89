use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::*;

use super::resolve::{DefinitionLink, Resolver, token_at};
use crate::session::Session;

pub struct DefinitionHandler {
    session: Arc<Session>,
}

impl DefinitionHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn goto_definition(
        &self,
        params: GotoDefinitionParams,
        cancel: &CancellationToken,
    ) -> Option<GotoDefinitionResponse> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let link = self.definition_link(&uri, position, cancel)?;
        Some(GotoDefinitionResponse::Link(vec![link.to_location_link()]))
    }

    /// 開いているドキュメントのカーソル位置から定義リンクを求める
    ///
    /// キャンセル済み、未オープン、未解析のいずれでもNone。
    pub fn definition_link(
        &self,
        uri: &Url,
        position: Position,
        cancel: &CancellationToken,
    ) -> Option<DefinitionLink> {
        if cancel.is_cancelled() || !self.session.is_open(uri) {
            return None;
        }

        let analysis = self.session.store().analysis(uri)?;
        let token = token_at(&analysis.templates, position)?;
        let resolver = Resolver::new(Arc::clone(self.session.store()));
        resolver
            .resolve_in(uri, &analysis, token)
            .map(|(link, _)| link)
    }
}
