use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::*;

use super::resolve::{DefinitionLink, Resolver, token_at};
use crate::model::ElementDefinition;
use crate::session::Session;
use crate::util::file_link;

pub struct HoverHandler {
    session: Arc<Session>,
}

impl HoverHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn hover(&self, params: HoverParams, cancel: &CancellationToken) -> Option<Hover> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        if cancel.is_cancelled() || !self.session.is_open(&uri) {
            return None;
        }

        let analysis = self.session.store().analysis(&uri)?;
        let token = token_at(&analysis.templates, position)?;
        let resolver = Resolver::new(Arc::clone(self.session.store()));
        let (link, element) = resolver.resolve_in(&uri, &analysis, token)?;

        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: render_element(&token.tag_name, &link, &element),
            }),
            range: Some(link.origin.to_lsp_range()),
        })
    }
}

/// 要素名と公開プロパティの一覧をMarkdownにする
///
/// ```text
/// **The [my-button](/src/my-button.js#L3,7) element.**
///
/// [label](/src/my-button.js#L6,7) (String)
///
/// [pressed](/src/my-button.js#L8,7) [read-only] (Boolean)
/// ```
pub fn render_element(tag_name: &str, link: &DefinitionLink, element: &ElementDefinition) -> String {
    let mut value = format!(
        "**The [{}]({}) element.**",
        tag_name,
        file_link(&link.target_uri, link.target.start())
    );

    for property in element.properties.iter().filter(|p| !p.internal) {
        value.push_str(&format!(
            "\n\n[{}]({})",
            property.key,
            file_link(&link.target_uri, property.span.start())
        ));
        if property.read_only {
            value.push_str(" [read-only]");
        }
        if let Some(type_name) = &property.type_name {
            value.push_str(&format!(" ({type_name})"));
        }
    }

    value
}
