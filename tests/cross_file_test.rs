//! import をまたいだ定義解決・ホバー・診断の統合テスト
//!
//! 一時ディレクトリに実ファイルを置き、開いたドキュメントからは
//! 直接 import しているファイルだけがディスクから読まれることを確認する。

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::*;

use x_element_lsp::analyzer::MAX_DOCUMENT_CHARACTERS;
use x_element_lsp::config::DocumentSettings;
use x_element_lsp::handler::{DIAGNOSTIC_SOURCE, DefinitionHandler, HoverHandler};
use x_element_lsp::session::Session;

const OK_EL: &str = r#"class OkEl extends HTMLElement {
  static properties() {
    return {
      label: { type: String },
      secret: { type: String, internal: true },
    };
  }
}
customElements.define('ok-el', OkEl);
"#;

const APP: &str = "import './b.js';\nhtml`<ok-el></ok-el><missing-el></missing-el>`;\n";

/// b.js を書き出し、a.js のURIを返す
fn write_fixture(dir: &Path) -> (Url, Url) {
    std::fs::write(dir.join("b.js"), OK_EL).unwrap();
    (
        Url::from_file_path(dir.join("a.js")).unwrap(),
        Url::from_file_path(dir.join("b.js")).unwrap(),
    )
}

fn position_params(uri: &Url, line: u32, character: u32) -> TextDocumentPositionParams {
    TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        position: Position::new(line, character),
    }
}

fn definition_params(uri: &Url, line: u32, character: u32) -> GotoDefinitionParams {
    GotoDefinitionParams {
        text_document_position_params: position_params(uri, line, character),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
    }
}

fn hover_params(uri: &Url, line: u32, character: u32) -> HoverParams {
    HoverParams {
        text_document_position_params: position_params(uri, line, character),
        work_done_progress_params: Default::default(),
    }
}

async fn open_and_refresh(session: &Session, uri: &Url, text: &str) -> Vec<Diagnostic> {
    session.open(uri.clone(), 1, text.to_string());
    session
        .refresh(uri, &DocumentSettings::default())
        .await
        .expect("document is open")
}

#[tokio::test]
async fn test_definition_resolves_through_import() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, b_uri) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    open_and_refresh(&session, &a_uri, APP).await;

    let handler = DefinitionHandler::new(Arc::clone(&session));
    let response = handler
        .goto_definition(definition_params(&a_uri, 1, 8), &CancellationToken::new())
        .expect("definition found");

    let GotoDefinitionResponse::Link(links) = response else {
        panic!("expected location links");
    };
    assert_eq!(links.len(), 1);
    let link = &links[0];
    assert_eq!(link.target_uri, b_uri);
    let constructor = Range::new(Position::new(0, 6), Position::new(0, 10));
    assert_eq!(link.target_range, constructor);
    assert_eq!(link.target_selection_range, constructor);
    assert_eq!(
        link.origin_selection_range,
        Some(Range::new(Position::new(1, 6), Position::new(1, 11)))
    );
}

#[tokio::test]
async fn test_end_tag_also_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, b_uri) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    open_and_refresh(&session, &a_uri, APP).await;

    let handler = DefinitionHandler::new(Arc::clone(&session));
    let link = handler
        .definition_link(&a_uri, Position::new(1, 16), &CancellationToken::new())
        .expect("definition found");
    assert_eq!(link.target_uri, b_uri);
}

#[tokio::test]
async fn test_unresolved_tag_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Session::new();

    let diagnostics = open_and_refresh(&session, &a_uri, APP).await;
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(
        diagnostic.message,
        "Could not find local or imported definition for <missing-el>."
    );
    assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::WARNING));
    assert_eq!(diagnostic.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
    assert_eq!(
        diagnostic.range,
        Range::new(Position::new(1, 21), Position::new(1, 31))
    );
}

#[tokio::test]
async fn test_hover_lists_public_properties() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    open_and_refresh(&session, &a_uri, APP).await;

    let handler = HoverHandler::new(Arc::clone(&session));
    let hover = handler
        .hover(hover_params(&a_uri, 1, 8), &CancellationToken::new())
        .expect("hover found");

    let HoverContents::Markup(markup) = hover.contents else {
        panic!("expected markdown");
    };
    assert_eq!(markup.kind, MarkupKind::Markdown);
    assert!(markup.value.starts_with("**The [ok-el]("));
    assert!(markup.value.contains("#L1,7) element.**"));
    assert!(markup.value.contains("[label]("));
    assert!(markup.value.contains("#L4,7) (String)"));
    assert!(!markup.value.contains("secret"));
    assert_eq!(
        hover.range,
        Some(Range::new(Position::new(1, 6), Position::new(1, 11)))
    );
}

#[tokio::test]
async fn test_cancelled_request_has_no_result() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    open_and_refresh(&session, &a_uri, APP).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(
        DefinitionHandler::new(Arc::clone(&session))
            .goto_definition(definition_params(&a_uri, 1, 8), &cancel)
            .is_none()
    );
    assert!(
        HoverHandler::new(Arc::clone(&session))
            .hover(hover_params(&a_uri, 1, 8), &cancel)
            .is_none()
    );
}

#[tokio::test]
async fn test_closed_document_has_no_result() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    open_and_refresh(&session, &a_uri, APP).await;
    session.close(&a_uri);

    assert!(
        DefinitionHandler::new(Arc::clone(&session))
            .goto_definition(definition_params(&a_uri, 1, 8), &CancellationToken::new())
            .is_none()
    );
}

#[tokio::test]
async fn test_max_number_of_problems_caps_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let a_uri = Url::from_file_path(dir.path().join("a.js")).unwrap();
    let session = Session::new();
    session.open(
        a_uri.clone(),
        1,
        "html`<x-one></x-one><x-two></x-two><x-three></x-three>`;\n".to_string(),
    );

    let settings = DocumentSettings {
        max_number_of_problems: 1,
    };
    let diagnostics = session.refresh(&a_uri, &settings).await.unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("<x-one>"));
}

#[tokio::test]
async fn test_oversized_document_is_inert() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    let text = format!("{APP}// {}\n", "x".repeat(MAX_DOCUMENT_CHARACTERS));

    let diagnostics = open_and_refresh(&session, &a_uri, &text).await;
    assert!(diagnostics.is_empty());
    assert!(!session.store().has_analysis(&a_uri));

    for (line, character) in [(0, 0), (1, 8), (1, 25), (2, 10)] {
        assert!(
            DefinitionHandler::new(Arc::clone(&session))
                .goto_definition(
                    definition_params(&a_uri, line, character),
                    &CancellationToken::new()
                )
                .is_none()
        );
        assert!(
            HoverHandler::new(Arc::clone(&session))
                .hover(hover_params(&a_uri, line, character), &CancellationToken::new())
                .is_none()
        );
    }
}

#[tokio::test]
async fn test_local_definition_preferred_over_import() {
    let dir = tempfile::tempdir().unwrap();
    let (a_uri, _) = write_fixture(dir.path());
    let session = Arc::new(Session::new());
    let text = "import './b.js';\nclass LocalOk {}\ncustomElements.define('ok-el', LocalOk);\nhtml`<ok-el></ok-el>`;\n";
    open_and_refresh(&session, &a_uri, text).await;

    let link = DefinitionHandler::new(Arc::clone(&session))
        .definition_link(&a_uri, Position::new(3, 8), &CancellationToken::new())
        .expect("definition found");
    assert_eq!(link.target_uri, a_uri);
    assert_eq!(
        link.target.to_lsp_range(),
        Range::new(Position::new(1, 6), Position::new(1, 13))
    );
}
