use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// ドキュメント解析エラー
///
/// いずれもサーバー内部で吸収される。呼び出し側に見えるのは
/// 「このドキュメントについて新しい情報が得られなかった」ことだけ。
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("document is {length} characters long, limit is {limit}")]
    Oversized { length: usize, limit: usize },

    #[error("not a file uri: {0}")]
    NotAFile(Url),

    #[error("syntax error in {0}")]
    SyntaxParseFailure(Url),

    #[error("markup tokenizer unavailable: {0}")]
    TokenizerUnavailable(#[from] TokenizerError),

    #[error("analysis worker failed: {0}")]
    Worker(String),
}

/// マークアップトークナイザーのエラー
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load HTML grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("tokenizer produced no tree")]
    Parse,

    #[error("malformed markup in segment {segment} at offset {offset}")]
    Malformed { segment: usize, offset: usize },
}

/// import先ファイルの読み込みエラー
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
