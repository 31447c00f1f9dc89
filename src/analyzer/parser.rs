use tree_sitter::{Parser, Tree};

/// JavaScript（ESモジュール）のパーサー
pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("Failed to load JavaScript grammar");

        Self { parser }
    }

    /// モジュールとしてパースする
    ///
    /// tree-sitterはエラーを含んでも木を返すが、ここでは構文エラーを
    /// 含む木はパース失敗として扱う（直前の解析結果を残すため）。
    pub fn parse_module(&mut self, source: &str) -> Option<Tree> {
        self.parser
            .parse(source, None)
            .filter(|tree| !tree.root_node().has_error())
    }
}

impl Default for JsParser {
    fn default() -> Self {
        Self::new()
    }
}
