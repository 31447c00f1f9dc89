use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{Position, Range};

/// 位置情報の統一型（列はUTF-16単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn from_positions(start: Position, end: Position) -> Self {
        Self::new(start.line, start.character, end.line, end.character)
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_col)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_col)
    }

    /// 指定位置がスパンの内側にあるかチェック
    ///
    /// 開区間で判定する。開始位置ちょうど・終了位置ちょうどは含まない。
    pub fn encloses(&self, position: Position) -> bool {
        compare_positions(self.start(), position) == Ordering::Less
            && compare_positions(self.end(), position) == Ordering::Greater
    }

    /// LSP Range に変換
    pub fn to_lsp_range(&self) -> Range {
        Range {
            start: self.start(),
            end: self.end(),
        }
    }
}

/// 行、列の順で位置を比較する
pub fn compare_positions(a: Position, b: Position) -> Ordering {
    a.line
        .cmp(&b.line)
        .then_with(|| a.character.cmp(&b.character))
}
