use std::ops::Range;

use tree_sitter::{Language, Node, Parser};

use super::{MarkupTokenKind, MarkupTokenizer, TemplateSegment, TokenEvent};
use crate::error::TokenizerError;
use crate::util::walk_preorder;

/// tree-sitter-html によるタグ名トークナイザー
///
/// 断片を連結して1つのHTML片としてパースし、各 `tag_name` ノードを
/// 元の断片内のオフセットに戻して通知する。
/// `${...}` をまたぐタグ名（`<my-${x}>` など）は通知しない。
pub struct HtmlTagTokenizer {
    language: Language,
}

impl HtmlTagTokenizer {
    /// 文法を読み込めるか確認してからトークナイザーを作る
    pub fn load() -> Result<Self, TokenizerError> {
        let language: Language = tree_sitter_html::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        Ok(Self { language })
    }
}

impl MarkupTokenizer for HtmlTagTokenizer {
    fn tokenize(
        &self,
        segments: &[TemplateSegment],
        on_token: &mut dyn FnMut(TokenEvent<'_>),
    ) -> Result<(), TokenizerError> {
        let layout = SegmentLayout::new(segments);
        let source: String = segments.iter().map(|s| s.raw.as_str()).collect();

        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        let tree = parser.parse(&source, None).ok_or(TokenizerError::Parse)?;

        walk_preorder(tree.root_node(), |node| {
            if node.is_error() || node.is_missing() {
                let (segment, offset) = layout.locate(node.start_byte());
                return Err(TokenizerError::Malformed { segment, offset });
            }

            let Some((kind, name)) = token_node(node) else {
                return Ok(());
            };
            if let Some((segment, range)) = layout.relative(name.byte_range()) {
                on_token(TokenEvent {
                    kind,
                    segment,
                    start: range.start,
                    end: range.end,
                    text: &source[name.byte_range()],
                });
            }
            Ok(())
        })
    }
}

/// 通知対象のノードとその種類
///
/// タグ名はタグ側で判定する（`tag_name` より先に訪問される）。
fn token_node(node: Node) -> Option<(MarkupTokenKind, Node)> {
    let kind = match node.kind() {
        "start_tag" | "self_closing_tag" => MarkupTokenKind::StartTagName,
        "end_tag" => MarkupTokenKind::EndTagName,
        "erroneous_end_tag_name" => return Some((MarkupTokenKind::EndTagName, node)),
        "attribute_name" => return Some((MarkupTokenKind::AttributeName, node)),
        _ => return None,
    };
    let name = node
        .named_child(0)
        .filter(|child| child.kind() == "tag_name" && !child.is_missing())?;
    Some((kind, name))
}

/// 連結後の文字列における各断片の開始位置
struct SegmentLayout {
    starts: Vec<usize>,
    lens: Vec<usize>,
}

impl SegmentLayout {
    fn new(segments: &[TemplateSegment]) -> Self {
        let mut starts = Vec::with_capacity(segments.len());
        let mut lens = Vec::with_capacity(segments.len());
        let mut offset = 0;
        for segment in segments {
            starts.push(offset);
            lens.push(segment.raw.len());
            offset += segment.raw.len();
        }
        Self { starts, lens }
    }

    /// 連結後のオフセットを (断片番号, 断片内オフセット) に変換
    fn locate(&self, offset: usize) -> (usize, usize) {
        let index = self
            .starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.starts.get(index).copied().unwrap_or(0);
        (index, offset - start)
    }

    /// 範囲が1つの断片に収まっていれば断片内の範囲を返す
    fn relative(&self, range: Range<usize>) -> Option<(usize, Range<usize>)> {
        let (index, start) = self.locate(range.start);
        let segment_end = self.starts.get(index)? + self.lens.get(index)?;
        if range.end > segment_end {
            return None;
        }
        let end = start + (range.end - range.start);
        Some((index, start..end))
    }
}
