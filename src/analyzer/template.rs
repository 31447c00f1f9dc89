use std::ops::Range;

use tree_sitter::Node;

use crate::tokenizer::TemplateSegment;

/// `html` タグ付きテンプレートリテラル
pub(super) struct HtmlTemplate {
    /// バッククォートを含むリテラル全体のバイト範囲
    pub range: Range<usize>,
    pub segments: Vec<TemplateSegment>,
    /// 各断片のソース上の開始バイトオフセット
    pub offsets: Vec<usize>,
}

/// `html`...`` 形式の呼び出しであればテンプレートを取り出す
///
/// tree-sitter-javascriptではタグ付きテンプレートは `call_expression` で、
/// `arguments` が `template_string` になる。
pub(super) fn html_template(node: Node, source: &str) -> Option<HtmlTemplate> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || &source[function.byte_range()] != "html" {
        return None;
    }
    let literal = node.child_by_field_name("arguments")?;
    if literal.kind() != "template_string" {
        return None;
    }

    let mut segments = Vec::new();
    let mut offsets = Vec::new();
    let mut push_segment = |start: usize, end: usize| {
        let raw = &source[start..end];
        segments.push(TemplateSegment {
            cooked: cook(raw),
            raw: raw.to_string(),
        });
        offsets.push(start);
    };

    // 開きバッククォートの直後から
    let mut segment_start = literal.start_byte() + 1;
    let mut cursor = literal.walk();
    for child in literal.children(&mut cursor) {
        if child.kind() == "template_substitution" {
            push_segment(segment_start, child.start_byte());
            segment_start = child.end_byte();
        }
    }
    let segment_end = literal.end_byte().saturating_sub(1).max(segment_start);
    push_segment(segment_start, segment_end);

    Some(HtmlTemplate {
        range: literal.byte_range(),
        segments,
        offsets,
    })
}

/// テンプレート断片のエスケープを解釈する
///
/// タグ付きテンプレートと同じく、不正なエスケープがあればNone。
/// 改行コードはLFに揃える。
pub(super) fn cook(raw: &str) -> Option<String> {
    let mut cooked = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                cooked.push('\n');
            }
            '\\' => {
                let escaped = chars.next()?;
                match escaped {
                    'n' => cooked.push('\n'),
                    't' => cooked.push('\t'),
                    'r' => cooked.push('\r'),
                    'b' => cooked.push('\u{8}'),
                    'f' => cooked.push('\u{c}'),
                    'v' => cooked.push('\u{b}'),
                    '0' => {
                        if chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                            return None;
                        }
                        cooked.push('\0');
                    }
                    '1'..='9' => return None,
                    'x' => {
                        let code = take_hex(&mut chars, 2)?;
                        cooked.push(char::from_u32(code)?);
                    }
                    'u' => cooked.push(unicode_escape(&mut chars)?),
                    // 行継続
                    '\r' => {
                        chars.next_if_eq(&'\n');
                    }
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    other => cooked.push(other),
                }
            }
            other => cooked.push(other),
        }
    }
    Some(cooked)
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

/// `\u` の後ろを解釈する。サロゲートペアは結合し、単独サロゲートは置換文字にする
fn unicode_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<char> {
    let code = if chars.next_if_eq(&'{').is_some() {
        let mut value: u32 = 0;
        let mut digits = 0;
        loop {
            let c = chars.next()?;
            if c == '}' {
                break;
            }
            value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
            digits += 1;
        }
        if digits == 0 || value > 0x10FFFF {
            return None;
        }
        value
    } else {
        take_hex(chars, 4)?
    };

    if (0xD800..0xDC00).contains(&code) {
        let mut lookahead = chars.clone();
        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
            if let Some(low) = take_hex(&mut lookahead, 4) {
                if (0xDC00..0xE000).contains(&low) {
                    *chars = lookahead;
                    return char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
                }
            }
        }
    }
    Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
}
