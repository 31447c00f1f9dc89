use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

/// エディタで開かれているドキュメント
///
/// テキストはUTF-8で保持し、LSPの `Position.character` はUTF-16単位で扱う。
#[derive(Clone, Debug)]
pub struct TextDocument {
    uri: Url,
    version: i32,
    text: String,
    /// 各行の先頭バイトオフセット
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(uri: Url, version: i32, text: String) -> Self {
        let line_starts = compute_line_starts(&text);
        Self {
            uri,
            version,
            text,
            line_starts,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// JavaScriptの `String.length` 相当（UTF-16コードユニット数）
    pub fn utf16_len(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// バイトオフセットを位置に変換
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = self.clamp_offset(offset);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].encode_utf16().count();
        Position::new(line as u32, character as u32)
    }

    /// 位置をバイトオフセットに変換
    ///
    /// 行末を越える列は行末（改行の手前）に丸める。
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.text.len();
        }
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let line_text = self.text[line_start..line_end].trim_end_matches(['\n', '\r']);

        let mut units = 0u32;
        for (idx, ch) in line_text.char_indices() {
            if units >= position.character {
                return line_start + idx;
            }
            units += ch.len_utf16() as u32;
        }
        line_start + line_text.len()
    }

    /// 変更イベントを順番に適用する（全体置換・範囲置換の両方に対応）
    pub fn apply_changes(&mut self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = self.offset_at(range.start);
                    let end = self.offset_at(range.end).max(start);
                    self.text.replace_range(start..end, &change.text);
                }
                None => self.text = change.text,
            }
            self.line_starts = compute_line_starts(&self.text);
        }
        self.version = version;
    }

    fn clamp_offset(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => starts.push(i + 1),
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                starts.push(i + 1);
            }
            _ => {}
        }
        i += 1;
    }
    starts
}
