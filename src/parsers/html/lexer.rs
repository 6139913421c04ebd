//! HTML 词法切分
//!
//! 把 HTML 文本切成标签、注释、文本三类记号，供分块翻译使用。
//! 只保证边界正确，不做结构校验：
//!
//! - 标签内部跟踪引号，属性值中的 `>` 不会结束标签
//! - `<script>` / `<style>` 等原始文本元素的内容作为一个记号，直到对应的结束标签
//! - 未闭合的标签或注释，剩余输入整体作为文本记号
//!
//! 所有记号按顺序拼接后与输入完全相同。

/// 记号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Tag,
    Comment,
    Text,
    /// 原始文本元素（script/style 等）的内容
    RawText,
}

/// 词法记号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlToken<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> HtmlToken<'a> {
    fn new(kind: TokenKind, text: &'a str) -> Self {
        Self { kind, text }
    }

    /// 是否包含需要翻译的可见文本
    pub fn has_visible_text(&self) -> bool {
        self.kind == TokenKind::Text && !self.text.trim().is_empty()
    }
}

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// 切分 HTML
pub fn tokenize(html: &str) -> Vec<HtmlToken<'_>> {
    let bytes = html.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        if bytes[pos] != b'<' {
            let end = html[pos..].find('<').map_or(html.len(), |i| pos + i);
            tokens.push(HtmlToken::new(TokenKind::Text, &html[pos..end]));
            pos = end;
            continue;
        }

        let rest = &html[pos..];

        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(i) => {
                    let end = pos + 4 + i + 3;
                    tokens.push(HtmlToken::new(TokenKind::Comment, &html[pos..end]));
                    pos = end;
                }
                None => {
                    tokens.push(HtmlToken::new(TokenKind::Text, rest));
                    pos = html.len();
                }
            }
            continue;
        }

        if !starts_tag(rest) {
            // 孤立的 '<'（例如 "a < b"），并入文本
            let end = html[pos + 1..].find('<').map_or(html.len(), |i| pos + 1 + i);
            tokens.push(HtmlToken::new(TokenKind::Text, &html[pos..end]));
            pos = end;
            continue;
        }

        let Some(len) = tag_len(rest) else {
            tokens.push(HtmlToken::new(TokenKind::Text, rest));
            break;
        };

        let tag = &html[pos..pos + len];
        tokens.push(HtmlToken::new(TokenKind::Tag, tag));
        pos += len;

        if let Some(name) = raw_text_element(tag) {
            let end = find_closing_tag(&html[pos..], name).map_or(html.len(), |i| pos + i);
            if end > pos {
                tokens.push(HtmlToken::new(TokenKind::RawText, &html[pos..end]));
            }
            pos = end;
        }
    }

    tokens
}

fn starts_tag(rest: &str) -> bool {
    match rest[1..].chars().next() {
        Some(c) => c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?',
        None => false,
    }
}

/// 标签长度（含尖括号），未闭合时返回 None
fn tag_len(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (i, c) in rest.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i + 1),
                _ => {}
            },
        }
    }

    None
}

fn raw_text_element(tag: &str) -> Option<&'static str> {
    let name: String = tag[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if tag.ends_with("/>") {
        return None;
    }

    RAW_TEXT_ELEMENTS.iter().copied().find(|element| *element == name)
}

fn find_closing_tag(rest: &str, name: &str) -> Option<usize> {
    let lower = rest.to_ascii_lowercase();
    let needle = format!("</{}", name);
    lower.find(&needle)
}
