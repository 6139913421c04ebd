//! 译文后处理
//!
//! 回填后按固定顺序执行的文本修正：
//!
//! 1. 空白整理：删除制表符，合并换行和连续空格，删除标点和结束标签前的空白
//! 2. 链接标点：链接文本开头的标点移到链接前，结尾的 `,;:` 移到链接后
//! 3. 重复文本：删除紧跟在链接后、与链接文本完全相同的重复片段
//!
//! 空白整理必须最先执行，后两步依赖精确的相邻关系。整个流程幂等。

use regex::Regex;

use crate::translation::error::{TranslationError, TranslationResult};

/// 后处理器
///
/// 正则在构造时编译一次，之后可在多个请求间共享。
#[derive(Debug, Clone)]
pub struct PostProcessor {
    newline_run: Regex,
    space_run: Regex,
    space_before_punct: Regex,
    space_before_close: Regex,
    leading_punct_in_anchor: Regex,
    trailing_punct_in_anchor: Regex,
    anchor_text: Regex,
}

fn compile(pattern: &str) -> TranslationResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| TranslationError::InternalError(format!("正则编译失败 {}: {}", pattern, e)))
}

impl PostProcessor {
    pub fn new() -> TranslationResult<Self> {
        Ok(Self {
            newline_run: compile(r"\s*\n\s*")?,
            space_run: compile(r" {2,}")?,
            space_before_punct: compile(r"\s+([.,!?;:])")?,
            space_before_close: compile(r"\s+(</[a-zA-Z][a-zA-Z0-9]*>)")?,
            leading_punct_in_anchor: compile(r"(\s*)<a(\s[^>]*)?>([.,!?;:]+)([^<]+?)</a>")?,
            trailing_punct_in_anchor: compile(r"<a(\s[^>]*)?>([^<]*?[^<\s,;:])([,;:]+)</a>")?,
            anchor_text: compile(r"(\s+)(<a(?:\s[^>]*)?>)([^<]+)</a>")?,
        })
    }

    /// 执行全部后处理
    pub fn process(&self, html: &str) -> String {
        let html = self.collapse_whitespace(html);
        let html = self.fix_anchor_punctuation(&html);
        self.remove_anchor_echoes(&html)
    }

    /// 空白整理
    pub fn collapse_whitespace(&self, html: &str) -> String {
        let text = html.replace('\t', "");
        let text = self.newline_run.replace_all(&text, "\n");
        let text = self.space_run.replace_all(&text, " ");
        let text = self.space_before_punct.replace_all(&text, "$1");
        let text = self.space_before_close.replace_all(&text, "$1");
        text.trim().to_string()
    }

    /// 修正链接边界上的标点
    ///
    /// `<a href="x">,hello</a>` 变为 `,<a href="x">hello</a>`；
    /// `<a href="x">hello,</a>` 变为 `<a href="x">hello</a>,`。
    /// 标点前原有的空白移到链接前，保证标点紧贴前一个词。
    pub fn fix_anchor_punctuation(&self, html: &str) -> String {
        let text = self
            .leading_punct_in_anchor
            .replace_all(html, "${3}${1}<a${2}>${4}</a>");
        self.trailing_punct_in_anchor
            .replace_all(&text, "<a${1}>${2}</a>${3}")
            .into_owned()
    }

    /// 删除链接后紧跟的重复链接文本
    ///
    /// 只有重复片段之后不是字母或数字时才删除，避免误删
    /// `<a>run</a>runner` 这类正常文本。连续多次重复逐轮删除，
    /// 每轮都会缩短文本，直到不再变化为止。
    pub fn remove_anchor_echoes(&self, html: &str) -> String {
        let mut current = html.to_string();

        loop {
            let next = self.remove_anchor_echoes_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn remove_anchor_echoes_once(&self, html: &str) -> String {
        let mut output = String::with_capacity(html.len());
        let mut last = 0;

        for caps in self.anchor_text.captures_iter(html) {
            let (Some(whole), Some(text)) = (caps.get(0), caps.get(3)) else {
                continue;
            };
            if whole.end() < last {
                continue;
            }

            let rest = &html[whole.end()..];
            let Some(after) = rest.strip_prefix(text.as_str()) else {
                continue;
            };
            if after.chars().next().is_some_and(|c| c.is_alphanumeric()) {
                continue;
            }

            output.push_str(&html[last..whole.end()]);
            last = whole.end() + text.len();
        }

        output.push_str(&html[last..]);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> PostProcessor {
        PostProcessor::new().unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        let p = processor();
        assert_eq!(
            p.collapse_whitespace("  <p>Hello  ,\t world !</p>\n\n\n<p>x   </p>  "),
            "<p>Hello, world!</p>\n<p>x</p>"
        );
    }

    #[test]
    fn test_leading_punctuation_moves_out() {
        let p = processor();
        assert_eq!(p.process(r#"<a href="x">,hello</a>"#), r#",<a href="x">hello</a>"#);
        assert_eq!(
            p.process(r#"see <a href="x">,hello</a> now"#),
            r#"see, <a href="x">hello</a> now"#
        );
    }

    #[test]
    fn test_correct_punctuation_unchanged() {
        let p = processor();
        assert_eq!(p.process(r#"<a href="x">hello</a>,"#), r#"<a href="x">hello</a>,"#);
        assert_eq!(
            p.process(r#"<p>Bonjour <a href="/x">monde</a>.</p>"#),
            r#"<p>Bonjour <a href="/x">monde</a>.</p>"#
        );
    }

    #[test]
    fn test_trailing_punctuation_moves_out() {
        let p = processor();
        assert_eq!(p.process(r#"<a href="x">hello;</a> b"#), r#"<a href="x">hello</a>; b"#);
        assert_eq!(p.process("<a>,hello,</a>"), ",<a>hello</a>,");
    }

    #[test]
    fn test_anchor_echo_removed() {
        let p = processor();
        assert_eq!(
            p.process(r#"read <a href="/d">the docs</a>the docs today"#),
            r#"read <a href="/d">the docs</a> today"#
        );
        assert_eq!(
            p.process(r#"a <a href="/r">run</a>runner"#),
            r#"a <a href="/r">run</a>runner"#
        );
    }

    #[test]
    fn test_repeated_echoes_all_removed() {
        let p = processor();
        let html = format!(r#"x <a href="y">!</a>{}"#, "!".repeat(12));
        assert_eq!(p.process(&html), r#"x <a href="y">!</a>"#);
    }

    #[test]
    fn test_idempotent() {
        let p = processor();
        let inputs = [
            "x <a>,y</a>",
            "<p>\tOne  two ,three</p>\n \n<p> <a href=\"q\">, a,</a>a ! </p>",
            "<a>, </a>",
            "  <b> x </b> . <a title=\"t\">w</a>w, w",
            "<a href='1'>a</a>a<a href='2'>b</a>b",
            "x <a href=\"y\">!</a>!!!!!!!!!!!!",
            "",
        ];

        for input in inputs {
            let once = p.process(input);
            assert_eq!(p.process(&once), once, "input: {:?}", input);
        }
    }
}
