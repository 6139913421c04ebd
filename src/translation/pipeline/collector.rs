//! 文本收集器模块
//!
//! 把 HTML 解析成 DOM 并按文档顺序提取可翻译片段 [`Segment`]。
//!
//! ## 遍历规则
//!
//! - 先序深度优先；元素自身的属性片段先于其子节点
//! - 属性只收集白名单（`alt`、`title`、`aria-label`），按白名单顺序输出
//! - `script`、`style`、`code` 等元素整棵子树跳过
//! - 去除首尾空白后为空的文本不产生片段，重建时原样保留
//!
//! ## 节点索引
//!
//! 片段不直接持有 DOM 引用，而是持有 [`NodeId`]，指向 [`SegmentTree`]
//! 内部的节点表。回填阶段通过 `NodeId` 对树做显式修改。

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::parsers::html::dom::{content_root, get_node_attr, get_node_name, html_to_dom, ParseMode};
use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 节点表索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// 片段类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// 文本节点内容
    Text,
    /// 元素属性值
    Attribute(String),
}

/// 可翻译片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 文档顺序中的序号
    pub id: usize,
    pub kind: SegmentKind,
    /// 去除首尾空白后的原文
    pub original_text: String,
    pub location: NodeId,
    pub leading_whitespace: String,
    pub trailing_whitespace: String,
}

impl Segment {
    fn new(id: usize, kind: SegmentKind, raw: &str, location: NodeId) -> Self {
        let trimmed_start = raw.trim_start_matches(char::is_whitespace);
        let leading = &raw[..raw.len() - trimmed_start.len()];
        let core = trimmed_start.trim_end_matches(char::is_whitespace);
        let trailing = &trimmed_start[core.len()..];

        Self {
            id,
            kind,
            original_text: core.to_string(),
            location,
            leading_whitespace: leading.to_string(),
            trailing_whitespace: trailing.to_string(),
        }
    }

    /// 用原始空白包裹译文
    pub fn wrap(&self, translated: &str) -> String {
        format!(
            "{}{}{}",
            self.leading_whitespace,
            translated.trim(),
            self.trailing_whitespace
        )
    }
}

/// 检查输入能否交给宽松的 HTML5 解析器
///
/// 解析器能接受任何不规范的标记，唯一拒绝的是包含 NUL 字符的输入。
pub fn ensure_parseable(document: &str, html: &str) -> TranslationResult<()> {
    if html.contains('\0') {
        return Err(TranslationError::ParseError {
            document: document.to_string(),
            message: "输入包含 NUL 字符".to_string(),
        });
    }
    Ok(())
}

/// 解析后的文档及其节点表
///
/// 每次管道运行独占一棵树，收集阶段只读，回填阶段写入。
pub struct SegmentTree {
    // rcdom 析构文档时会清空所有后代的子节点，树必须与 root 同生命周期
    #[allow(dead_code)]
    dom: RcDom,
    root: Handle,
    nodes: Vec<Handle>,
    mode: ParseMode,
}

impl SegmentTree {
    /// 解析 HTML
    ///
    /// # 参数
    /// * `document` - 文档标识，出现在错误信息中
    /// * `html` - 规范化后的 HTML
    pub fn parse(document: &str, html: &str) -> TranslationResult<Self> {
        ensure_parseable(document, html)?;

        let mode = ParseMode::detect(html);
        let dom = html_to_dom(html, mode);
        let root = content_root(&dom, mode).ok_or_else(|| TranslationError::ParseError {
            document: document.to_string(),
            message: "解析结果缺少根节点".to_string(),
        })?;

        Ok(Self {
            dom,
            root,
            nodes: Vec::new(),
            mode,
        })
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// 按索引取节点
    pub fn node(&self, id: NodeId) -> Option<&Handle> {
        self.nodes.get(id.0)
    }

    /// 按文档顺序收集片段
    pub fn collect_segments(&mut self) -> Vec<Segment> {
        self.nodes.clear();
        let mut segments = Vec::new();
        let root = self.root.clone();

        let children: Vec<Handle> = root.children.borrow().iter().cloned().collect();
        for child in &children {
            self.visit(child, &mut segments);
        }

        tracing::debug!("收集到 {} 个片段，{} 个节点", segments.len(), self.nodes.len());
        segments
    }

    fn register(&mut self, node: &Handle) -> NodeId {
        self.nodes.push(node.clone());
        NodeId(self.nodes.len() - 1)
    }

    fn visit(&mut self, node: &Handle, segments: &mut Vec<Segment>) {
        match &node.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.trim().is_empty() {
                    let id = self.register(node);
                    segments.push(Segment::new(segments.len(), SegmentKind::Text, &text, id));
                }
            }
            NodeData::Element { .. } => {
                let name = get_node_name(node).unwrap_or_default().to_ascii_lowercase();
                if constants::SKIP_ELEMENTS.contains(&name.as_str()) {
                    return;
                }

                let mut location = None;
                for attr in constants::TRANSLATABLE_ATTRS {
                    if let Some(value) = get_node_attr(node, attr) {
                        if value.trim().is_empty() {
                            continue;
                        }
                        let id = *location.get_or_insert_with(|| self.register(node));
                        segments.push(Segment::new(
                            segments.len(),
                            SegmentKind::Attribute(attr.to_string()),
                            &value,
                            id,
                        ));
                    }
                }

                self.visit_children(node, segments);
            }
            NodeData::Document => self.visit_children(node, segments),
            _ => {}
        }
    }

    fn visit_children(&mut self, node: &Handle, segments: &mut Vec<Segment>) {
        let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
        for child in &children {
            self.visit(child, segments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(html: &str) -> Vec<(SegmentKind, String)> {
        let mut tree = SegmentTree::parse("doc", html).unwrap();
        tree.collect_segments()
            .into_iter()
            .map(|s| (s.kind, s.original_text))
            .collect()
    }

    #[test]
    fn test_document_order_with_attributes_first() {
        let segments = texts(r#"<div title="Tip"><img alt="A cat" title=" "><p>One <b>two</b></p></div>"#);
        assert_eq!(
            segments,
            vec![
                (SegmentKind::Attribute("title".into()), "Tip".into()),
                (SegmentKind::Attribute("alt".into()), "A cat".into()),
                (SegmentKind::Text, "One".into()),
                (SegmentKind::Text, "two".into()),
            ]
        );
    }

    #[test]
    fn test_skips_code_and_script() {
        let segments = texts("<p>Run</p><pre><code>ls -la</code></pre><script>var a = 1;</script><style>p{}</style>");
        assert_eq!(segments, vec![(SegmentKind::Text, "Run".into())]);
    }

    #[test]
    fn test_whitespace_is_recorded() {
        let mut tree = SegmentTree::parse("doc", "<p>  hello  </p><p>   </p>").unwrap();
        let segments = tree.collect_segments();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].original_text, "hello");
        assert_eq!(segments[0].leading_whitespace, "  ");
        assert_eq!(segments[0].trailing_whitespace, "  ");
        assert_eq!(segments[0].wrap(" bonjour\n"), "  bonjour  ");
    }

    #[test]
    fn test_node_ids_resolve() {
        let mut tree = SegmentTree::parse("doc", r#"<a title="t">x</a>"#).unwrap();
        let segments = tree.collect_segments();

        assert_eq!(segments[0].location, NodeId(0));
        assert_eq!(segments[1].location, NodeId(1));
        assert_eq!(get_node_name(tree.node(NodeId(0)).unwrap()), Some("a"));
    }

    #[test]
    fn test_nul_is_parse_error() {
        let result = SegmentTree::parse("article-1", "<p>a\0b</p>");
        match result {
            Err(TranslationError::ParseError { document, .. }) => assert_eq!(document, "article-1"),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_lenient_parsing() {
        let segments = texts("<p>unclosed <b>bold<div>x");
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_document_mode() {
        let mut tree = SegmentTree::parse("doc", "<!DOCTYPE html><html><head><title>T</title></head><body>B</body></html>").unwrap();
        assert_eq!(tree.mode(), ParseMode::Document);
        let segments = tree.collect_segments();
        let texts: Vec<_> = segments.iter().map(|s| s.original_text.as_str()).collect();
        assert_eq!(texts, vec!["T", "B"]);
    }
}
