//! 译文回填
//!
//! 两种回填方式对应两种后端模式：
//!
//! - 节点模式：按 [`NodeId`](super::collector::NodeId) 把译文写回文本节点或属性，
//!   并用原始首尾空白包裹译文，然后序列化整棵树
//! - 分块模式：按原顺序拼接各分块的译文，不修改 DOM

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::NodeData;

use super::batch::HtmlChunk;
use super::collector::{Segment, SegmentKind, SegmentTree};
use crate::parsers::html::dom::set_node_attr;
use crate::parsers::html::serializer::serialize_children;
use crate::translation::error::{TranslationError, TranslationResult};

/// 回填节点译文并序列化
///
/// # 参数
/// * `tree` - 收集片段时使用的同一棵树
/// * `segments` - 片段列表
/// * `translations` - 与片段一一对应的译文
pub fn reassemble_nodes(
    tree: &mut SegmentTree,
    segments: &[Segment],
    translations: &[String],
) -> TranslationResult<String> {
    if segments.len() != translations.len() {
        return Err(TranslationError::ReassemblyError(format!(
            "片段数 {} 与译文数 {} 不一致",
            segments.len(),
            translations.len()
        )));
    }

    for (segment, translated) in segments.iter().zip(translations) {
        let node = tree.node(segment.location).ok_or_else(|| {
            TranslationError::ReassemblyError(format!("片段 {} 指向不存在的节点", segment.id))
        })?;
        let value = segment.wrap(translated);

        match &segment.kind {
            SegmentKind::Text => match &node.data {
                NodeData::Text { contents } => {
                    *contents.borrow_mut() = StrTendril::from_slice(&value);
                }
                _ => {
                    return Err(TranslationError::ReassemblyError(format!(
                        "片段 {} 不是文本节点",
                        segment.id
                    )));
                }
            },
            SegmentKind::Attribute(name) => {
                if !set_node_attr(node, name, &value) {
                    return Err(TranslationError::ReassemblyError(format!(
                        "片段 {} 的属性 {} 不存在",
                        segment.id, name
                    )));
                }
            }
        }
    }

    serialize_children(tree.root())
        .map_err(|e| TranslationError::SerializationError(format!("序列化 DOM 失败: {}", e)))
}

/// 按顺序拼接分块译文
///
/// 无需翻译的分块原样保留，其余分块依次取用 `translations`。
pub fn reassemble_chunks(chunks: &[HtmlChunk], translations: &[String]) -> TranslationResult<String> {
    let expected = chunks.iter().filter(|c| c.needs_translation()).count();
    if expected != translations.len() {
        return Err(TranslationError::ReassemblyError(format!(
            "需要翻译的分块数 {} 与译文数 {} 不一致",
            expected,
            translations.len()
        )));
    }

    let mut translated = translations.iter();
    let mut output = String::new();
    for chunk in chunks {
        if chunk.needs_translation() {
            if let Some(text) = translated.next() {
                output.push_str(text);
            }
        } else {
            output.push_str(&chunk.html);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::pipeline::batch::Batcher;

    #[test]
    fn test_whitespace_round_trip() {
        let mut tree = SegmentTree::parse("doc", "<p>  hello  </p>").unwrap();
        let segments = tree.collect_segments();

        let html = reassemble_nodes(&mut tree, &segments, &["bonjour".to_string()]).unwrap();
        assert_eq!(html, "<p>  bonjour  </p>");
    }

    #[test]
    fn test_attributes_and_text_written_back() {
        let mut tree = SegmentTree::parse("doc", r#"<p>Hi <img alt="cat" src="c.png"></p>"#).unwrap();
        let segments = tree.collect_segments();
        let translations: Vec<String> = segments
            .iter()
            .map(|s| format!("T:{}", s.original_text))
            .collect();

        let html = reassemble_nodes(&mut tree, &segments, &translations).unwrap();
        assert_eq!(html, r#"<p>T:Hi <img alt="T:cat" src="c.png"></p>"#);
    }

    #[test]
    fn test_translation_is_escaped() {
        let mut tree = SegmentTree::parse("doc", "<p>x</p>").unwrap();
        let segments = tree.collect_segments();

        let html = reassemble_nodes(&mut tree, &segments, &["a < b & c".to_string()]).unwrap();
        assert_eq!(html, "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_length_mismatch() {
        let mut tree = SegmentTree::parse("doc", "<p>a</p><p>b</p>").unwrap();
        let segments = tree.collect_segments();

        let result = reassemble_nodes(&mut tree, &segments, &["x".to_string()]);
        assert!(matches!(result, Err(TranslationError::ReassemblyError(_))));
    }

    #[test]
    fn test_chunks_concatenate_in_order() {
        let chunks = Batcher::chunk_html("<div></div><p>One</p><p>Two</p>", 12);
        let translations: Vec<String> = chunks
            .iter()
            .filter(|c| c.needs_translation())
            .map(|c| c.html.to_uppercase())
            .collect();

        let html = reassemble_chunks(&chunks, &translations).unwrap();
        assert_eq!(html, "<div></div><P>ONE</P><P>TWO</P>");
    }
}
