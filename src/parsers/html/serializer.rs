use std::io;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化节点的全部子节点
///
/// 片段模式传入内容根（`<html>` 元素），得到与输入同构的片段；
/// 文档模式传入文档节点，得到包含 doctype 的完整文档。
pub fn serialize_children(root: &Handle) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = root.clone().into();

    serialize(
        &mut buf,
        &serializable,
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;

    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{content_root, html_to_dom, ParseMode};

    #[test]
    fn test_fragment_round_trip() {
        let html = "<p>Hello <a href=\"/x\">world</a>.</p>";
        let dom = html_to_dom(html, ParseMode::Fragment);
        let root = content_root(&dom, ParseMode::Fragment).unwrap();

        assert_eq!(serialize_children(&root).unwrap(), html);
    }

    #[test]
    fn test_document_keeps_doctype() {
        let html = "<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>";
        let dom = html_to_dom(html, ParseMode::Document);
        let root = content_root(&dom, ParseMode::Document).unwrap();

        let out = serialize_children(&root).unwrap();
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("<title>T</title>"));
    }
}
