use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_document, parse_fragment, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// HTML 解析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// 以 `<body>` 为上下文解析片段，输出不会补全 html/head/body
    Fragment,
    /// 解析完整文档
    Document,
}

impl ParseMode {
    /// 根据输入开头判断解析模式
    ///
    /// 以 `<!doctype` 或 `<html` 开头（忽略大小写与前导空白）的输入按完整文档解析，
    /// 其余按文章片段解析。
    pub fn detect(html: &str) -> Self {
        let head: String = html
            .trim_start()
            .chars()
            .take(9)
            .collect::<String>()
            .to_ascii_lowercase();

        if head.starts_with("<!doctype") || head.starts_with("<html") {
            ParseMode::Document
        } else {
            ParseMode::Fragment
        }
    }
}

/// 将 HTML 字符串解析为 DOM
pub fn html_to_dom(html: &str, mode: ParseMode) -> RcDom {
    match mode {
        ParseMode::Document => parse_document(RcDom::default(), Default::default()).one(html),
        ParseMode::Fragment => parse_fragment(
            RcDom::default(),
            Default::default(),
            QualName::new(None, ns!(html), local_name!("body")),
            vec![],
        )
        .one(html),
    }
}

/// 获取内容根节点
///
/// 片段模式下 html5ever 把解析结果挂在文档下的 `<html>` 元素中；
/// 文档模式下直接返回文档节点。
pub fn content_root(dom: &RcDom, mode: ParseMode) -> Option<Handle> {
    match mode {
        ParseMode::Document => Some(dom.document.clone()),
        ParseMode::Fragment => get_child_node_by_name(&dom.document, "html"),
    }
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置已有属性的值
///
/// 只改写已存在的属性，返回是否找到该属性。
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: &str) -> bool {
    if let NodeData::Element { attrs, .. } = &node.data {
        for attr in attrs.borrow_mut().iter_mut() {
            if &*attr.name.local == attr_name {
                attr.value.clear();
                attr.value.push_slice(attr_value);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mode() {
        assert_eq!(ParseMode::detect("<p>Hi</p>"), ParseMode::Fragment);
        assert_eq!(ParseMode::detect("  <!DOCTYPE html><html></html>"), ParseMode::Document);
        assert_eq!(ParseMode::detect("<HTML lang=en>"), ParseMode::Document);
        assert_eq!(ParseMode::detect("plain text"), ParseMode::Fragment);
    }

    #[test]
    fn test_fragment_root_holds_parsed_nodes() {
        let dom = html_to_dom("<p title=\"t\">Hello</p>", ParseMode::Fragment);
        let root = content_root(&dom, ParseMode::Fragment).unwrap();
        let p = get_child_node_by_name(&root, "p").unwrap();

        assert_eq!(get_node_name(&p), Some("p"));
        assert_eq!(get_node_attr(&p, "title"), Some("t".to_string()));
    }

    #[test]
    fn test_set_node_attr_only_rewrites_existing() {
        let dom = html_to_dom("<img alt=\"cat\">", ParseMode::Fragment);
        let root = content_root(&dom, ParseMode::Fragment).unwrap();
        let img = get_child_node_by_name(&root, "img").unwrap();

        assert!(set_node_attr(&img, "alt", "chat"));
        assert_eq!(get_node_attr(&img, "alt"), Some("chat".to_string()));
        assert!(!set_node_attr(&img, "title", "x"));
        assert_eq!(get_node_attr(&img, "title"), None);
    }
}
