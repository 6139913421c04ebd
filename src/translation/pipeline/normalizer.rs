//! 输入规范化
//!
//! 删除来源 CMS 注入的固定片段。只做文本替换，不解析 HTML，
//! 所以残缺的标记也能原样通过。

/// 需要删除的注入片段
const INJECTED_FRAGMENTS: &[&str] = &[
    " dir=\"ltr\"",
    " dir='ltr'",
    "<div id=\"mct-script\"></div>",
    "<p>&nbsp;</p>",
];

/// 规范化 HTML
///
/// 反复删除直到不再变化，删除后拼出的新片段也会被清掉，
/// 因此 `normalize(normalize(x)) == normalize(x)`。
pub fn normalize(html: &str) -> String {
    let mut current = html.to_string();

    loop {
        let mut next = current.clone();
        for fragment in INJECTED_FRAGMENTS {
            if next.contains(fragment) {
                next = next.replace(fragment, "");
            }
        }

        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_injected_fragments() {
        let html = r#"<div id="mct-script"></div><p dir="ltr">Hi</p><p>&nbsp;</p><span dir='ltr'>x</span>"#;
        assert_eq!(normalize(html), "<p>Hi</p><span>x</span>");
    }

    #[test]
    fn test_nested_fragment_removed_once_exposed() {
        let html = "<p><p>&nbsp;</p>&nbsp;</p>tail";
        assert_eq!(normalize(html), "tail");
    }

    #[test]
    fn test_idempotent_and_tolerant() {
        for html in ["<p dir=\"rtl\">x", "<<p>&nbsp;</p", "", "<a dir=\"ltr\" dir=\"ltr\">"] {
            let once = normalize(html);
            assert_eq!(normalize(&once), once);
        }
        assert_eq!(normalize("<p dir=\"rtl\">x"), "<p dir=\"rtl\">x");
    }
}
