//! HTML解析和处理模块
//!
//! - `dom`: 解析与基础DOM操作
//! - `serializer`: 序列化
//! - `lexer`: 标签/文本记号切分，用于按标签边界分块

pub mod dom;
pub mod lexer;
pub mod serializer;

pub use dom::{
    content_root, get_child_node_by_name, get_node_attr, get_node_name, html_to_dom,
    set_node_attr, ParseMode,
};
pub use lexer::{tokenize, HtmlToken, TokenKind};
pub use serializer::serialize_children;
