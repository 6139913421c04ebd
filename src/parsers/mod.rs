//! # 解析器模块
//!
//! - `html` - HTML 解析、DOM 操作、序列化与词法切分

pub mod html;

pub use html::{html_to_dom, serialize_children, tokenize, ParseMode};
