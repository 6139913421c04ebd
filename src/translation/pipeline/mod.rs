//! 翻译处理管道
//!
//! 未命中缓存时依次执行：
//!
//! ```text
//! normalizer → collector → batch → (后端) → reassembler → postprocess
//! ```
//!
//! 各阶段都是纯变换，后端调用由 [`core::engine`](crate::translation::core::engine) 负责。

pub mod batch;
pub mod collector;
pub mod normalizer;
pub mod postprocess;
pub mod reassembler;

pub use batch::{Batch, Batcher, HtmlChunk};
pub use collector::{ensure_parseable, NodeId, Segment, SegmentKind, SegmentTree};
pub use normalizer::normalize;
pub use postprocess::PostProcessor;
pub use reassembler::{reassemble_chunks, reassemble_nodes};
