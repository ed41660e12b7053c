//! IMCS 五六棋客户端
//!
//! 包含:
//! - 引擎通道 (EngineChannel / TcpEngine)
//! - 对局编排 (GameOrchestrator)
//! - 设置持久化 (Settings)
//! - 对局记录存储 (TranscriptStore)
//!
//! 协议状态机与位板编解码在 protocol 库里。

pub mod engine;
pub mod game;
pub mod settings;
pub mod storage;

pub use engine::{EngineChannel, EngineError, EngineReply, PlayerKind, TcpEngine};
pub use game::{GameOrchestrator, OpponentPolicy};
pub use settings::Settings;
pub use storage::{GameTranscript, MoveEntry, TranscriptStore};
