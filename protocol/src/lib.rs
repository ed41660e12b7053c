//! IMCS 五六棋协议库
//!
//! 包含:
//! - 棋子、棋盘、格子等核心数据结构
//! - 棋盘文本与 24 整数位板向量的编解码 (Bitboard)
//! - 服务端消息分类与解析 (ServerLine, GameOffer, Clock)
//! - 行式传输层抽象 (LineConnection, TcpLineConnection)
//! - 协议状态机客户端 (ImcsClient)
//!
//! 走法生成、规则与评估都不在这里：引擎是外部协作方。

mod board;
mod client;
mod codec;
mod constants;
mod error;
mod message;
mod piece;
mod transport;

pub use board::{Board, BoardSnapshot};
pub use client::{Credentials, ImcsClient, SessionState};
pub use codec::Bitboard;
pub use constants::*;
pub use error::{CodecError, ProtocolError, Result};
pub use message::{
    reply_code, Clock, GameOffer, GameOutcome, GameStart, MoveReply, ServerLine,
};
pub use piece::{Color, ColorChoice, Piece, PieceKind, Square};
pub use transport::{LineConnection, TcpLineConnection};
