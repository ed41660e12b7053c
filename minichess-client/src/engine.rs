//! 引擎通道
//!
//! 走法生成引擎是外部进程，通过严格一问一答的行式 TCP 交换接入。
//! 握手：引擎连入后先发送 `READY`，客户端回以玩家类型编号，引擎
//! 原样回显。此后每次交换为：客户端发送 24 整数位板行，引擎回复
//! 一个着法，或回复终止哨兵 `DIE`。交换绝不与协议 I/O 交错。

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use protocol::{LineConnection, ProtocolError, TcpLineConnection};

/// 终止哨兵
pub const TERMINATION_SENTINEL: &str = "DIE";

/// 引擎玩家类型（对应引擎侧的搜索实现选择）
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlayerKind {
    /// 随机走子
    Random,
    /// 负极大值搜索
    Negamax,
    /// Alpha-Beta 剪枝
    Ab,
    /// Alpha-Beta + 置换表
    Abttable,
}

impl PlayerKind {
    /// 握手时发送的类型编号
    pub fn code(self) -> &'static str {
        match self {
            PlayerKind::Random => "1",
            PlayerKind::Negamax => "2",
            PlayerKind::Ab => "3",
            PlayerKind::Abttable => "4",
        }
    }
}

/// 引擎通道错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 传输层错误
    #[error("Engine transport error: {0}")]
    Transport(#[from] ProtocolError),

    /// 监听/接受连接失败
    #[error("Engine listener error: {0}")]
    Io(#[from] std::io::Error),

    /// 握手不符合预期
    #[error("Engine handshake failed: expected {expected:?}, got {got:?}")]
    Handshake { expected: String, got: String },

    /// 引擎回复了空着法
    #[error("Engine returned an empty move")]
    EmptyMove,
}

/// 引擎应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    /// 着法文本，如 `c2-c3`
    Move(String),
    /// 引擎主动终止
    Terminated,
}

/// 引擎通道：严格一问一答，一次编码棋盘换一个着法
#[async_trait]
pub trait EngineChannel: Send {
    /// 发送编码棋盘并等待引擎的着法应答
    async fn best_move(&mut self, encoded_board: &str) -> Result<EngineReply, EngineError>;

    /// 通知引擎退出（发送终止哨兵）并关闭通道
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// 监听一个端口、接受唯一引擎连接的 TCP 实现
#[derive(Debug)]
pub struct TcpEngine {
    conn: TcpLineConnection,
}

impl TcpEngine {
    /// 在 addr 上等待引擎连入并完成握手
    pub async fn accept(addr: &str, kind: PlayerKind) -> Result<Self, EngineError> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "waiting for engine to connect");
        Self::from_listener(listener, kind).await
    }

    /// 在已绑定的监听器上等待引擎连入并完成握手
    pub async fn from_listener(
        listener: TcpListener,
        kind: PlayerKind,
    ) -> Result<Self, EngineError> {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "engine connected");
        let mut conn = TcpLineConnection::from_stream(stream)?;

        let ready = conn.read_line().await?;
        if ready.trim() != "READY" {
            return Err(EngineError::Handshake {
                expected: "READY".to_string(),
                got: ready,
            });
        }
        conn.write_line(kind.code()).await?;
        let echo = conn.read_line().await?;
        if echo.trim() != kind.code() {
            return Err(EngineError::Handshake {
                expected: kind.code().to_string(),
                got: echo,
            });
        }
        debug!(kind = ?kind, "engine handshake complete");
        Ok(Self { conn })
    }
}

#[async_trait]
impl EngineChannel for TcpEngine {
    async fn best_move(&mut self, encoded_board: &str) -> Result<EngineReply, EngineError> {
        self.conn.write_line(encoded_board).await?;
        let reply = self.conn.read_line().await?;
        let reply = reply.trim();
        if reply == TERMINATION_SENTINEL {
            return Ok(EngineReply::Terminated);
        }
        if reply.is_empty() {
            return Err(EngineError::EmptyMove);
        }
        Ok(EngineReply::Move(reply.to_string()))
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        self.conn.write_line(TERMINATION_SENTINEL).await?;
        self.conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    /// 扮演引擎一侧的脚本化对端
    async fn scripted_engine(addr: String, moves: Vec<&'static str>) {
        let stream = TcpStream::connect(&addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half.write_all(b"READY\r\n").await.unwrap();
        let mut kind = String::new();
        reader.read_line(&mut kind).await.unwrap();
        write_half.write_all(kind.as_bytes()).await.unwrap();

        for mv in moves {
            let mut board = String::new();
            reader.read_line(&mut board).await.unwrap();
            assert_eq!(board.trim().split_whitespace().count(), 24);
            write_half
                .write_all(format!("{}\r\n", mv).as_bytes())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_handshake_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let engine_task = tokio::spawn(scripted_engine(addr, vec!["b2-b3", "DIE"]));
        let mut engine = TcpEngine::from_listener(listener, PlayerKind::Random)
            .await
            .unwrap();

        let board = "0 ".repeat(23) + "0";
        let reply = engine.best_move(&board).await.unwrap();
        assert_eq!(reply, EngineReply::Move("b2-b3".to_string()));

        // 终止哨兵映射为 Terminated
        let reply = engine.best_move(&board).await.unwrap();
        assert_eq!(reply, EngineReply::Terminated);

        engine_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let peer = tokio::spawn(async move {
            let stream = TcpStream::connect(&addr).await.unwrap();
            let (_read_half, mut write_half) = stream.into_split();
            write_half.write_all(b"HELLO\r\n").await.unwrap();
        });

        let err = TcpEngine::from_listener(listener, PlayerKind::Ab)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Handshake { .. }));
        peer.await.unwrap();
    }
}
