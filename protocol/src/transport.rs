//! 行式传输层
//!
//! IMCS 是 CRLF 结尾的文本行协议。此模块提供 LineConnection trait
//! 使协议状态机与具体传输实现解耦，并给出基于 tokio TCP 的实现，
//! 带连接超时与逐次读取期限——远端停摆时不会永远阻塞。

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::constants::{CONNECT_TIMEOUT, READ_TIMEOUT};
use crate::error::{ProtocolError, Result};

/// 行连接抽象
#[async_trait]
pub trait LineConnection: Send {
    /// 写入一行（自动追加 CRLF 并刷新）
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// 读取一行（去除行尾 CRLF）；超过读取期限报 ReadTimeout
    async fn read_line(&mut self) -> Result<String>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;

    /// 远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 基于 TCP 的行连接
#[derive(Debug)]
pub struct TcpLineConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer_addr: Option<String>,
    read_deadline: Duration,
}

impl TcpLineConnection {
    /// 连接到指定地址
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectTimeout)?
            .map_err(ProtocolError::Io)?;
        Self::from_stream(stream)
    }

    /// 从已建立的 TcpStream 创建（测试与引擎侧使用）
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer_addr,
            read_deadline: READ_TIMEOUT,
        })
    }

    /// 调整单次读取期限
    pub fn set_read_deadline(&mut self, deadline: Duration) {
        self.read_deadline = deadline;
    }
}

#[async_trait]
impl LineConnection for TcpLineConnection {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut buf = String::new();
        let n = timeout(self.read_deadline, self.reader.read_line(&mut buf))
            .await
            .map_err(|_| ProtocolError::ReadTimeout)??;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(buf)
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_line_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = TcpLineConnection::from_stream(stream).unwrap();
            let line = conn.read_line().await.unwrap();
            assert_eq!(line, "me alice secret");
            conn.write_line("201 hello alice").await.unwrap();
        });

        let mut conn = TcpLineConnection::connect(&addr).await.unwrap();
        conn.write_line("me alice secret").await.unwrap();
        let reply = conn.read_line().await.unwrap();
        assert_eq!(reply, "201 hello alice");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_deadline_fires() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // 对端接受连接后保持沉默
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(stream);
        });

        let mut conn = TcpLineConnection::connect(&addr).await.unwrap();
        conn.set_read_deadline(Duration::from_millis(50));
        let err = conn.read_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::ReadTimeout));

        server.abort();
        let _ = server.await;
    }

    #[tokio::test]
    async fn test_closed_by_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut conn = TcpLineConnection::connect(&addr).await.unwrap();
        let err = conn.read_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));

        server.await.unwrap();
    }
}
