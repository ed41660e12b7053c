//! IMCS 协议客户端
//!
//! 一个 `ImcsClient` 独占一条连接与其上的协议状态机；连接绝不跨
//! 实例共享。所有操作都是严格的写后读：在应答的终止模式被完整读取
//! 之前不会返回，也不会发出第二个请求。

use tracing::{debug, info, warn};

use crate::board::BoardSnapshot;
use crate::constants::{CODE_GAME_STARTS_BLACK, CODE_GAME_STARTS_WHITE, CODE_OFFER_ACK};
use crate::error::{ProtocolError, Result};
use crate::message::{reply_code, Clock, GameStart, MoveReply, ServerLine};
use crate::piece::{Color, ColorChoice};
use crate::transport::{LineConnection, TcpLineConnection};

/// 会话凭据
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// 会话状态
///
/// 状态只在一个协议单元（一行或多行）读取完成时同步推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    AwaitingGameInfo,
    InGame,
    GameOver,
    Terminated,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connected => "Connected",
            SessionState::Authenticated => "Authenticated",
            SessionState::AwaitingGameInfo => "AwaitingGameInfo",
            SessionState::InGame => "InGame",
            SessionState::GameOver => "GameOver",
            SessionState::Terminated => "Terminated",
        }
    }
}

/// IMCS 客户端
#[derive(Debug)]
pub struct ImcsClient<C: LineConnection = TcpLineConnection> {
    conn: C,
    state: SessionState,
    credentials: Credentials,
    /// 开局后由服务端指派
    color: Option<Color>,
    /// 当前对局编号（来自 103 应答或 accept 参数）
    game_number: Option<u32>,
}

impl ImcsClient<TcpLineConnection> {
    /// 连接服务器并完成登录（未注册用户名自动注册）
    pub async fn connect(addr: &str, credentials: Credentials) -> Result<Self> {
        let conn = TcpLineConnection::connect(addr).await?;
        info!(%addr, "connected to IMCS server");
        Self::login(conn, credentials).await
    }
}

impl<C: LineConnection> ImcsClient<C> {
    /// 在已建立的连接上完成登录握手
    ///
    /// 读取服务端欢迎行后发送 `me` 登录命令；服务端报告用户名不存在
    /// 时自动以同一凭据发送 `register` 并重读应答，重复注册是致命的
    /// 认证错误。成功后会话进入 Authenticated。
    pub async fn login(conn: C, credentials: Credentials) -> Result<Self> {
        let mut client = Self {
            conn,
            state: SessionState::Connected,
            credentials,
            color: None,
            game_number: None,
        };

        let preamble = client.conn.read_line().await?;
        debug!(%preamble, "server preamble");

        let me = format!(
            "me {} {}",
            client.credentials.username, client.credentials.password
        );
        client.conn.write_line(&me).await?;
        let reply = client.conn.read_line().await?;

        if reply.contains("no such username") {
            info!(username = %client.credentials.username, "unknown username, registering");
            let register = format!(
                "register {} {}",
                client.credentials.username, client.credentials.password
            );
            client.conn.write_line(&register).await?;
            let reply = client.conn.read_line().await?;
            if !is_success(&reply) {
                return Err(ProtocolError::Authentication {
                    reason: "registration rejected".to_string(),
                    line: reply,
                });
            }
        } else if !is_success(&reply) {
            return Err(ProtocolError::Authentication {
                reason: "login rejected".to_string(),
                line: reply,
            });
        }

        client.state = SessionState::Authenticated;
        debug!("authenticated");
        Ok(client)
    }

    /// 当前会话状态
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 本局被指派的执色
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// 当前对局编号
    pub fn game_number(&self) -> Option<u32> {
        self.game_number
    }

    /// 发送 `help` 并把应答逐行写进日志，直到 `.` 结束行
    pub async fn get_help(&mut self) -> Result<()> {
        self.require_ready("help")?;
        self.conn.write_line("help").await?;
        loop {
            let line = self.conn.read_line().await?;
            if line.trim() == "." {
                return Ok(());
            }
            info!(help = %line);
        }
    }

    /// 发送 `list`，按到达顺序收集带 `[offer]` 标记的行
    ///
    /// `.` 结束行与不带标记的行都被丢弃。
    pub async fn list_games(&mut self) -> Result<Vec<String>> {
        self.require_ready("list")?;
        self.conn.write_line("list").await?;
        let mut offers = Vec::new();
        loop {
            let line = self.conn.read_line().await?;
            if line.trim() == "." {
                debug!(count = offers.len(), "offer list complete");
                return Ok(offers);
            }
            if line.contains("[offer]") {
                offers.push(line);
            }
        }
    }

    /// 邀约一局：`offer <执色> [<时长秒数>]`
    pub async fn offer_game(
        &mut self,
        color: ColorChoice,
        duration_secs: Option<u32>,
    ) -> Result<GameStart> {
        self.require_ready("offer")?;
        let command = match duration_secs {
            Some(secs) => format!("offer {} {}", color.as_str(), secs),
            None => format!("offer {}", color.as_str()),
        };
        info!(%command, "offering game");
        self.conn.write_line(&command).await?;
        self.expect_offer_ack().await?;
        self.await_game_start().await
    }

    /// 接受一条邀约：`accept <编号> [<执色>]`
    pub async fn accept_game(
        &mut self,
        game_number: u32,
        color: Option<Color>,
    ) -> Result<GameStart> {
        self.require_ready("accept")?;
        let command = match color {
            Some(c) => format!("accept {} {}", game_number, c),
            None => format!("accept {}", game_number),
        };
        info!(%command, "accepting game");
        self.conn.write_line(&command).await?;
        self.expect_offer_ack().await?;
        self.game_number = Some(game_number);
        self.await_game_start().await
    }

    /// 发送一步棋并读取对手的应答
    ///
    /// 应答行先做终局/拒招分类：拒招返回可恢复的 InvalidMove 错误，
    /// 状态停留在 InGame；终局行返回 GameOver 结果；否则按对手着法
    /// 解析，并继续读取下一个棋盘块与计时行。
    pub async fn send_move(&mut self, move_text: &str) -> Result<MoveReply> {
        self.require_state(&[SessionState::InGame], "move")?;
        self.conn.write_line(move_text).await?;

        let line = self.read_significant_line().await?;
        match ServerLine::classify(&line, self.color) {
            ServerLine::IllegalMove => {
                warn!(mv = %move_text, %line, "server rejected move");
                Err(ProtocolError::InvalidMove {
                    mv: move_text.to_string(),
                    line,
                })
            }
            ServerLine::GameOver(outcome) => {
                info!(?outcome, %line, "game over");
                self.state = SessionState::GameOver;
                Ok(MoveReply::GameOver(outcome))
            }
            ServerLine::Other => {
                let opponent_move = parse_opponent_move(&line)?;
                debug!(%opponent_move, "opponent replied");
                let snapshot = self.read_snapshot().await?;
                Ok(MoveReply::Continue {
                    opponent_move,
                    snapshot,
                })
            }
            // read_significant_line 已跳过空行
            ServerLine::Blank => unreachable!("blank lines are skipped"),
        }
    }

    /// 认输；服务端的终局消息不在此处解析
    pub async fn resign(&mut self) -> Result<()> {
        self.require_state(&[SessionState::InGame], "resign")?;
        self.conn.write_line("resign").await?;
        info!("resigned");
        self.state = SessionState::GameOver;
        Ok(())
    }

    /// 发送 `quit` 并无条件关闭连接
    ///
    /// 任何退出路径都释放连接：quit 写失败也照常关闭。
    pub async fn disconnect(&mut self) -> Result<()> {
        let quit_result = self.conn.write_line("quit").await;
        let close_result = self.conn.close().await;
        self.state = SessionState::Terminated;
        info!("session terminated");
        quit_result.and(close_result)
    }

    /// 期望 103 邀约受理应答，并从中提取对局编号
    async fn expect_offer_ack(&mut self) -> Result<()> {
        let line = self.read_significant_line().await?;
        if reply_code(&line) != Some(CODE_OFFER_ACK) {
            return Err(ProtocolError::Violation {
                expected: "103 offer acknowledgement",
                line,
            });
        }
        if let Some(number) = first_integer(&line.trim_start()[3..]) {
            self.game_number = Some(number);
        }
        self.state = SessionState::AwaitingGameInfo;
        Ok(())
    }

    /// 阻塞等待 105/106 对局信息行，然后读出首个棋盘块
    ///
    /// 被指派执黑时，棋盘之前必须先消费对手的首着行。
    async fn await_game_start(&mut self) -> Result<GameStart> {
        let line = self.read_significant_line().await?;
        let color = match reply_code(&line) {
            Some(CODE_GAME_STARTS_WHITE) => Color::White,
            Some(CODE_GAME_STARTS_BLACK) => Color::Black,
            _ => {
                return Err(ProtocolError::Violation {
                    expected: "105/106 game-info line",
                    line,
                });
            }
        };
        info!(%color, "game starts");
        self.color = Some(color);
        self.state = SessionState::InGame;

        let opponent_move = if color == Color::Black {
            let line = self.read_significant_line().await?;
            Some(parse_opponent_move(&line)?)
        } else {
            None
        };

        let snapshot = self.read_snapshot().await?;
        Ok(GameStart {
            color,
            opponent_move,
            snapshot,
        })
    }

    /// 读取一个棋盘块：首个非空行是 `<回合数> <走子方>` 头行，之后的
    /// 行累积为棋盘主体，直到以 `?` 开头的计时行结束该块
    async fn read_snapshot(&mut self) -> Result<BoardSnapshot> {
        let mut doc = String::new();
        loop {
            let line = self.conn.read_line().await?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('?') {
                let clock = Clock::parse(trimmed)?;
                let snapshot = BoardSnapshot::parse(&doc)?;
                if clock.color != snapshot.to_move {
                    warn!(
                        clock_color = %clock.color,
                        to_move = %snapshot.to_move,
                        "timer line color does not match side to move"
                    );
                }
                return Ok(snapshot.with_time_left(clock.remaining));
            }
            doc.push_str(trimmed);
            doc.push('\n');
        }
    }

    /// 读取下一个非空行（空行是协议填充，不改变状态）
    async fn read_significant_line(&mut self) -> Result<String> {
        loop {
            let line = self.conn.read_line().await?;
            if !line.trim().is_empty() {
                return Ok(line);
            }
        }
    }

    /// 校验发起新请求的状态；终局后的会话可以直接开始下一局
    fn require_ready(&mut self, op: &'static str) -> Result<()> {
        if self.state == SessionState::GameOver {
            self.state = SessionState::Authenticated;
            self.color = None;
            self.game_number = None;
        }
        self.require_state(&[SessionState::Authenticated], op)
    }

    fn require_state(&self, allowed: &[SessionState], op: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ProtocolError::BadState {
                op,
                state: self.state.name().to_string(),
            })
        }
    }
}

/// 登录/注册应答是否成功（2xx 应答码，或无码时不含失败措辞）
fn is_success(line: &str) -> bool {
    match reply_code(line) {
        Some(code) => (200..300).contains(&code),
        None => false,
    }
}

/// 解析对手着法行：`! e4-e3` 形式，感叹号前缀可省略
fn parse_opponent_move(line: &str) -> Result<String> {
    let text = line.trim();
    let text = text.strip_prefix('!').unwrap_or(text).trim();
    if text.is_empty() {
        return Err(ProtocolError::Violation {
            expected: "opponent move line",
            line: line.to_string(),
        });
    }
    Ok(text.to_string())
}

/// 行内第一个十进制整数
fn first_integer(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|t| !t.is_empty())
        .and_then(|t| t.parse().ok())
}
