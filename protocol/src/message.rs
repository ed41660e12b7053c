//! 服务端消息分类与解析
//!
//! IMCS 的应答没有统一封包：一部分行带三位数字应答码，一部分靠内容
//! 模式识别（`illegal move` 拒招、含 `=` 的终局行、`?` 开头的计时行）。
//! 此模块提供这些分类与解析工具，消息本身是瞬态的，不做持久化。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::error::ProtocolError;
use crate::piece::Color;

/// 对局结果（以本方视角）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Draw,
    Loss,
}

/// 一行服务端输出的分类结果
///
/// 对每一条可能改变协议状态的行都先做此分类，只有都不匹配时才按
/// 当前状态的期望模式继续解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerLine {
    /// 空行（协议填充，忽略）
    Blank,
    /// 含 "illegal move" 的拒招行——可恢复，状态停留在对局中
    IllegalMove,
    /// 含终局标记 '=' 的结果行
    GameOver(GameOutcome),
    /// 其他行，交由调用方按期望模式解析
    Other,
}

impl ServerLine {
    /// 按终局/拒招模式对一行分类；`local_color` 用于判定胜负归属
    pub fn classify(line: &str, local_color: Option<Color>) -> ServerLine {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ServerLine::Blank;
        }
        if trimmed.contains("illegal move") {
            return ServerLine::IllegalMove;
        }
        if trimmed.contains('=') {
            return ServerLine::GameOver(classify_outcome(trimmed, local_color));
        }
        ServerLine::Other
    }
}

/// 终局行的胜负判定：本方颜色后跟 wins 算胜，提到 draw 算和，其余算负
fn classify_outcome(line: &str, local_color: Option<Color>) -> GameOutcome {
    if let Some(color) = local_color {
        if line.contains(&format!("{} wins", color.to_char())) {
            return GameOutcome::Win;
        }
    }
    if line.contains("draw") {
        return GameOutcome::Draw;
    }
    GameOutcome::Loss
}

/// 取行首的三位数字应答码
pub fn reply_code(line: &str) -> Option<u16> {
    let token = line.split_whitespace().next()?;
    if token.len() == 3 && token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// 对局开始信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStart {
    /// 服务端指派的执色
    pub color: Color,
    /// 执黑时在首个棋盘之前收到的对手首着
    pub opponent_move: Option<String>,
    /// 首个棋盘快照（含剩余时间）
    pub snapshot: BoardSnapshot,
}

/// send_move 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveReply {
    /// 对手应招与新的棋盘快照
    Continue {
        opponent_move: String,
        snapshot: BoardSnapshot,
    },
    /// 对局结束
    GameOver(GameOutcome),
}

/// 解析后的对局邀约行
///
/// `list` 操作按到达顺序原样返回带 `[offer]` 标记的行；这里提供
/// 字段视图：`<编号> <对手名> <执色> <本方时间> <对方时间> <等级分> [offer]`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOffer {
    pub id: u32,
    pub opponent: String,
    /// 对手邀约的执色，'?' 时为 None
    pub offered_color: Option<Color>,
    pub my_time: String,
    pub opponent_time: String,
    pub rank: String,
}

impl GameOffer {
    /// 解析一条邀约行；不含 `[offer]` 标记或字段不全时返回 None
    pub fn parse(line: &str) -> Option<GameOffer> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.last() != Some(&"[offer]") || fields.len() < 7 {
            return None;
        }
        Some(GameOffer {
            id: fields[0].parse().ok()?,
            opponent: fields[1].to_string(),
            offered_color: fields[2].chars().next().and_then(Color::from_char),
            my_time: fields[3].to_string(),
            opponent_time: fields[4].to_string(),
            rank: fields[5].to_string(),
        })
    }
}

/// 计时行：`?<颜色> <分>:<秒>:<毫秒>`
///
/// 三个字段都是无符号整数；剩余时间以整数毫秒表达，等于
/// `分*60000 + 秒*1000 + 毫秒`。字段含小数即视为格式错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub color: Color,
    pub remaining: Duration,
}

impl Clock {
    /// 解析一条计时行
    pub fn parse(line: &str) -> Result<Clock, ProtocolError> {
        let violation = || ProtocolError::Violation {
            expected: "timer line '?<color> <min>:<sec>:<ms>'",
            line: line.to_string(),
        };

        let rest = line.trim().strip_prefix('?').ok_or_else(violation)?;
        let mut parts = rest.split_whitespace();
        let color = parts
            .next()
            .and_then(|t| t.chars().next())
            .and_then(Color::from_char)
            .ok_or_else(violation)?;
        let fields: Vec<&str> = parts.next().ok_or_else(violation)?.split(':').collect();
        if fields.len() != 3 || parts.next().is_some() {
            return Err(violation());
        }
        let mut numbers = [0u64; 3];
        for (i, field) in fields.iter().enumerate() {
            numbers[i] = field.parse().map_err(|_| violation())?;
        }

        let millis = numbers[0] * 60_000 + numbers[1] * 1_000 + numbers[2];
        Ok(Clock {
            color,
            remaining: Duration::from_millis(millis),
        })
    }

    /// 剩余时间（整数毫秒）
    pub fn millis(&self) -> u64 {
        self.remaining.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_blank_and_other() {
        assert_eq!(ServerLine::classify("", None), ServerLine::Blank);
        assert_eq!(ServerLine::classify("  \r", None), ServerLine::Blank);
        assert_eq!(
            ServerLine::classify("! b2-b3", Some(Color::White)),
            ServerLine::Other
        );
    }

    #[test]
    fn test_classify_illegal_move() {
        assert_eq!(
            ServerLine::classify("402 illegal move b2-b9", Some(Color::White)),
            ServerLine::IllegalMove
        );
    }

    #[test]
    fn test_classify_outcomes() {
        // 本方颜色后跟 wins 算胜
        assert_eq!(
            ServerLine::classify("= W wins on checkmate", Some(Color::White)),
            ServerLine::GameOver(GameOutcome::Win)
        );
        // 提到 draw 算和
        assert_eq!(
            ServerLine::classify("= draw by agreement", Some(Color::White)),
            ServerLine::GameOver(GameOutcome::Draw)
        );
        // 其余终局行算负
        assert_eq!(
            ServerLine::classify("= B wins on time", Some(Color::White)),
            ServerLine::GameOver(GameOutcome::Loss)
        );
        // 未指派执色时不可能判胜
        assert_eq!(
            ServerLine::classify("= W wins on checkmate", None),
            ServerLine::GameOver(GameOutcome::Loss)
        );
    }

    #[test]
    fn test_reply_code() {
        assert_eq!(reply_code("103 game 21 waiting"), Some(103));
        assert_eq!(reply_code("105"), Some(105));
        assert_eq!(reply_code("hello"), None);
        assert_eq!(reply_code("42 too-short"), None);
        assert_eq!(reply_code(""), None);
    }

    #[test]
    fn test_parse_offer_line() {
        let line = " 5 alice W 300.0 300.0 1204 [offer]";
        let offer = GameOffer::parse(line).unwrap();
        assert_eq!(offer.id, 5);
        assert_eq!(offer.opponent, "alice");
        assert_eq!(offer.offered_color, Some(Color::White));
        assert_eq!(offer.my_time, "300.0");
        assert_eq!(offer.opponent_time, "300.0");
        assert_eq!(offer.rank, "1204");

        // '?' 执色表示由服务端分配
        let line = " 9 bob ? 60.0 60.0 unrated [offer]";
        assert_eq!(GameOffer::parse(line).unwrap().offered_color, None);

        assert_eq!(GameOffer::parse("211 2 games available"), None);
        assert_eq!(GameOffer::parse("."), None);
    }

    #[test]
    fn test_clock_parse() {
        let clock = Clock::parse("?W 4:58:300").unwrap();
        assert_eq!(clock.color, Color::White);
        assert_eq!(clock.millis(), 4 * 60_000 + 58 * 1_000 + 300);

        let clock = Clock::parse("?B 0:05:000").unwrap();
        assert_eq!(clock.color, Color::Black);
        assert_eq!(clock.millis(), 5_000);
    }

    #[test]
    fn test_clock_parse_errors() {
        assert!(Clock::parse("W 4:58:300").is_err());
        assert!(Clock::parse("?X 4:58:300").is_err());
        assert!(Clock::parse("?W 4:58").is_err());
        assert!(Clock::parse("?W 4:58:300:1").is_err());
        // 字段含小数视为格式错误
        assert!(Clock::parse("?W 4:58.5:300").is_err());
        assert!(Clock::parse("?W").is_err());
    }
}
