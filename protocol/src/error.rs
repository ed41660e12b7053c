//! 错误类型定义

use thiserror::Error;

/// 棋盘文本与位板编解码错误
///
/// 只做固定容量与格式校验，不做任何行棋规则校验。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// 头行缺失或格式错误
    #[error("Invalid board header line: {0:?}")]
    BadHeader(String),

    /// 棋盘行数不对
    #[error("Expected {expected} board rows, got {got}")]
    BadRowCount { expected: usize, got: usize },

    /// 某一行列数不对
    #[error("Board row {row} has {got} columns, expected {expected}")]
    BadColCount {
        row: usize,
        got: usize,
        expected: usize,
    },

    /// 无法识别的格子符号
    #[error("Unrecognized cell symbol '{symbol}' at row {row}, column {col}")]
    BadSymbol { symbol: char, row: usize, col: usize },

    /// 某一棋子类型的数量超出槽位容量
    #[error("Too many '{piece}' pieces: {count} exceeds slot capacity {capacity}")]
    SlotOverflow {
        piece: char,
        count: usize,
        capacity: usize,
    },

    /// 位板向量长度不对
    #[error("Bitboard vector has {0} values, expected 24")]
    BadVectorLen(usize),

    /// 槽位值不是合法的格子位
    #[error("Slot value {value:#x} is not a valid square bit")]
    BadSlotValue { value: u32 },

    /// 两个槽位落在同一格子
    #[error("Square {square} is occupied by two pieces")]
    SquareClash { square: String },

    /// 走子方编码不是 1 或 2
    #[error("Side-to-move code {0} is not 1 (White) or 2 (Black)")]
    BadSideCode(u32),

    /// 回合数不合法（必须 ≥ 1）
    #[error("Move number {0} is out of range (must be >= 1)")]
    BadMoveNumber(u32),

    /// 无法解析为整数的位板字段
    #[error("Bitboard field {field:?} is not an integer")]
    BadVectorField { field: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 连接超时
    #[error("Connection timeout")]
    ConnectTimeout,

    /// 读取超过期限
    #[error("Read timed out waiting for server reply")]
    ReadTimeout,

    /// 连接被对端关闭
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// 登录/注册失败
    #[error("Authentication failed: {reason} (server said: {line:?})")]
    Authentication { reason: String, line: String },

    /// 服务端应答不符合当前状态的期望模式
    #[error("Protocol violation: expected {expected}, got line {line:?}")]
    Violation { expected: &'static str, line: String },

    /// 服务端拒绝了这步棋（可恢复，连接与对局继续有效）
    #[error("Server rejected move {mv:?}: {line:?}")]
    InvalidMove { mv: String, line: String },

    /// 操作与当前会话状态不符
    #[error("Operation '{op}' not allowed in session state {state}")]
    BadState { op: &'static str, state: String },

    /// 编解码错误
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ProtocolError {
    /// 是否为可恢复错误（对局与连接继续有效）
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::InvalidMove { .. })
    }
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
