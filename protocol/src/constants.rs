//! 协议与棋盘常量定义

use std::time::Duration;

/// 棋盘行数（横排，顶行为第 6 横排）
pub const BOARD_ROWS: usize = 6;

/// 棋盘列数（纵列 a 到 e）
pub const BOARD_COLS: usize = 5;

/// 格子总数
pub const SQUARE_COUNT: usize = BOARD_ROWS * BOARD_COLS;

/// 位板向量总长度
pub const BITBOARD_LEN: usize = 24;

/// 每方兵槽位数量
pub const PAWN_SLOTS: usize = 5;

/// 升变标志位：同方第二个及以后的皇后记入兵槽位时置此位
pub const PROMOTED_FLAG: u32 = 1 << 30;

/// 对局邀约已受理
pub const CODE_OFFER_ACK: u16 = 103;

/// 对局开始，本方执白
pub const CODE_GAME_STARTS_WHITE: u16 = 105;

/// 对局开始，本方执黑（紧随其后是对手的首着行）
pub const CODE_GAME_STARTS_BLACK: u16 = 106;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 单次读取期限（秒）——需要覆盖对手整局的思考时间
pub const READ_TIMEOUT_SECS: u64 = 600;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 单次读取期限 Duration
pub const READ_TIMEOUT: Duration = Duration::from_secs(READ_TIMEOUT_SECS);

/// 全部 30 个格子位的按位或
pub const ALL_SQUARES_MASK: u32 = (1 << SQUARE_COUNT) - 1;

/// 格子序号对应的位值
///
/// 按行优先顺序（a6, b6, ..., e1）枚举 30 个格子，首个格子 a6 取
/// bit 29，末个格子 e1 取 bit 0。
pub const fn square_bit(index: usize) -> u32 {
    1 << (SQUARE_COUNT - 1 - index)
}
