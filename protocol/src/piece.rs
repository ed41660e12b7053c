//! 棋子与格子定义

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_COLS, BOARD_ROWS, SQUARE_COUNT};

/// 走子方颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// 对方颜色
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 协议中使用的颜色字母
    pub fn to_char(self) -> char {
        match self {
            Color::White => 'W',
            Color::Black => 'B',
        }
    }

    /// 从协议字母解析
    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'W' | 'w' => Some(Color::White),
            'B' | 'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 位板中的走子方编码：白 1，黑 2
    pub fn player_number(self) -> u32 {
        match self {
            Color::White => 1,
            Color::Black => 2,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// 邀约对局时的执色选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    White,
    Black,
    /// 由服务端分配
    Any,
}

impl ColorChoice {
    /// offer/accept 命令中使用的字符串
    pub fn as_str(self) -> &'static str {
        match self {
            ColorChoice::White => "W",
            ColorChoice::Black => "B",
            ColorChoice::Any => "?",
        }
    }
}

impl From<Color> for ColorChoice {
    fn from(color: Color) -> Self {
        match color {
            Color::White => ColorChoice::White,
            Color::Black => ColorChoice::Black,
        }
    }
}

/// 棋子类型（五六棋缩减棋制：无王车易位、吃过路兵，升变只到皇后）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceKind {
    /// 棋盘文本中的小写字母（黑方形式）
    pub fn to_lower_char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Pawn => 'p',
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// 从棋盘文本符号解析（大写白方，小写黑方；'.' 不是棋子）
    pub fn from_ascii(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'b' => PieceKind::Bishop,
            'n' => PieceKind::Knight,
            'r' => PieceKind::Rook,
            'p' => PieceKind::Pawn,
            _ => return None,
        };
        Some(Piece { kind, color })
    }

    /// 棋盘文本符号
    pub fn to_ascii(self) -> char {
        let c = self.kind.to_lower_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

/// 格子：按行优先序号标识，0 = a6（左上），29 = e1（右下）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    index: usize,
}

impl Square {
    /// 由行列构造（row 0 为第 6 横排，col 0 为 a 纵列）
    pub fn new(row: usize, col: usize) -> Option<Square> {
        if row < BOARD_ROWS && col < BOARD_COLS {
            Some(Square {
                index: row * BOARD_COLS + col,
            })
        } else {
            None
        }
    }

    /// 由行优先序号构造
    pub fn from_index(index: usize) -> Option<Square> {
        if index < SQUARE_COUNT {
            Some(Square { index })
        } else {
            None
        }
    }

    /// 由单一格子位构造
    pub fn from_bit(bit: u32) -> Option<Square> {
        if bit.count_ones() != 1 {
            return None;
        }
        let pos = bit.trailing_zeros() as usize;
        if pos >= SQUARE_COUNT {
            return None;
        }
        Some(Square {
            index: SQUARE_COUNT - 1 - pos,
        })
    }

    /// 行优先序号
    pub fn index(self) -> usize {
        self.index
    }

    /// 所在行（0 为顶行）
    pub fn row(self) -> usize {
        self.index / BOARD_COLS
    }

    /// 所在列（0 为 a 列）
    pub fn col(self) -> usize {
        self.index % BOARD_COLS
    }

    /// 对应的位值（a6 = bit 29 ... e1 = bit 0）
    pub fn bit(self) -> u32 {
        crate::constants::square_bit(self.index)
    }

    /// 代数名称，如 "a6"、"e1"
    pub fn name(self) -> String {
        let file = (b'a' + self.col() as u8) as char;
        let rank = BOARD_ROWS - self.row();
        format!("{}{}", file, rank)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_ascii_roundtrip() {
        for c in "KQBNRPkqbnrp".chars() {
            let piece = Piece::from_ascii(c).unwrap();
            assert_eq!(piece.to_ascii(), c);
        }
        assert_eq!(Piece::from_ascii('.'), None);
        assert_eq!(Piece::from_ascii('x'), None);
    }

    #[test]
    fn test_square_names() {
        assert_eq!(Square::from_index(0).unwrap().name(), "a6");
        assert_eq!(Square::from_index(4).unwrap().name(), "e6");
        assert_eq!(Square::from_index(25).unwrap().name(), "a1");
        assert_eq!(Square::from_index(29).unwrap().name(), "e1");
    }

    #[test]
    fn test_square_bit_roundtrip() {
        for i in 0..SQUARE_COUNT {
            let sq = Square::from_index(i).unwrap();
            assert_eq!(Square::from_bit(sq.bit()), Some(sq));
        }
        // 升变标志位不是格子位
        assert_eq!(Square::from_bit(crate::constants::PROMOTED_FLAG), None);
        assert_eq!(Square::from_bit(0), None);
        assert_eq!(Square::from_bit(0b11), None);
    }
}
