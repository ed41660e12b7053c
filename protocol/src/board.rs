//! 棋盘与棋盘快照
//!
//! 棋盘文本格式（服务端下发、编码器输入一致）：
//! 首行 `<回合数> <走子方>`，随后恰好 6 行、每行恰好 5 个格子符号，
//! 顶行为第 6 横排。符号表为 `{K,Q,B,N,R,P,k,q,b,n,r,p,.}`。

use std::fmt;
use std::time::Duration;

use crate::constants::{BOARD_COLS, BOARD_ROWS};
use crate::error::CodecError;
use crate::piece::{Color, Piece, PieceKind, Square};

/// 6×5 棋盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// 行优先存储，序号与 Square::index 一致
    cells: [Option<Piece>; BOARD_ROWS * BOARD_COLS],
}

impl Board {
    /// 空棋盘
    pub fn empty() -> Self {
        Self {
            cells: [None; BOARD_ROWS * BOARD_COLS],
        }
    }

    /// 标准开局棋盘
    pub fn initial() -> Self {
        Self::parse_rows(&["kqbnr", "ppppp", ".....", ".....", "PPPPP", "RNBQK"])
            .expect("initial board layout should be valid")
    }

    /// 获取指定格子的棋子
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.index()]
    }

    /// 设置指定格子的棋子
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.index()] = piece;
    }

    /// 按行优先顺序收集某类棋子所在的全部格子
    pub fn squares_of(&self, kind: PieceKind, color: Color) -> Vec<Square> {
        let target = Piece::new(kind, color);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Some(target))
            .map(|(i, _)| Square::from_index(i).expect("cell index is in range"))
            .collect()
    }

    /// 某一方全部棋子的占位掩码
    pub fn occupancy(&self, color: Color) -> u32 {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.map(|p| p.color) == Some(color))
            .fold(0, |mask, (i, _)| mask | crate::constants::square_bit(i))
    }

    /// 全部空格的掩码
    pub fn empty_mask(&self) -> u32 {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .fold(0, |mask, (i, _)| mask | crate::constants::square_bit(i))
    }

    /// 从 6 行棋盘主体文本解析
    pub fn parse_rows(rows: &[&str]) -> Result<Board, CodecError> {
        if rows.len() != BOARD_ROWS {
            return Err(CodecError::BadRowCount {
                expected: BOARD_ROWS,
                got: rows.len(),
            });
        }
        let mut board = Board::empty();
        for (row, text) in rows.iter().enumerate() {
            let symbols: Vec<char> = text.chars().collect();
            if symbols.len() != BOARD_COLS {
                return Err(CodecError::BadColCount {
                    row,
                    got: symbols.len(),
                    expected: BOARD_COLS,
                });
            }
            for (col, &symbol) in symbols.iter().enumerate() {
                let square = Square::new(row, col).expect("row/col checked above");
                if symbol == '.' {
                    continue;
                }
                match Piece::from_ascii(symbol) {
                    Some(piece) => board.set(square, Some(piece)),
                    None => {
                        return Err(CodecError::BadSymbol { symbol, row, col });
                    }
                }
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_ROWS {
            for col in 0..BOARD_COLS {
                let square = Square::new(row, col).expect("row/col in range");
                match self.get(square) {
                    Some(piece) => write!(f, "{}", piece.to_ascii())?,
                    None => write!(f, ".")?,
                }
            }
            if row + 1 < BOARD_ROWS {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// 棋盘快照：棋盘、回合数、走子方与走子方剩余时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub board: Board,
    /// 回合数，从 1 起
    pub move_number: u32,
    pub to_move: Color,
    /// 走子方剩余时间；从文本解析时为零，由计时行补上
    pub time_left: Duration,
}

impl BoardSnapshot {
    /// 解析完整棋盘文本（头行 + 6 行主体）
    pub fn parse(text: &str) -> Result<BoardSnapshot, CodecError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let header = lines
            .next()
            .ok_or_else(|| CodecError::BadHeader(String::new()))?;

        let mut fields = header.split_whitespace();
        let move_number: u32 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .filter(|&n| n >= 1)
            .ok_or_else(|| CodecError::BadHeader(header.to_string()))?;
        let to_move = fields
            .next()
            .and_then(|f| f.chars().next())
            .and_then(Color::from_char)
            .ok_or_else(|| CodecError::BadHeader(header.to_string()))?;
        if fields.next().is_some() {
            return Err(CodecError::BadHeader(header.to_string()));
        }

        let rows: Vec<&str> = lines.collect();
        let board = Board::parse_rows(&rows)?;

        Ok(BoardSnapshot {
            board,
            move_number,
            to_move,
            time_left: Duration::ZERO,
        })
    }

    /// 补上计时行解码出的剩余时间
    pub fn with_time_left(mut self, time_left: Duration) -> Self {
        self.time_left = time_left;
        self
    }

    /// 剩余时间（整数毫秒）
    pub fn time_left_millis(&self) -> u64 {
        self.time_left.as_millis() as u64
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.move_number, self.to_move)?;
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "1 W\nkqbnr\nppppp\n.....\n.....\nPPPPP\nRNBQK";

    #[test]
    fn test_parse_initial_board() {
        let snapshot = BoardSnapshot::parse(START).unwrap();
        assert_eq!(snapshot.move_number, 1);
        assert_eq!(snapshot.to_move, Color::White);
        assert_eq!(snapshot.board, Board::initial());

        // 黑王在 a6，白王在 e1
        let a6 = Square::new(0, 0).unwrap();
        assert_eq!(
            snapshot.board.get(a6),
            Some(Piece::new(PieceKind::King, Color::Black))
        );
        let e1 = Square::new(5, 4).unwrap();
        assert_eq!(
            snapshot.board.get(e1),
            Some(Piece::new(PieceKind::King, Color::White))
        );
    }

    #[test]
    fn test_display_roundtrip() {
        let snapshot = BoardSnapshot::parse(START).unwrap();
        let rendered = snapshot.to_string();
        assert_eq!(BoardSnapshot::parse(&rendered).unwrap(), snapshot);
    }

    #[test]
    fn test_occupancy_masks() {
        let snapshot = BoardSnapshot::parse(START).unwrap();
        let white = snapshot.board.occupancy(Color::White);
        let black = snapshot.board.occupancy(Color::Black);
        let empty = snapshot.board.empty_mask();

        assert_eq!(white.count_ones(), 10);
        assert_eq!(black.count_ones(), 10);
        assert_eq!(empty.count_ones(), 10);
        // 三个掩码互不相交且铺满棋盘
        assert_eq!(white & black, 0);
        assert_eq!((white | black) & empty, 0);
        assert_eq!(white | black | empty, crate::constants::ALL_SQUARES_MASK);
    }

    #[test]
    fn test_bad_row_count() {
        let text = "1 W\nkqbnr\nppppp";
        assert!(matches!(
            BoardSnapshot::parse(text),
            Err(CodecError::BadRowCount { expected: 6, got: 2 })
        ));
    }

    #[test]
    fn test_bad_col_count() {
        let text = "1 W\nkqbnr\npppppp\n.....\n.....\nPPPPP\nRNBQK";
        assert!(matches!(
            BoardSnapshot::parse(text),
            Err(CodecError::BadColCount { row: 1, got: 6, .. })
        ));
    }

    #[test]
    fn test_bad_symbol() {
        let text = "1 W\nkqbnr\nppppp\n..x..\n.....\nPPPPP\nRNBQK";
        assert!(matches!(
            BoardSnapshot::parse(text),
            Err(CodecError::BadSymbol {
                symbol: 'x',
                row: 2,
                col: 2
            })
        ));
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            BoardSnapshot::parse("0 W\nkqbnr\nppppp\n.....\n.....\nPPPPP\nRNBQK"),
            Err(CodecError::BadHeader(_))
        ));
        assert!(matches!(
            BoardSnapshot::parse("1 X\nkqbnr\nppppp\n.....\n.....\nPPPPP\nRNBQK"),
            Err(CodecError::BadHeader(_))
        ));
    }
}
