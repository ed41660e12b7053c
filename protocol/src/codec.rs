//! 位板编解码
//!
//! 将棋盘快照编码为外部引擎使用的 24 整数位板向量：
//! 前 20 个整数按固定槽位顺序 `k,q,b,n,r,p,p,p,p,p,P,P,P,P,P,R,N,B,Q,K`
//! 存放各棋子所在格子的位值（缺子记 0）；第 21 个是回合数，第 22 个是
//! 走子方编码（白 1 黑 2），第 23 个是对方占位掩码，第 24 个是空格掩码。
//!
//! 同方第二个及以后的皇后视为升变兵：其位值置上 bit 30 后追加到该方
//! 兵槽位列表（排在天然兵之后），兵槽位不足 5 个时右侧补 0。
//!
//! 解码是部分的：升变兵还原为皇后，掩码字段不参与重建，时钟无法恢复。

use crate::board::{Board, BoardSnapshot};
use crate::constants::{BITBOARD_LEN, PAWN_SLOTS, PROMOTED_FLAG};
use crate::error::CodecError;
use crate::piece::{Color, Piece, PieceKind, Square};

/// 位板编解码器
pub struct Bitboard;

/// 一方棋子的槽位值分组
struct SideGroups {
    king: u32,
    queen: u32,
    bishop: u32,
    knight: u32,
    rook: u32,
    pawns: [u32; PAWN_SLOTS],
}

/// 前 20 个槽位的固定布局
const SLOT_LAYOUT: [(PieceKind, Color); 20] = [
    (PieceKind::King, Color::Black),
    (PieceKind::Queen, Color::Black),
    (PieceKind::Bishop, Color::Black),
    (PieceKind::Knight, Color::Black),
    (PieceKind::Rook, Color::Black),
    (PieceKind::Pawn, Color::Black),
    (PieceKind::Pawn, Color::Black),
    (PieceKind::Pawn, Color::Black),
    (PieceKind::Pawn, Color::Black),
    (PieceKind::Pawn, Color::Black),
    (PieceKind::Pawn, Color::White),
    (PieceKind::Pawn, Color::White),
    (PieceKind::Pawn, Color::White),
    (PieceKind::Pawn, Color::White),
    (PieceKind::Pawn, Color::White),
    (PieceKind::Rook, Color::White),
    (PieceKind::Knight, Color::White),
    (PieceKind::Bishop, Color::White),
    (PieceKind::Queen, Color::White),
    (PieceKind::King, Color::White),
];

impl Bitboard {
    /// 编码棋盘快照为 24 整数位板向量
    pub fn encode(snapshot: &BoardSnapshot) -> Result<[u32; BITBOARD_LEN], CodecError> {
        let black = collect_side(&snapshot.board, Color::Black)?;
        let white = collect_side(&snapshot.board, Color::White)?;

        let mut out = [0u32; BITBOARD_LEN];
        out[0] = black.king;
        out[1] = black.queen;
        out[2] = black.bishop;
        out[3] = black.knight;
        out[4] = black.rook;
        out[5..10].copy_from_slice(&black.pawns);
        out[10..15].copy_from_slice(&white.pawns);
        out[15] = white.rook;
        out[16] = white.knight;
        out[17] = white.bishop;
        out[18] = white.queen;
        out[19] = white.king;
        out[20] = snapshot.move_number;
        out[21] = snapshot.to_move.player_number();
        out[22] = snapshot.board.occupancy(snapshot.to_move.opponent());
        out[23] = snapshot.board.empty_mask();
        Ok(out)
    }

    /// 渲染为一行空格分隔的十进制整数（引擎通道的请求体）
    pub fn to_wire_line(values: &[u32; BITBOARD_LEN]) -> String {
        values
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 解析一行空格分隔的位板向量
    pub fn parse_wire_line(line: &str) -> Result<[u32; BITBOARD_LEN], CodecError> {
        let mut values = [0u32; BITBOARD_LEN];
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != BITBOARD_LEN {
            return Err(CodecError::BadVectorLen(fields.len()));
        }
        for (slot, field) in fields.iter().enumerate() {
            values[slot] = field.parse().map_err(|_| CodecError::BadVectorField {
                field: field.to_string(),
            })?;
        }
        Ok(values)
    }

    /// 部分解码：从位板向量重建棋盘、回合数与走子方
    ///
    /// 升变兵槽位还原为皇后；掩码字段被忽略；剩余时间记零。
    pub fn decode(values: &[u32]) -> Result<BoardSnapshot, CodecError> {
        if values.len() != BITBOARD_LEN {
            return Err(CodecError::BadVectorLen(values.len()));
        }

        let mut board = Board::empty();
        for (slot, &(kind, color)) in SLOT_LAYOUT.iter().enumerate() {
            let value = values[slot];
            if value == 0 {
                continue;
            }
            let promoted = value & PROMOTED_FLAG != 0;
            if promoted && kind != PieceKind::Pawn {
                // 升变标志只允许出现在兵槽位
                return Err(CodecError::BadSlotValue { value });
            }
            let square = Square::from_bit(value & !PROMOTED_FLAG)
                .ok_or(CodecError::BadSlotValue { value })?;
            if board.get(square).is_some() {
                return Err(CodecError::SquareClash {
                    square: square.name(),
                });
            }
            let kind = if promoted { PieceKind::Queen } else { kind };
            board.set(square, Some(Piece::new(kind, color)));
        }

        let move_number = values[20];
        if move_number < 1 {
            return Err(CodecError::BadMoveNumber(move_number));
        }
        let to_move = match values[21] {
            1 => Color::White,
            2 => Color::Black,
            code => return Err(CodecError::BadSideCode(code)),
        };

        Ok(BoardSnapshot {
            board,
            move_number,
            to_move,
            time_left: std::time::Duration::ZERO,
        })
    }
}

/// 收集一方的槽位值
///
/// 单槽位棋子（王、象、马、车）出现多于一个，或兵槽位在补零前超过
/// 5 个，都是固定容量错误；除此之外不做行棋规则校验。
fn collect_side(board: &Board, color: Color) -> Result<SideGroups, CodecError> {
    let single = |kind: PieceKind| -> Result<u32, CodecError> {
        let squares = board.squares_of(kind, color);
        match squares.len() {
            0 => Ok(0),
            1 => Ok(squares[0].bit()),
            count => Err(CodecError::SlotOverflow {
                piece: Piece::new(kind, color).to_ascii(),
                count,
                capacity: 1,
            }),
        }
    };

    let king = single(PieceKind::King)?;
    let bishop = single(PieceKind::Bishop)?;
    let knight = single(PieceKind::Knight)?;
    let rook = single(PieceKind::Rook)?;

    // 第一个皇后占皇后槽位，其余视为升变兵
    let queens = board.squares_of(PieceKind::Queen, color);
    let queen = queens.first().map(|s| s.bit()).unwrap_or(0);

    let mut pawns: Vec<u32> = board
        .squares_of(PieceKind::Pawn, color)
        .iter()
        .map(|s| s.bit())
        .collect();
    for promoted in queens.iter().skip(1) {
        pawns.push(promoted.bit() | PROMOTED_FLAG);
    }
    if pawns.len() > PAWN_SLOTS {
        return Err(CodecError::SlotOverflow {
            piece: Piece::new(PieceKind::Pawn, color).to_ascii(),
            count: pawns.len(),
            capacity: PAWN_SLOTS,
        });
    }
    pawns.resize(PAWN_SLOTS, 0);
    let pawns: [u32; PAWN_SLOTS] = pawns.try_into().expect("resized to PAWN_SLOTS");

    Ok(SideGroups {
        king,
        queen,
        bishop,
        knight,
        rook,
        pawns,
    })
}
