//! 对局记录存储
//!
//! 每局终了把结构化记录（双方着法、结果、时间戳）保存为 JSON 文件，
//! 便于事后复盘。

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use protocol::{Color, GameOutcome};

/// 一步棋的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    /// 走子方
    pub by: Color,
    /// 着法文本，如 `c2-c3`
    pub movetext: String,
    /// 走完这步后本方剩余时间（毫秒）；对手的着法没有这个值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left_ms: Option<u64>,
}

/// 一局棋的完整记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTranscript {
    /// 本方执色
    pub color: Color,
    /// 对手名（接受邀约时已知，自己邀约时未知）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    /// 服务端的对局编号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_number: Option<u32>,
    pub moves: Vec<MoveEntry>,
    /// 终局结果；认输等异常收尾时可能缺失
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl GameTranscript {
    /// 开启一局新记录
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opponent: None,
            game_number: None,
            moves: Vec::new(),
            outcome: None,
            finished_at: Utc::now(),
        }
    }

    /// 追加一步棋
    pub fn push_move(&mut self, by: Color, movetext: impl Into<String>, time_left_ms: Option<u64>) {
        self.moves.push(MoveEntry {
            by,
            movetext: movetext.into(),
            time_left_ms,
        });
    }

    /// 记录终局并盖上完成时间
    pub fn finish(&mut self, outcome: GameOutcome) {
        self.outcome = Some(outcome);
        self.finished_at = Utc::now();
    }
}

/// 对局记录存储
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// 使用平台数据目录下的默认位置
    pub fn new() -> Result<Self> {
        let dir = dirs::data_dir()
            .context("无法确定数据目录")?
            .join("minichess-client")
            .join("games");
        Self::with_dir(dir)
    }

    /// 使用指定目录
    pub fn with_dir(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir).with_context(|| format!("无法创建存储目录: {:?}", dir))?;
        }
        Ok(Self { dir })
    }

    /// 保存一局记录，返回文件名
    pub fn save(&self, transcript: &GameTranscript) -> Result<String> {
        let filename = format!(
            "{}_{}.json",
            transcript.finished_at.format("%Y%m%d_%H%M%S"),
            transcript.opponent.as_deref().unwrap_or("unknown")
        );
        let path = self.dir.join(&filename);
        let content = serde_json::to_string_pretty(transcript).context("序列化对局记录失败")?;
        fs::write(&path, content).with_context(|| format!("写入对局记录失败: {:?}", path))?;
        Ok(filename)
    }

    /// 列出已保存的记录文件名
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("读取存储目录失败: {:?}", self.dir))?
        {
            let path = entry.context("读取目录项失败")?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// 加载一局记录
    pub fn load(&self, filename: &str) -> Result<GameTranscript> {
        let path = self.dir.join(filename);
        let content =
            fs::read_to_string(&path).with_context(|| format!("读取对局记录失败: {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("解析对局记录失败: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::with_dir(dir.path().to_path_buf()).unwrap();

        let mut transcript = GameTranscript::new(Color::White);
        transcript.opponent = Some("bob".to_string());
        transcript.game_number = Some(21);
        transcript.push_move(Color::White, "b2-b3", Some(298_000));
        transcript.push_move(Color::Black, "b5-b4", None);
        transcript.finish(GameOutcome::Win);

        let filename = store.save(&transcript).unwrap();
        assert!(filename.ends_with("_bob.json"));

        let loaded = store.load(&filename).unwrap();
        assert_eq!(loaded.moves.len(), 2);
        assert_eq!(loaded.outcome, Some(GameOutcome::Win));
        assert_eq!(store.list().unwrap(), vec![filename]);
    }
}
