//! 对局编排
//!
//! 把协议客户端、位板编码与引擎通道串成一局棋：客户端产出棋盘
//! 快照 → 编码为位板行 → 引擎回一个着法 → 发给服务端 → 取得下一个
//! 快照或终局信号。纯顺序胶水，自身不含棋类逻辑。

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use tracing::{info, warn};

use protocol::{
    Bitboard, ColorChoice, GameOffer, GameOutcome, GameStart, ImcsClient, LineConnection,
    MoveReply, ProtocolError,
};

use crate::engine::{EngineChannel, EngineReply};
use crate::storage::{GameTranscript, TranscriptStore};

/// 对手选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentPolicy {
    /// 列出邀约让用户挑选；没有邀约时自己挂出一条
    Interactive,
    /// 随机接受一条邀约；没有邀约时自己挂出一条
    Auto,
}

/// 对局编排器
pub struct GameOrchestrator<C: LineConnection, E: EngineChannel> {
    client: ImcsClient<C>,
    engine: E,
    store: Option<TranscriptStore>,
}

impl<C: LineConnection, E: EngineChannel> GameOrchestrator<C, E> {
    pub fn new(client: ImcsClient<C>, engine: E, store: Option<TranscriptStore>) -> Self {
        Self {
            client,
            engine,
            store,
        }
    }

    /// 按策略找到一局并下完它
    pub async fn run(&mut self, policy: OpponentPolicy) -> Result<GameOutcome> {
        let (start, opponent) = self.find_game(policy).await?;
        self.play(start, opponent).await
    }

    /// 结束会话：通知引擎退出并向服务端告别，尽力而为
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.engine.shutdown().await {
            warn!(error = %e, "engine shutdown failed");
        }
        if let Err(e) = self.client.disconnect().await {
            warn!(error = %e, "disconnect failed");
        }
    }

    /// 选择对局：返回开局信息与（已知时的）对手名
    async fn find_game(
        &mut self,
        policy: OpponentPolicy,
    ) -> Result<(GameStart, Option<String>)> {
        let offers = self.client.list_games().await?;
        // 原始行与解析结果成对保留，菜单展示用原始行
        let parsed: Vec<(String, GameOffer)> = offers
            .iter()
            .filter_map(|l| GameOffer::parse(l).map(|o| (l.clone(), o)))
            .collect();

        let chosen = match policy {
            OpponentPolicy::Auto => parsed
                .choose(&mut rand::thread_rng())
                .map(|(_, offer)| offer.clone()),
            OpponentPolicy::Interactive => choose_interactively(&parsed),
        };

        match chosen {
            Some(offer) => {
                info!(id = offer.id, opponent = %offer.opponent, "accepting offer");
                let start = self.client.accept_game(offer.id, None).await?;
                Ok((start, Some(offer.opponent)))
            }
            None => {
                info!("no offers available, offering a game");
                let start = self.client.offer_game(ColorChoice::Any, None).await?;
                Ok((start, None))
            }
        }
    }

    /// 下完一局并保存记录
    async fn play(&mut self, start: GameStart, opponent: Option<String>) -> Result<GameOutcome> {
        let mut transcript = GameTranscript::new(start.color);
        transcript.opponent = opponent;
        transcript.game_number = self.client.game_number();
        if let Some(mv) = &start.opponent_move {
            transcript.push_move(start.color.opponent(), mv.clone(), None);
        }

        let mut snapshot = start.snapshot;
        let outcome = loop {
            let values = Bitboard::encode(&snapshot).context("encoding board for engine")?;
            let encoded = Bitboard::to_wire_line(&values);

            let movetext = match self.engine.best_move(&encoded).await? {
                EngineReply::Move(mv) => mv,
                EngineReply::Terminated => {
                    // 引擎放弃：认输结束本局
                    warn!("engine terminated, resigning");
                    self.client.resign().await?;
                    break GameOutcome::Loss;
                }
            };

            match self.client.send_move(&movetext).await {
                Ok(MoveReply::Continue {
                    opponent_move,
                    snapshot: next,
                }) => {
                    // 交换完成后快照里的时钟是本方的剩余时间
                    transcript.push_move(start.color, movetext, Some(next.time_left_millis()));
                    transcript.push_move(start.color.opponent(), opponent_move, None);
                    snapshot = next;
                }
                Ok(MoveReply::GameOver(outcome)) => {
                    transcript.push_move(start.color, movetext, None);
                    break outcome;
                }
                Err(ProtocolError::InvalidMove { mv, line }) => {
                    // 引擎对同一局面只会给出同一着法，重试没有意义
                    warn!(%mv, %line, "engine produced an illegal move, resigning");
                    self.client.resign().await?;
                    break GameOutcome::Loss;
                }
                Err(e) => return Err(e).context("move exchange failed"),
            }
        };

        transcript.finish(outcome);
        if let Some(store) = &self.store {
            match store.save(&transcript) {
                Ok(filename) => info!(%filename, "transcript saved"),
                Err(e) => warn!(error = %e, "failed to save transcript"),
            }
        }
        info!(?outcome, "game finished");
        Ok(outcome)
    }
}

/// 交互式菜单：把原始邀约行原样列出，读取用户选择
fn choose_interactively(offers: &[(String, GameOffer)]) -> Option<GameOffer> {
    use std::io::{self, BufRead, Write};

    if offers.is_empty() {
        println!("当前没有可接受的邀约。");
        return None;
    }

    println!("\n可接受的对局邀约:");
    for (i, (line, _)) in offers.iter().enumerate() {
        println!(" {}. {}", i + 1, line.trim());
    }
    print!("选择一局 (回车跳过): ");
    let _ = io::stdout().flush();

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return None;
    }
    let choice: usize = input.trim().parse().ok()?;
    if choice >= 1 && choice <= offers.len() {
        Some(offers[choice - 1].1.clone())
    } else {
        println!("输入无效，改为自己挂出邀约。");
        None
    }
}
