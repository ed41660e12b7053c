use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minichess_client::{
    GameOrchestrator, OpponentPolicy, PlayerKind, Settings, TcpEngine, TranscriptStore,
};
use protocol::{Credentials, ImcsClient};

/// IMCS 五六棋客户端
#[derive(Parser, Debug)]
#[command(name = "minichess-client", about = "IMCS 五六棋客户端")]
struct Args {
    /// 引擎玩家类型
    #[arg(short, long, value_enum, default_value_t = PlayerKind::Random)]
    player: PlayerKind,

    /// 交互式选择对局（默认自动匹配）
    #[arg(short, long)]
    interactive: bool,

    /// 覆盖设置中的服务器地址 (host:port)
    #[arg(long)]
    server: Option<String>,

    /// 调试日志
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("minichess_client={}", level).parse()?)
                .add_directive(format!("protocol={}", level).parse()?),
        )
        .init();

    info!("五六棋客户端启动中...");

    let settings = Settings::load().context("加载设置失败")?;
    if settings.username.is_empty() {
        // 首次运行时落一份默认设置文件，便于用户填写
        let path = Settings::config_path()?;
        if !path.exists() {
            settings.save().context("写入默认设置失败")?;
        }
        anyhow::bail!("设置中缺少用户名，请编辑 {:?}", path);
    }

    // 先等引擎接入，再连服务器
    let engine = TcpEngine::accept(&settings.engine_addr, args.player)
        .await
        .context("引擎接入失败")?;

    let addr = args.server.unwrap_or_else(|| settings.server_addr());
    let credentials = Credentials {
        username: settings.username.clone(),
        password: settings.password.clone(),
    };
    let client = ImcsClient::connect(&addr, credentials)
        .await
        .context("连接 IMCS 服务器失败")?;

    let store = match TranscriptStore::new() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "对局记录存储不可用");
            None
        }
    };

    let policy = if args.interactive {
        OpponentPolicy::Interactive
    } else {
        OpponentPolicy::Auto
    };

    let mut orchestrator = GameOrchestrator::new(client, engine, store);
    let result = orchestrator.run(policy).await;
    orchestrator.shutdown().await;

    let outcome = result?;
    info!(?outcome, "会话结束");
    Ok(())
}
