use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nidina_cli::commands::{self, Cli};

const DEFAULT_LOG_FILTER: &str = "nidina_cli=info,nidina_core=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    // (A) .env を読み込んでから引数を解釈する（clap の env 既定値のため）
    dotenvy::dotenv().ok();

    // (B) ログは stderr へ。stdout はコマンドの出力用
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // (C) 失敗は stderr に出して非ゼロで終了
    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "command failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
