use anyhow::Result;
use clap::Parser;
use exam_proctor::app::{App, Command};
use exam_proctor::config::Config;
use exam_proctor::utils::logging;

#[derive(Parser)]
#[command(name = "exam-proctor")]
#[command(about = "口试安排与监考控制台")]
struct Cli {
    /// 后端地址（覆盖 EXAM_API_URL）
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env().with_api_base_url(cli.api_url);

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run(cli.command).await?;

    Ok(())
}
