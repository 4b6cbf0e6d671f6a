use clap::{Parser, Subcommand};
use native_partitioning::config::{default_config_path, DescriptorConfig};
use native_partitioning::{validate, HandoffStore};
use std::path::PathBuf;
use tracing::info;

/// 分区描述符交接工具：TOML → 交接文件，以及反向检查
#[derive(Parser, Debug)]
#[command(name = "npart", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 从 TOML 配置生成交接文件
    Encode {
        /// 默认 $XDG_CONFIG_HOME/native-partitioning/descriptor.toml
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        /// 写入前先做校验
        #[arg(long)]
        strict: bool,
    },
    /// 解码交接文件并输出 JSON
    Decode { path: PathBuf },
    /// 解码并校验交接文件
    Check { path: PathBuf },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Encode {
            config,
            out,
            strict,
        } => {
            let config = config.unwrap_or_else(default_config_path);
            let desc = DescriptorConfig::load(&config).await?.into_descriptor();
            if strict {
                validate(&desc)?;
            }
            let store = HandoffStore::new(out);
            store.write_atomic(&desc).await?;
            info!(
                "Wrote {} partitioning ({} partitions) to {:?}",
                desc.kind(),
                desc.partition_count(),
                store.path()
            );
        }
        Command::Decode { path } => {
            let desc = HandoffStore::new(path).load().await?;
            println!("{}", serde_json::to_string_pretty(&desc)?);
        }
        Command::Check { path } => {
            let desc = HandoffStore::new(path).load().await?;
            let kind = validate(&desc)?;
            println!("ok: {} x{}", kind, desc.partition_count());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    run(Cli::parse()).await
}
