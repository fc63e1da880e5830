use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bookshelf::site::config::DEFAULT_CONFIG_PATH;
use bookshelf::slim::{self, SlimOptions};
use bookshelf::{convert_library, BatchEvent, NamingStrategy, PageMode, Result, SiteConfig, SiteEmitter};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// 📚 Bookshelf - EPUB书架站点生成工具
#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "把EPUB电子书转换为静态网站书架，并提供EPUB瘦身")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// 详细输出模式
    #[arg(short, long, global = true, help = "输出调试日志")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// 转换目录中的全部EPUB并生成书架
    Convert {
        #[arg(help = "存放EPUB文件的目录")]
        input_dir: PathBuf,

        #[arg(help = "站点输出目录")]
        output_dir: PathBuf,

        #[arg(long, help = "配置文件路径（默认读取当前目录下的 bookshelf.yaml）")]
        config: Option<PathBuf>,

        #[arg(long, value_enum, help = "章节文件命名方式")]
        naming: Option<NamingStrategy>,

        #[arg(long, value_enum, help = "章节页面生成方式")]
        mode: Option<PageMode>,

        #[arg(long, help = "自定义模板目录")]
        templates: Option<PathBuf>,

        #[arg(long, help = "忽略已是最新的判断，重新转换全部书籍")]
        force: bool,
    },

    /// 删除EPUB中的图片、字体等资源
    Slim {
        #[arg(help = "EPUB文件或目录")]
        input: PathBuf,

        #[arg(help = "输出文件或目录，省略时原地替换")]
        output: Option<PathBuf>,
    },

    /// 生成默认配置文件
    InitConfig {
        #[arg(help = "配置文件路径")]
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Command::Convert {
            input_dir,
            output_dir,
            config,
            naming,
            mode,
            templates,
            force,
        } => {
            if !input_dir.is_dir() {
                eprintln!("❌ 输入目录不存在: {}", input_dir.display());
                return ExitCode::FAILURE;
            }
            load_config(config.as_deref()).and_then(|mut config| {
                if let Some(naming) = naming {
                    config.naming = naming;
                }
                if let Some(mode) = mode {
                    config.page_mode = mode;
                }
                if templates.is_some() {
                    config.template_root = templates;
                }
                run_convert(&input_dir, &output_dir, config, force)
            })
        }
        Command::Slim { input, output } => run_slim(&input, output.as_deref()),
        Command::InitConfig { path } => SiteConfig::generate_default_config(path.as_deref()).map(|path| {
            println!("📝 已生成配置文件: {}", path.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 默认 `warn`，`-v` 提升到 `debug`，`RUST_LOG` 优先
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// 显式指定的配置文件必须存在，默认配置文件不存在时使用内置默认值
fn load_config(path: Option<&Path>) -> Result<SiteConfig> {
    match path {
        Some(path) => SiteConfig::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => SiteConfig::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(SiteConfig::default()),
    }
}

fn run_convert(input_dir: &Path, output_dir: &Path, config: SiteConfig, force: bool) -> Result<()> {
    println!("📚 Bookshelf - 正在扫描: {}", input_dir.display());
    let emitter = SiteEmitter::new(config)?;

    let report = convert_library(input_dir, output_dir, &emitter, force, |event| match event {
        BatchEvent::Processing { index, total, name } => println!("[{}/{}] 📖 正在处理: {}", index, total, name),
        BatchEvent::Skipped { index, total, name } => println!("[{}/{}] ⏭️  已是最新，跳过: {}", index, total, name),
        BatchEvent::Converted { title, .. } => println!("  ✅ 《{}》转换完成", title),
        BatchEvent::Failed { name, error, .. } => println!("  ❌ {} 转换失败: {}", name, error),
    })?;

    if report.discovered == 0 {
        println!("⚠️  没有找到EPUB文件: {}", input_dir.display());
        return Ok(());
    }

    println!(
        "\n📊 共 {} 本：转换 {} 本，跳过 {} 本，失败 {} 本",
        report.discovered,
        report.converted,
        report.skipped,
        report.failed.len()
    );
    for (path, error) in &report.failed {
        println!("  ❌ {}: {}", path.display(), error);
    }
    if let Some(shelf) = &report.shelf {
        println!("🎉 书架已生成: {}", shelf.display());
    }
    Ok(())
}

fn run_slim(input: &Path, output: Option<&Path>) -> Result<()> {
    let jobs = slim::plan(input, output)?;
    if jobs.is_empty() {
        println!("⚠️  没有找到EPUB文件: {}", input.display());
        return Ok(());
    }

    let options = SlimOptions::default();
    let total = jobs.len();
    let mut failed = 0;
    for (position, job) in jobs.iter().enumerate() {
        println!("[{}/{}] 🗜️  正在瘦身: {}", position + 1, total, job.input.display());
        match slim::slim_file(job, &options) {
            Ok(outcome) => println!(
                "  ✅ {:.1} KB -> {:.1} KB  {}",
                outcome.before as f64 / 1024.0,
                outcome.after as f64 / 1024.0,
                job.output.display()
            ),
            Err(e) => {
                failed += 1;
                println!("  ❌ 瘦身失败: {}", e);
            }
        }
    }

    println!("\n📊 完成 {} 个，失败 {} 个", total - failed, failed);
    Ok(())
}
