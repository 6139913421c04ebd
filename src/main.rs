//! 命令行入口
//!
//! 从文件或标准输入读取文章 HTML，经缓存旁路服务翻译后输出。

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use article_translator::env::{self, EnvVar};
use article_translator::translation::{
    create_service, BackendKind, ConfigManager, TranslationError, TranslationRequest,
    TranslationResult,
};

/// 命令行可选的翻译后端
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBackend {
    Openai,
    Deepl,
    Google,
    Mock,
}

impl From<CliBackend> for BackendKind {
    fn from(backend: CliBackend) -> Self {
        match backend {
            CliBackend::Openai => BackendKind::OpenAi,
            CliBackend::Deepl => BackendKind::DeepL,
            CliBackend::Google => BackendKind::Google,
            CliBackend::Mock => BackendKind::Mock,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "article-translator")]
#[command(version)]
#[command(about = "Translate article HTML while preserving markup, with cached results")]
#[command(long_about = "Translates article HTML into a target language through a pluggable backend.

Results are stored per (article, source language, target language, backend, content version),
so repeating a request never calls the paid backend twice.

EXAMPLES:
    article-translator translate --article-id 42 --target fr --content-version 2024-05-01 -i post.html
    cat post.html | article-translator translate --article-id 42 --target de --content-version v3 --json
    article-translator status --article-id 42 --target fr --content-version 2024-05-01
    article-translator generate-config --path article-translator.toml")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (searched in default locations when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an article
    Translate {
        #[command(flatten)]
        article: ArticleArgs,

        /// Input HTML file (reads stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write translated HTML to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,

        /// Override the configured backend
        #[arg(short, long, value_enum)]
        backend: Option<CliBackend>,
    },

    /// Show whether a translation is already stored
    Status {
        #[command(flatten)]
        article: ArticleArgs,

        /// Override the configured backend
        #[arg(short, long, value_enum)]
        backend: Option<CliBackend>,
    },

    /// Write an example configuration file
    GenerateConfig {
        #[arg(short, long, default_value = "article-translator.toml")]
        path: String,
    },

    /// Print the supported environment variables
    EnvDocs,
}

#[derive(clap::Args, Debug)]
struct ArticleArgs {
    /// Article identifier
    #[arg(long)]
    article_id: String,

    /// Target language code (e.g. 'fr', 'de')
    #[arg(short, long)]
    target: String,

    /// Source language code (defaults to the configured one)
    #[arg(short, long)]
    source: Option<String>,

    /// Content version, usually the article's last-modified timestamp
    #[arg(long)]
    content_version: String,
}

impl ArticleArgs {
    fn into_request(self, default_source: &str, html: String) -> TranslationRequest {
        let source = self.source.unwrap_or_else(|| default_source.to_string());
        TranslationRequest::new(self.article_id, source, self.target, html, self.content_version)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        env::core::LogLevel::get().unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("article_translator={}", level)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&str>, backend: Option<CliBackend>) -> TranslationResult<ConfigManager> {
    ConfigManager::load_with(path, |config| {
        if let Some(backend) = backend {
            config.backend = backend.into();
        }
    })
}

fn read_input(input: Option<&PathBuf>) -> TranslationResult<String> {
    let mut html = String::new();
    match input {
        Some(path) => {
            html = std::fs::read_to_string(path).map_err(|e| {
                TranslationError::InvalidInput(format!("无法读取输入文件 {}: {}", path.display(), e))
            })?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut html)
                .map_err(|e| TranslationError::InvalidInput(format!("无法读取标准输入: {}", e)))?;
        }
    }
    Ok(html)
}

fn write_output(output: Option<&PathBuf>, content: &str) -> TranslationResult<()> {
    let result = match output {
        Some(path) => std::fs::write(path, content),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
        }
    };
    result.map_err(|e| TranslationError::InternalError(format!("写入输出失败: {}", e)))
}

async fn run(cli: Cli) -> TranslationResult<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Translate {
            article,
            input,
            output,
            json,
            backend,
        } => {
            let manager = load_config(config_path, backend)?;
            let config = manager.get_config();
            let service = create_service(config)?;

            let html = read_input(input.as_ref())?;
            let request = article.into_request(&config.source_lang, html);
            let outcome = service.translate(request).await?;

            tracing::info!(
                "翻译完成: 来源 {}，记录 {}",
                outcome.source,
                outcome
                    .translation_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );

            if json {
                write_output(output.as_ref(), &serde_json::to_string_pretty(&outcome)?)
            } else {
                write_output(output.as_ref(), &outcome.translated_html)
            }
        }
        Commands::Status { article, backend } => {
            let manager = load_config(config_path, backend)?;
            let config = manager.get_config();
            let service = create_service(config)?;

            let request = article.into_request(&config.source_lang, String::new());
            let key = service.cache_key(&request);
            match service.status(&request).await? {
                Some(stored) => {
                    println!(
                        "stored: {} (record {}, {} chars, {})",
                        key,
                        stored.id,
                        stored.record.character_count,
                        stored.record.created_at.to_rfc3339()
                    );
                }
                None => println!("missing: {}", key),
            }
            Ok(())
        }
        Commands::GenerateConfig { path } => {
            ConfigManager::generate_example_config(&path)?;
            println!("已生成示例配置: {}", path);
            Ok(())
        }
        Commands::EnvDocs => {
            print!("{}", env::generate_env_docs());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
