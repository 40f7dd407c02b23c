//! Command-line front end
//!
//! Run with: cargo run -p grounded-rag --bin grounded-rag -- ask "What is X?"

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grounded_rag::{
    config::RagConfig,
    index::{FlatIndex, IndexHandle},
    ingestion,
    pipeline::{AskParams, QaPipeline},
    providers,
    session::{greeting_reply, is_greeting, ChatSession},
    types::RagResult,
};

#[derive(Parser, Debug)]
#[command(
    name = "grounded-rag",
    version,
    about = "Answer questions strictly from a folder of PDFs"
)]
struct Cli {
    /// TOML config file (defaults to $GROUNDED_RAG_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, chunk and embed the PDF folder, then persist the index.
    Ingest {
        /// PDF folder (overrides ingestion.pdf_dir)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
    },

    /// Ask a single question.
    Ask {
        question: String,
        /// Only search this document (file name)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Interactive conversation with follow-up rewriting.
    Chat {
        /// Only search this document (file name)
        #[arg(short, long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RagConfig::load(path)?,
        None => RagConfig::from_env_or_default()?,
    };

    match cli.command {
        Command::Ingest { pdf_dir } => ingest(config, pdf_dir).await,
        Command::Ask { question, source } => ask(config, &question, source.as_deref()).await,
        Command::Chat { source } => chat(config, source).await,
    }
}

async fn ingest(mut config: RagConfig, pdf_dir: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(dir) = pdf_dir {
        config.ingestion.pdf_dir = dir;
    }

    let chunks = ingestion::load_corpus(&config)?;
    let total = chunks.len();
    println!(
        "Chunked {} into {} chunks",
        config.ingestion.pdf_dir.display(),
        total
    );

    let (embedder, _) = providers::from_config(&config.llm)?;
    let handle = IndexHandle::new(config.index.dir.clone(), embedder);

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} embedding [{bar:40}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );

    let manifest = handle
        .rebuild(chunks, config.embeddings.batch_size, |done| {
            progress.set_position(done as u64)
        })
        .await?;
    progress.finish_and_clear();

    println!(
        "Index written to {} ({} chunks, {} sources, {} dims, {})",
        config.index.dir.display(),
        manifest.chunk_count,
        manifest.source_count,
        manifest.dimensions,
        manifest.embed_model
    );
    Ok(())
}

/// Loaded index plus the pipeline that answers from it
struct Assistant {
    config: RagConfig,
    index: Arc<FlatIndex>,
    pipeline: QaPipeline,
}

impl Assistant {
    fn open(config: RagConfig) -> anyhow::Result<Self> {
        let (embedder, chat) = providers::from_config(&config.llm)?;
        let handle = IndexHandle::new(config.index.dir.clone(), embedder);
        if !handle.load_if_present()? {
            bail!("Knowledge base is not ready. Run `grounded-rag ingest` first.");
        }
        let index = handle.acquire()?;
        let pipeline = QaPipeline::from_config(&config, chat);
        Ok(Self {
            config,
            index,
            pipeline,
        })
    }

    async fn answer(
        &self,
        question: &str,
        source: Option<&str>,
        memory_text: Option<&str>,
    ) -> anyhow::Result<RagResult> {
        let params = AskParams::from_config(&self.config.retrieval)
            .with_source(source)
            .with_memory(memory_text);
        let result = self
            .pipeline
            .answer_question(&*self.index, question, &params)
            .await
            .context("Could not search the documents")?;
        Ok(result)
    }
}

fn print_result(result: &RagResult) {
    println!("{}", result.answer);
    if !result.is_no_answer() && !result.citations.is_empty() {
        println!("\nSources:");
        for citation in &result.citations {
            println!("  - {}", citation);
        }
    }
}

async fn ask(config: RagConfig, question: &str, source: Option<&str>) -> anyhow::Result<()> {
    if is_greeting(question) {
        println!("{}", greeting_reply());
        return Ok(());
    }
    let assistant = Assistant::open(config)?;
    let result = assistant.answer(question, source, None).await?;
    print_result(&result);
    Ok(())
}

async fn chat(config: RagConfig, source: Option<String>) -> anyhow::Result<()> {
    let max_turns = config.memory.max_turns;
    let assistant = Assistant::open(config)?;
    let mut session = ChatSession::new(max_turns).with_source(source);

    println!("Ask about your documents. Commands: /new, /source [FILE], /exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/exit" | "/quit" => break,
            "/new" => {
                session.memory.clear();
                println!("Started a new conversation.");
                continue;
            }
            _ => {}
        }
        if let Some(rest) = input.strip_prefix("/source") {
            let rest = rest.trim();
            session.source_filter = (!rest.is_empty()).then(|| rest.to_string());
            match &session.source_filter {
                Some(source) => println!("Searching only {}", source),
                None => println!("Searching all documents"),
            }
            continue;
        }

        if is_greeting(input) {
            println!("{}\n", greeting_reply());
            continue;
        }

        let memory_text = session.memory_text();
        match assistant
            .answer(input, session.source_filter.as_deref(), memory_text.as_deref())
            .await
        {
            Ok(result) => {
                print_result(&result);
                session.record(input, &result);
            }
            Err(e) => eprintln!("Error: {:#}", e),
        }
        println!();
    }
    Ok(())
}
