use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{API_KEY_VAR, Config, Credentials, show_config};
use crate::database::VectorStore;
use crate::embeddings::OllamaClient;
use crate::qa::ProjectCatalog;
use crate::server;
use crate::service::{QaService, WarmupStatus};

fn load_credentials() -> Result<Credentials> {
    Credentials::from_env().with_context(|| {
        format!(
            "Set {} in the environment or in a .env file before starting",
            API_KEY_VAR
        )
    })
}

async fn build_service(config: &Config) -> Result<QaService> {
    let credentials = load_credentials()?;
    QaService::new(config, &credentials)
        .await
        .context("Failed to initialize components")
}

/// Start the HTTP server
#[inline]
pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;

    let credentials = load_credentials()?;
    info!(
        "Starting HTTP server on {}:{}",
        config.server.host, config.server.port
    );
    server::serve(config, credentials).await
}

/// Clear the collection and ingest the documents folder again
#[inline]
pub async fn update(config: &Config) -> Result<()> {
    let service = build_service(config).await?;

    let spinner = if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    };
    spinner.set_message(format!(
        "Processing {}",
        config.documents.folder.display()
    ));

    let outcome = service.update().await;
    spinner.finish_and_clear();
    let outcome = outcome.context("Document update failed")?;

    let summary = outcome.summary;
    eprintln!(
        "{} Updated with {} document chunks.",
        style("✅").green(),
        summary.chunks
    );
    eprintln!(
        "   Files: {} indexed, {} skipped, {} failed",
        summary.files_indexed, summary.files_skipped, summary.files_failed
    );
    eprintln!(
        "   Took {:.2} seconds",
        outcome.elapsed.as_secs_f64()
    );
    Ok(())
}

fn prompt_question() -> Result<String> {
    Input::<String>::new()
        .with_prompt("Enter your question (or 'quit' to exit, 'update' to reprocess documents)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read question")
}

/// Interactive question loop on the terminal
#[inline]
pub async fn chat(config: &Config) -> Result<()> {
    let service = build_service(config).await?;

    let catalog = config
        .chat
        .projects_file
        .as_deref()
        .map(ProjectCatalog::load)
        .unwrap_or_default();

    match service.warmup().await? {
        WarmupStatus::NoDocuments => {
            println!("No documents found in the Documents folder.");
            return Ok(());
        }
        WarmupStatus::Complete { chunks } => {
            println!("Processed {} document chunks.", chunks);
        }
        WarmupStatus::AlreadyReady { .. } => {
            println!("Vector store already contains data. Skipping document processing.");
        }
    }

    loop {
        let question = tokio::task::spawn_blocking(prompt_question)
            .await
            .context("Prompt task failed")??;
        let question = question.trim();

        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.eq_ignore_ascii_case("update") {
            println!("Reprocessing and updating documents...");
            match service.update().await {
                Ok(outcome) => println!("Updated with {} document chunks.", outcome.summary.chunks),
                Err(e) => {
                    warn!("Update failed: {}", e);
                    println!("{} {}", style("Update failed:").red(), e);
                }
            }
            continue;
        }

        let (_, mut context) = service
            .retrieve_context(question, config.chat.n_results)
            .await;
        println!();
        println!("{}", style("--- Retrieved Context ---").dim());
        println!("{}", context);
        println!("{}", style("--- End of Context ---").dim());
        println!();

        if ProjectCatalog::is_relevant(question) {
            context = catalog.append_to_context(&context);
        }

        let answer = service.answer(question, &context).await;
        println!("{} {}", style("Answer:").bold().green(), answer);
    }

    Ok(())
}

/// Report configuration and backend health
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 Docs-QA Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📁 Documents:");
    let folder = &config.documents.folder;
    if folder.is_dir() {
        println!("   ✅ Folder: {}", folder.display());
    } else {
        println!("   ❌ Folder missing: {}", folder.display());
    }

    println!("🔑 Completion API:");
    match Credentials::from_env() {
        Ok(_) => println!("   ✅ {} is set ({})", API_KEY_VAR, config.completion.model),
        Err(_) => println!("   ❌ {} is not set", API_KEY_VAR),
    }

    println!("🤖 Ollama Status:");
    match OllamaClient::new(config) {
        Ok(client) => {
            let health = tokio::task::spawn_blocking(move || client.health_check())
                .await
                .context("Health check task failed")?;
            match health {
                Ok(()) => {
                    println!(
                        "   ✅ Ollama: Connected ({}:{})",
                        config.ollama.host, config.ollama.port
                    );
                    println!("   📋 Model: {}", config.ollama.model);
                    println!("   🔢 Batch Size: {}", config.ollama.batch_size);
                }
                Err(e) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
            }
        }
        Err(e) => println!("   ❌ Ollama: Invalid configuration - {:#}", e),
    }

    println!("🔍 Vector Database Status:");
    match VectorStore::new(config).await {
        Ok(store) => match store.count_embeddings().await {
            Ok(count) => {
                println!("   ✅ LanceDB: Connected ({})", store.table_name());
                println!("   📄 Chunks Indexed: {}", count);
            }
            Err(e) => println!("   ⚠️  LanceDB: Failed to count chunks - {}", e),
        },
        Err(e) => println!("   ❌ LanceDB: Failed to open - {}", e),
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'docs-qa update' to index the documents folder");
    println!("   • Use 'docs-qa chat' to ask questions in the terminal");
    println!("   • Use 'docs-qa serve' to start the HTTP API");

    Ok(())
}

/// Show the configuration, writing a default file first with `init`
#[inline]
pub fn configure(config_dir: &Path, init: bool) -> Result<()> {
    if init {
        let config = Config {
            base_dir: config_dir.to_path_buf(),
            ..Config::default()
        };
        let path = config.config_file_path();
        if path.exists() {
            eprintln!(
                "{} Config file already exists at {}",
                style("⚠️").yellow(),
                path.display()
            );
        } else {
            config.save()?;
            eprintln!(
                "{} Wrote default config to {}",
                style("✅").green(),
                path.display()
            );
        }
        eprintln!();
    }

    let config = Config::load(config_dir)?;
    show_config(&config)
}
