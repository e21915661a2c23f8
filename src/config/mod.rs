// Configuration management module
// Handles the TOML config file, environment credentials and the `config` command

pub mod settings;

#[cfg(test)]
mod tests;

use anyhow::Result;
use console::style;

pub use settings::{
    API_KEY_VAR, ChatConfig, CompletionConfig, Config, ConfigError, Credentials,
    DocumentsConfig, OllamaConfig, RetrievalConfig, ServerConfig,
};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}

/// Print the effective configuration
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Documents:").bold().yellow());
    eprintln!(
        "  Folder: {}",
        style(config.documents.folder.display()).cyan()
    );
    eprintln!(
        "  Chunk size: {} words, overlap {} words",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.overlap).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embeddings (Ollama):").bold().yellow());
    match config.ollama_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!(
        "  Collection: {}",
        style(&config.retrieval.collection).cyan()
    );
    eprintln!(
        "  Results per question: {}",
        style(config.retrieval.n_results).cyan()
    );
    eprintln!(
        "  Context chunks: {} (max {} chars each)",
        style(config.retrieval.context_chunks).cyan(),
        style(config.retrieval.max_chunk_chars).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Completion:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.completion.base_url).cyan());
    eprintln!("  Model: {}", style(&config.completion.model).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.completion.timeout_secs).cyan()
    );
    let key_status = if Credentials::from_env().is_ok() {
        style("set").green()
    } else {
        style("missing").red()
    };
    eprintln!("  {}: {}", API_KEY_VAR, key_status);

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}
