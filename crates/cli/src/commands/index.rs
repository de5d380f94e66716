//! `brewline index`: Build the knowledge store from `.txt` documents.

use brewline_config::AppConfig;
use brewline_core::knowledge::VectorStore;
use brewline_memory::{FileVectorStore, Indexer};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(dirs: Vec<PathBuf>, rebuild: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let dirs = resolve_dirs(dirs, &config);

    let embedder = brewline_providers::build_embedding_provider(&config)?;
    let store = Arc::new(FileVectorStore::open(
        config.knowledge.store_path.clone(),
        embedder,
        config.knowledge.embedding_model.clone(),
    ));

    println!("📚 Indexing knowledge");
    for dir in &dirs {
        println!("   Source:  {}", dir.display());
    }
    println!("   Store:   {}", config.knowledge.store_path.display());
    println!("   Mode:    {}", if rebuild { "rebuild" } else { "append" });

    let report = Indexer::new(store.clone())
        .index_directories(&dirs, rebuild)
        .await?;

    println!();
    println!("   ✅ Indexed {} file(s)", report.files_indexed);
    if report.skipped > 0 {
        println!("   ⚠️  Skipped {} empty or unreadable file(s)", report.skipped);
    }
    println!("   Passages in store: {}", store.count().await?);

    Ok(())
}

/// Explicit directories win; otherwise the configured customer and business dirs.
fn resolve_dirs(dirs: Vec<PathBuf>, config: &AppConfig) -> Vec<PathBuf> {
    if !dirs.is_empty() {
        return dirs;
    }
    vec![
        config.knowledge.customer_data_dir.clone(),
        config.knowledge.business_data_dir.clone(),
    ]
}
