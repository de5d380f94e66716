//! `brewline chat`: Interactive or single-message chat mode.

use brewline_config::AppConfig;
use brewline_core::error::TurnError;
use brewline_gateway::CustomerRegistry;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(user: String, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup instructions when no key is configured
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    BREWLINE_API_KEY=...   (generic)");
        eprintln!("    GROQ_API_KEY=gsk_...   (Groq)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let orchestrator = brewline_agent::build_orchestrator(&config)?;
    let registry = CustomerRegistry::with_demo_users();
    let customer = registry.get_or_create(user.trim()).await;
    let session = config.memory.default_session.as_str();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = orchestrator
            .handle_turn(&customer.customer_id, session, &msg)
            .await;
        eprint!("\r              \r");
        println!("{}", result?.reply_text);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Brewline — Interactive Chat           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", orchestrator.model());
    println!("  Customer:  {} ({})", customer.name, customer.customer_id);
    println!("  Knowledge: {}", on_off(orchestrator.retriever().is_enabled()));
    println!("  PII mask:  {}", on_off(orchestrator.privacy().is_enabled()));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/clear' to reset the conversation, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "exit" | "quit" => break,
            "/clear" => {
                let key = brewline_core::message::SessionKey::new(
                    customer.customer_id.clone(),
                    session,
                );
                orchestrator.sessions().clear(&key);
                println!("  (conversation cleared)");
                println!();
            }
            _ => {
                eprint!("  ...");
                match orchestrator
                    .handle_turn(&customer.customer_id, session, input)
                    .await
                {
                    Ok(result) => {
                        eprint!("\r     \r");
                        println!();
                        for line in result.reply_text.lines() {
                            println!("  Eva > {line}");
                        }
                        if result.pii_masked {
                            println!("  (personal details in your message were masked)");
                        }
                        println!();
                    }
                    Err(TurnError::Validation(reason)) => {
                        eprint!("\r     \r");
                        eprintln!("  [Invalid] {reason}");
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! ☕");
    println!();

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}
