use anyhow::Context;
use pokedex_core::actors::supervisor::SupervisorHandle;
use pokedex_core::config::EngineConfig;
use pokedex_core::models::ConversationTurn;
use pokedex_core::telemetry::{self, LogFormat};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

const EXIT_COMMANDS: &[&str] = &["/sair", "/exit", "/quit"];
const CLEAR_COMMAND: &str = "/limpar";

/// Drops the oldest turns beyond `limit`.
fn trim_history(history: &mut Vec<ConversationTurn>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; every setting has a default.
    dotenv::dotenv().ok();
    telemetry::init("pokedex", LogFormat::from_env());

    let config = EngineConfig::from_env().context("Invalid configuration")?;
    info!(
        "Starting Pokédex (data: {}, model: {} at {})",
        config.pokeapi_base_url, config.llm_model, config.llm_base_url
    );

    let supervisor = SupervisorHandle::from_config(&config).context("Failed to start actors")?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ConversationTurn> = Vec::new();

    stdout
        .write_all("Pokédex pronta! Pergunte sobre um Pokémon, compare dois ou peça uma equipe. /sair para encerrar.\n> ".as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }
        if EXIT_COMMANDS.contains(&line) {
            break;
        }
        if line == CLEAR_COMMAND {
            history.clear();
            stdout.write_all("Histórico limpo.\n> ".as_bytes()).await?;
            stdout.flush().await?;
            continue;
        }

        match supervisor.process_message(line.to_string(), history.clone()).await {
            Ok(reply) => {
                let mut out = format!("\n{}\n", reply.message);
                if !reply.suggestions.is_empty() {
                    out.push_str("\nSugestões:\n");
                    for suggestion in &reply.suggestions {
                        out.push_str(&format!("  - {}\n", suggestion));
                    }
                }
                stdout.write_all(out.as_bytes()).await?;

                history.push(ConversationTurn::user(line));
                history.push(ConversationTurn::assistant(reply.message));
                trim_history(&mut history, config.history_limit);
            }
            Err(e) => {
                error!("Failed to process message: {}", e);
                stdout
                    .write_all("Desculpe, algo deu errado. Tente novamente!\n".as_bytes())
                    .await?;
            }
        }

        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
    }

    supervisor.shutdown().await.ok();
    info!("Goodbye");
    Ok(())
}
