use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use atende_core::config::{AppConfig, LoadOptions};
use atende_core::ConversationTurn;
use atende_db::{connect, migrations, ConversationStore, SqliteConversationStore};

use crate::commands::{build_agent, current_thread_runtime, init_logging, CommandResult};

pub fn run(thread: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure("chat", "runtime_init", message, 3),
    };

    let thread_id = thread.unwrap_or_else(|| format!("thread-{}", uuid::Uuid::new_v4()));

    match runtime.block_on(chat_loop(&config, &thread_id)) {
        Ok(()) => CommandResult { exit_code: 0, output: String::new() },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

async fn chat_loop(
    config: &AppConfig,
    thread_id: &str,
) -> Result<(), (&'static str, String, u8)> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;
    let store = SqliteConversationStore::new(pool);

    let agent = build_agent(config).map_err(|message| ("agent_init", message, 6u8))?;

    println!("Thread `{thread_id}` ready. Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|error| ("stdin", error.to_string(), 7u8))?
        else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | "sair") {
            println!("Agent: goodbye!");
            break;
        }

        let prior = store
            .load(thread_id)
            .await
            .map_err(|error| ("checkpoint_load", error.to_string(), 8u8))?;
        let state = agent.answer(prior, question).await;

        // The user turn is checkpointed either way; the assistant turn
        // only exists on success. Error detail went to the logs already.
        let mut new_turns = vec![ConversationTurn::user(question)];
        match &state.error {
            None => {
                println!("Agent: {}", state.answer);
                new_turns.push(ConversationTurn::assistant(state.answer.clone()));
            }
            Some(pipeline_error) => {
                println!("Agent: {}", pipeline_error.user_message());
            }
        }
        store
            .append(thread_id, &new_turns)
            .await
            .map_err(|error| ("checkpoint_append", error.to_string(), 8u8))?;
    }

    Ok(())
}
