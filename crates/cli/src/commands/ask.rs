use atende_core::config::{AppConfig, LoadOptions};
use atende_core::ConversationTurn;
use atende_db::{connect, migrations, ConversationStore, SqliteConversationStore};

use crate::commands::{build_agent, current_thread_runtime, init_logging, CommandResult};

pub fn run(question: &str, thread: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure("ask", "runtime_init", message, 3),
    };

    match runtime.block_on(ask_once(&config, question, thread.as_deref())) {
        Ok(answer) => CommandResult { exit_code: 0, output: answer },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}

async fn ask_once(
    config: &AppConfig,
    question: &str,
    thread_id: Option<&str>,
) -> Result<String, (&'static str, String, u8)> {
    let agent = build_agent(config).map_err(|message| ("agent_init", message, 6u8))?;

    // Without a thread there is nothing to remember or resume; the run is
    // stateless and skips the checkpoint store entirely.
    let Some(thread_id) = thread_id else {
        let state = agent.answer(Vec::new(), question).await;
        return Ok(answer_or_apology(&state));
    };

    let pool = connect(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;
    let store = SqliteConversationStore::new(pool);

    let prior = store
        .load(thread_id)
        .await
        .map_err(|error| ("checkpoint_load", error.to_string(), 8u8))?;
    let state = agent.answer(prior, question).await;

    let mut new_turns = vec![ConversationTurn::user(question)];
    if state.error.is_none() {
        new_turns.push(ConversationTurn::assistant(state.answer.clone()));
    }
    store
        .append(thread_id, &new_turns)
        .await
        .map_err(|error| ("checkpoint_append", error.to_string(), 8u8))?;

    Ok(answer_or_apology(&state))
}

fn answer_or_apology(state: &atende_core::AgentState) -> String {
    match &state.error {
        None => state.answer.clone(),
        Some(pipeline_error) => pipeline_error.user_message().to_string(),
    }
}
