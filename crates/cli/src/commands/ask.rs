use kisan_agent::AgentRuntime;

use crate::commands::{block_on, language_or_default, load_config, CommandResult};

pub fn run(query: &str, language: Option<&str>) -> CommandResult {
    let config = match load_config("ask") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let language = language_or_default(language, &config);

    block_on("ask", async {
        let runtime = AgentRuntime::from_config(&config);
        execute(&runtime, query, &language).await
    })
    .unwrap_or_else(|failure| failure)
}

pub async fn execute(runtime: &AgentRuntime, query: &str, language: &str) -> CommandResult {
    CommandResult::reply(runtime.handle_query(query, language).await)
}
