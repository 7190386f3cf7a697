use std::path::Path;

use kisan_agent::AgentRuntime;

use crate::commands::{block_on, language_or_default, load_config, CommandResult};

pub fn run(image: &Path, language: Option<&str>) -> CommandResult {
    let config = match load_config("diagnose") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let language = language_or_default(language, &config);

    block_on("diagnose", async {
        let runtime = AgentRuntime::from_config(&config);
        execute(&runtime, image, &language).await
    })
    .unwrap_or_else(|failure| failure)
}

/// A missing file is reported before any agent is involved; an unreadable one
/// gets the crop agent's own error text.
pub async fn execute(runtime: &AgentRuntime, image: &Path, language: &str) -> CommandResult {
    if !image.exists() {
        return CommandResult::failure(
            "diagnose",
            "image_not_found",
            format!("Sorry, I could not find that file: {}", image.display()),
            1,
        );
    }
    CommandResult::reply(runtime.diagnose(&image.to_string_lossy(), language).await)
}
