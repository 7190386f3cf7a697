use std::io::{self, BufRead, Write};

use kisan_agent::AgentRuntime;

use crate::commands::{block_on, language_or_default, load_config, CommandResult};
use crate::speech::SpeechCleaner;

const WELCOME: &str = "Welcome! I am your Kisan Mitra. How can I assist you?";
const GOODBYE: &str = "Goodbye!";
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "stop"];
const PHOTO_PREFIX: &str = "/photo ";

pub fn run(language: Option<&str>, speech: bool) -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let language = language_or_default(language, &config);
    let cleaner = match speech.then(SpeechCleaner::new).transpose() {
        Ok(cleaner) => cleaner,
        Err(error) => return CommandResult::failure("chat", "speech", error.to_string(), 1),
    };

    let outcome = block_on("chat", async {
        let runtime = AgentRuntime::from_config(&config);
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        session(&runtime, &language, cleaner.as_ref(), stdin.lock(), &mut stdout).await
    });

    match outcome {
        Ok(Ok(())) => CommandResult::reply(String::new()),
        Ok(Err(error)) => CommandResult::failure("chat", "io", error.to_string(), 1),
        Err(failure) => failure,
    }
}

/// Read-eval loop until end of input or an exit word. A line starting with
/// `/photo <path>` goes straight to crop diagnosis.
pub async fn session<R, W>(
    runtime: &AgentRuntime,
    language: &str,
    cleaner: Option<&SpeechCleaner>,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    say(output, cleaner, WELCOME)?;
    for line in input.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let reply = match query.strip_prefix(PHOTO_PREFIX) {
            Some(path) => runtime.diagnose(path.trim(), language).await,
            None => {
                let lowered = query.to_lowercase();
                if EXIT_WORDS.iter().any(|word| lowered.contains(word)) {
                    say(output, cleaner, GOODBYE)?;
                    break;
                }
                runtime.handle_query(query, language).await
            }
        };
        say(output, cleaner, &reply)?;
        output.flush()?;
    }
    Ok(())
}

fn say<W: Write>(output: &mut W, cleaner: Option<&SpeechCleaner>, text: &str) -> io::Result<()> {
    let spoken = match cleaner {
        Some(cleaner) => cleaner.clean_for_speech(text),
        None => text.to_string(),
    };
    writeln!(output, "Kisan Mitra: {spoken}")
}
