pub mod agent;
pub mod cli;
pub mod history;
pub mod llm;
pub mod models;

use agent::ChatAgent;
use cli::Args;
use futures::StreamExt;
use history::format_transcript;
use log::info;
use std::error::Error;
use std::io::Write;
use tokio::io::{ AsyncBufReadExt, BufReader };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Model: {}", args.chat_model);
    info!("Endpoint: {}", args.chat_base_url);
    info!("History Store Type: {}", args.history_type);
    if args.history_type.eq_ignore_ascii_case("file") {
        info!("History Path: {}", args.history_path);
    }
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("-------------------------");

    let mut agent = ChatAgent::new(&args).await?;

    println!("DeepSeek AI Assistant");
    println!("Type a prompt, or :new, :list, :open <n>, :resume, :clear, :quit");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match input.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" => {
                break;
            }
            ":new" => {
                match agent.store_mut().start_new().await {
                    Ok(true) => println!("Conversation archived. Starting fresh."),
                    Ok(false) => println!("Starting fresh."),
                    Err(e) => eprintln!("Could not save conversation: {}", e),
                }
            }
            ":list" => {
                let conversations = agent.store().conversations();
                if conversations.is_empty() {
                    println!("No past conversations.");
                }
                for (i, conversation) in conversations.iter().enumerate() {
                    println!(
                        "{:>3}  {}  ({} messages)",
                        i + 1,
                        conversation.label(),
                        conversation.messages.len()
                    );
                }
            }
            ":resume" => {
                agent.store_mut().resume();
                println!("Back to the live conversation.");
            }
            ":clear" => {
                match agent.store_mut().clear_all().await {
                    Ok(()) => println!("History cleared."),
                    Err(e) => eprintln!("Could not clear history: {}", e),
                }
            }
            _ if line.starts_with(":open") => {
                open_conversation(&mut agent, line);
            }
            _ if line.starts_with(':') => {
                println!("Unknown command: {}", line);
            }
            prompt => {
                run_exchange(&mut agent, prompt, &mut std::io::stdout()).await;
            }
        }
    }

    // Archive the live conversation so nothing typed this session is lost.
    if agent.store_mut().start_new().await? {
        info!("Session conversation archived");
    }
    Ok(())
}

fn open_conversation(agent: &mut ChatAgent, line: &str) {
    let index = line
        .trim_start_matches(":open")
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1);
    let index = match index {
        Some(n) => n,
        None => {
            println!("Usage: :open <n>  (see :list)");
            return;
        }
    };
    let id = agent.store().conversations().get(index - 1).map(|c| c.id.clone());
    let id = match id {
        Some(id) => id,
        None => {
            println!("No conversation #{}. See :list.", index);
            return;
        }
    };
    match agent.store_mut().select(&id) {
        Ok(conversation) => {
            println!("--- {} (read-only, :resume to go back) ---", conversation.label());
            print!("{}", format_transcript(&conversation.messages));
        }
        Err(e) => println!("{}", e),
    }
}

async fn run_exchange(agent: &mut ChatAgent, prompt: &str, out: &mut dyn Write) {
    let mut stream = match agent.send(prompt) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = writeln!(out, "{}", e);
            return;
        }
    };

    // Diagnostics print inline and become part of the recorded response,
    // matching the streamed display. A display failure is a notice, not a
    // session abort: keep consuming so the exchange is still recorded.
    let mut response = String::new();
    let mut display_ok = true;
    while let Some(fragment) = stream.next().await {
        let text = fragment.as_text();
        response.push_str(text);
        if display_ok {
            if let Err(e) = write!(out, "{}", text).and_then(|_| out.flush()) {
                eprintln!("Error during streaming: {}", e);
                display_ok = false;
            }
        }
    }
    let _ = writeln!(out);

    if let Err(e) = agent.commit(response) {
        eprintln!("Could not record response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::chat::Role;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "display gone"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "display gone"))
        }
    }

    fn offline_args() -> Args {
        Args {
            api_key: String::new(),
            chat_model: "deepseek-chat".to_string(),
            chat_base_url: "http://127.0.0.1:9".to_string(),
            max_tokens: 16,
            temperature: 0.7,
            history_type: "memory".to_string(),
            history_path: String::new(),
            request_timeout_secs: 5,
            connect_timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn display_failure_does_not_abort_the_exchange() {
        // With no credential the stream is a single inline diagnostic and
        // the exchange is fully offline.
        let mut agent = ChatAgent::new(&offline_args()).await.unwrap();
        run_exchange(&mut agent, "hello", &mut FailingWriter).await;

        let messages = agent.store().active_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].content.contains("API key"));
    }
}
