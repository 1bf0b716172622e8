//! Line-oriented terminal front end
//!
//! Collects the celebrity, the opening question and a creativity level,
//! then relays the conversation until the user says "bye".

use crate::llm::{self, CompletionError, Creativity, GenerationParameters, LlmConfig, LlmService};
use crate::runtime::{ChatSession, SessionError};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

const EXIT_WORD: &str = "bye";

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// What the user typed at the response prompt
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Exit,
    NewConversation,
    SetCreativity(String),
    Message(String),
}

impl Command {
    fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case(EXIT_WORD) {
            return Command::Exit;
        }
        match input.split_once(char::is_whitespace) {
            Some(("/creativity", arg)) => Command::SetCreativity(arg.trim().to_string()),
            None if input == "/creativity" => Command::SetCreativity(String::new()),
            None if input == "/new" => Command::NewConversation,
            _ => Command::Message(input.to_string()),
        }
    }
}

pub struct Terminal<R, W> {
    lines: Lines<R>,
    output: W,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Connect to the configured provider and chat.
    ///
    /// Without a credential this prints a notice and returns before any
    /// prompt is shown or any request is made.
    pub async fn launch(&mut self, config: &LlmConfig) -> Result<(), TerminalError> {
        if !config.has_api_key() {
            tracing::warn!("No API key configured. Set OPEN_AI_KEY or OPENAI_API_KEY.");
            self.say("API key not found. Please check your .env file.\n").await?;
            return Ok(());
        }

        let params = GenerationParameters::new(String::new())
            .with_max_output_tokens(config.max_output_tokens);
        let mut session = ChatSession::new(llm::connect(config)?, params);
        self.run(&mut session).await
    }

    /// Drive conversations until the user exits or input ends
    pub async fn run<L: LlmService>(
        &mut self,
        session: &mut ChatSession<L>,
    ) -> Result<(), TerminalError> {
        let mut creativity_chosen = false;

        loop {
            let Some(persona) = self.ask_persona().await? else {
                return Ok(());
            };
            let Some(question) = self.ask_question(&persona).await? else {
                return Ok(());
            };
            if !creativity_chosen {
                let Some(creativity) = self.ask_creativity().await? else {
                    return Ok(());
                };
                session.set_creativity(creativity);
                creativity_chosen = true;
            }

            session.set_persona(persona.clone());
            session.start().await?;
            self.say("(Type /new for another celebrity or /creativity N to adjust creativity.)\n")
                .await?;

            let another = self.converse(session, &persona, question).await?;
            tracing::debug!(turns = session.transcript().len(), "Conversation finished");
            if !another {
                return Ok(());
            }
            session.reset().await?;
        }
    }

    /// Relay one conversation. Returns `false` when the user exits.
    async fn converse<L: LlmService>(
        &mut self,
        session: &mut ChatSession<L>,
        persona: &str,
        first_message: String,
    ) -> Result<bool, TerminalError> {
        let mut pending = Some(first_message);

        loop {
            if let Some(message) = pending.take() {
                match session.submit(message).await {
                    Ok(reply) => self.say(&format!("\n{persona}: {reply}\n\n")).await?,
                    Err(SessionError::Completion { error, discarded }) => {
                        self.say(&format!(
                            "An error occurred: {error}\n\
                             Please try again. Your message was not sent: {discarded}\n"
                        ))
                        .await?;
                    }
                    Err(e) => self.say(&format!("{e}\n")).await?,
                }
            }

            let Some(input) = self.ask_response(persona).await? else {
                return Ok(false);
            };
            match Command::parse(&input) {
                Command::Exit => {
                    self.say("Thanks for chatting!\n").await?;
                    return Ok(false);
                }
                Command::NewConversation => return Ok(true),
                Command::SetCreativity(arg) if arg.is_empty() => {
                    let current = session.params().creativity;
                    self.say(&format!("Creativity is {current}.\n")).await?;
                }
                Command::SetCreativity(arg) => match arg.parse::<Creativity>() {
                    Ok(creativity) => {
                        session.set_creativity(creativity);
                        self.say(&format!("Creativity set to {creativity}.\n")).await?;
                    }
                    Err(e) => self.say(&format!("{e}\n")).await?,
                },
                Command::Message(text) => pending = Some(text),
            }
        }
    }

    async fn ask_persona(&mut self) -> io::Result<Option<String>> {
        self.ask_until(
            "What celebrity person would you like to talk to?\n",
            "Please enter a celebrity name.\n",
        )
        .await
    }

    async fn ask_question(&mut self, persona: &str) -> io::Result<Option<String>> {
        self.ask_until(
            &format!("Ok! Now ask {persona} a question!\n"),
            "Please enter a question.\n",
        )
        .await
    }

    async fn ask_response(&mut self, persona: &str) -> io::Result<Option<String>> {
        self.ask_until(
            &format!("Respond to {persona} (or type \"{EXIT_WORD}\" to exit): "),
            &format!("Please enter a response or type '{EXIT_WORD}' to exit.\n"),
        )
        .await
    }

    async fn ask_creativity(&mut self) -> io::Result<Option<Creativity>> {
        loop {
            let Some(answer) = self
                .ask("How creative do you want the responses to be (on scale 0-10)?\n")
                .await?
            else {
                return Ok(None);
            };
            match answer.parse::<Creativity>() {
                Ok(creativity) => return Ok(Some(creativity)),
                Err(e) => self.say(&format!("{e}\n")).await?,
            }
        }
    }

    /// Repeat `prompt` until a non-blank answer arrives; `None` at end of input
    async fn ask_until(&mut self, prompt: &str, complaint: &str) -> io::Result<Option<String>> {
        loop {
            match self.ask(prompt).await? {
                Some(answer) if !answer.is_empty() => return Ok(Some(answer)),
                Some(_) => self.say(complaint).await?,
                None => return Ok(None),
            }
        }
    }

    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.say(prompt).await?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }
}
