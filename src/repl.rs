//! # Interactive playground
//!
//! The terminal rendition of the demo's interface: one input line, three
//! triggers (microphone capture, answer resolution, stop narration), and the
//! resolved answer printed and read aloud.
//!
//! Each turn runs the resolution pipeline to completion before control
//! returns to the prompt; narration is the only background activity. The
//! per-line decision logic lives in [`handle_turn`]; [`playground`] owns the
//! terminal IO around it.

use std::error::Error;
use std::io::{BufRead, Write, stdin, stdout};

use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, SetAttribute, SetForegroundColor},
};

use crate::cache::SemanticCache;
use crate::config::WonderWhyConfig;
use crate::encyclopedia::EncyclopediaClient;
use crate::resolver::{self, AnswerSource, ResolvedAnswer};
use crate::session::{PromptSession, VoiceIntake, capture_question};
use crate::speech::Narrator;
use crate::voice::Transcriber;

const BANNER: &str = "\
Wonder Why — ask me anything!
  - type a question and press Enter
  - :mic   capture a question from the microphone
  - :stop  stop the voice mid-answer
  - exit   leave the playground
";

/// What a single playground turn decided.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The user asked to leave the playground.
    Exit,
    /// The user asked to silence the narrator.
    Stopped,
    /// Nothing to resolve this turn; show the message and re-prompt.
    Warning(String),
    /// A question was resolved into an answer.
    Answered {
        /// The microphone transcript, when the question was spoken.
        transcript: Option<String>,
        answer: ResolvedAnswer,
    },
}

/// Process one trimmed input line.
///
/// An empty line (or a failed microphone capture) never reaches the
/// resolver, so it cannot trigger a model call or a cache write.
pub async fn handle_turn(
    line: &str,
    config: &WonderWhyConfig,
    cache: &mut SemanticCache,
    encyclopedia: &EncyclopediaClient,
    session: &mut PromptSession,
    transcriber: &mut dyn Transcriber,
) -> TurnOutcome {
    let mut transcript = None;

    match line {
        "exit" => return TurnOutcome::Exit,
        ":stop" => return TurnOutcome::Stopped,
        ":mic" => match capture_question(session, transcriber) {
            VoiceIntake::Heard(heard) => transcript = Some(heard),
            VoiceIntake::Failed(diagnostic) => return TurnOutcome::Warning(diagnostic),
        },
        typed => session.set_typed(typed),
    }

    if !session.has_question() {
        return TurnOutcome::Warning("Please type or speak your question.".to_string());
    }

    let answer = resolver::resolve(config, cache, encyclopedia, session.question()).await;
    TurnOutcome::Answered { transcript, answer }
}

/// Run the interactive playground loop until the user types `exit`.
pub async fn playground(
    config: &WonderWhyConfig,
    cache: &mut SemanticCache,
    encyclopedia: &EncyclopediaClient,
    narrator: &mut Narrator,
    transcriber: &mut dyn Transcriber,
) -> Result<(), Box<dyn Error>> {
    println!("{BANNER}");

    let mut session = PromptSession::new();
    let input = stdin();

    loop {
        let mut out = stdout();
        out.execute(SetForegroundColor(Color::Green))?;
        print!("\nYou: ");
        out.flush()?;
        out.execute(SetForegroundColor(Color::Reset))?;

        let mut line = String::new();
        if input.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line == ":mic" {
            println!("Speak now...");
        }

        match handle_turn(line, config, cache, encyclopedia, &mut session, transcriber).await {
            TurnOutcome::Exit => break,
            TurnOutcome::Stopped => narrator.stop(),
            TurnOutcome::Warning(message) => println!("{message}"),
            TurnOutcome::Answered { transcript, answer } => {
                if let Some(heard) = transcript {
                    println!("You said: {heard}");
                }

                match answer.source {
                    AnswerSource::Cache => println!("Found a similar question!"),
                    AnswerSource::Model => println!("Here's your answer!"),
                    AnswerSource::Encyclopedia => println!("Here's what the encyclopedia says:"),
                }

                out.execute(SetForegroundColor(Color::Blue))?;
                out.execute(SetAttribute(Attribute::Bold))?;
                println!("{}", answer.text);
                out.execute(SetAttribute(Attribute::Reset))?;
                out.execute(SetForegroundColor(Color::Reset))?;

                narrator.narrate(answer.text);
            }
        }
    }

    narrator.stop();
    Ok(())
}
