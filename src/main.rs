//! EEP Wizard terminal front end
//!
//! Reads the project description, answers and refinement notes from stdin
//! and renders each result as plain text. `:export` writes the error log to
//! the working directory, `:new` starts over and `:quit` exits.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eep_wizard::adapters::{
    AnthropicEngine, AnthropicEngineConfig, FileErrorLogStore, OpenAiEngine, OpenAiEngineConfig,
};
use eep_wizard::application::{
    ExportErrorLogHandler, OrchestratorTiming, WizardError, WizardOrchestrator,
};
use eep_wizard::config::{AppConfig, EngineConfig, EngineProvider, LoggingConfig};
use eep_wizard::domain::wizard::{ProtocolComposer, WizardSession, WizardState};
use eep_wizard::ports::{EngineChannel, ErrorLogStore};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Export,
    New,
    Text(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":quit" | ":q" => Self::Quit,
            ":export" => Self::Export,
            ":new" => Self::New,
            other => Self::Text(other.to_string()),
        }
    }
}

/// Outcome of prompting for every pending question.
#[derive(Debug, PartialEq, Eq)]
enum AnswerInput {
    Submitted(Vec<String>),
    /// A command was typed at a question prompt, or stdin closed (`Quit`).
    Interrupted(Command),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    config.validate()?;

    let engine = build_engine(&config.engine)?;
    let channel = engine.channel_info();
    tracing::info!(channel = %channel.name, model = %channel.model, "engine ready");

    let store: Arc<dyn ErrorLogStore> =
        Arc::new(FileErrorLogStore::new(&config.wizard.error_log_path));
    let exporter = ExportErrorLogHandler::new(Arc::clone(&store));
    let orchestrator = WizardOrchestrator::new(
        engine,
        store,
        ProtocolComposer::new(config.wizard.output_language.clone()),
        OrchestratorTiming {
            settle_delay: config.wizard.settle_delay(),
            revert_delay: config.wizard.revert_delay(),
        },
    );

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut session = WizardSession::new();
    println!("EEP Wizard. Commands: :export, :new, :quit");

    loop {
        if !session.state().accepts_user_action() {
            if session.state() == WizardState::FailedTransient {
                orchestrator.await_revert(&mut session).await;
            } else {
                tracing::error!(
                    session_id = %session.id(),
                    "session stuck in flight, starting over"
                );
                session = WizardSession::new();
            }
            continue;
        }

        if session.state() == WizardState::ShowingMissingInfo {
            match collect_answers(&mut input, session.questions()).await? {
                AnswerInput::Submitted(answers) => {
                    let outcome = orchestrator.reply(&mut session, &answers).await;
                    report(&session, outcome);
                }
                AnswerInput::Interrupted(Command::Export) => export_log(&exporter).await,
                AnswerInput::Interrupted(Command::New) => session = WizardSession::new(),
                AnswerInput::Interrupted(_) => break,
            }
            continue;
        }

        let prompt = if session.state() == WizardState::ShowingResult {
            "Refinement (blank to keep)> "
        } else {
            "Describe your project> "
        };
        let Some(line) = prompt_line(&mut input, prompt).await? else {
            break;
        };

        let outcome = match Command::parse(&line) {
            Command::Quit => break,
            Command::Export => {
                export_log(&exporter).await;
                continue;
            }
            Command::New => {
                session = WizardSession::new();
                continue;
            }
            Command::Text(text) => match session.state() {
                WizardState::ShowingResult => orchestrator.refine(&mut session, &text).await,
                _ => orchestrator.start(&mut session, &text).await,
            },
        };

        report(&session, outcome);
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }
    Ok(())
}

fn build_engine(config: &EngineConfig) -> Result<Arc<dyn EngineChannel>, Box<dyn Error>> {
    let engine: Arc<dyn EngineChannel> = match config.provider {
        EngineProvider::OpenAI => {
            let key = config.openai_api_key.clone().unwrap_or_default();
            let mut engine_config = OpenAiEngineConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries)
                .with_max_tokens(config.max_tokens);
            if let Some(model) = &config.model {
                engine_config = engine_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                engine_config = engine_config.with_base_url(url);
            }
            Arc::new(OpenAiEngine::new(engine_config)?)
        }
        EngineProvider::Anthropic => {
            let key = config.anthropic_api_key.clone().unwrap_or_default();
            let mut engine_config = AnthropicEngineConfig::new(key)
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries)
                .with_max_tokens(config.max_tokens);
            if let Some(model) = &config.model {
                engine_config = engine_config.with_model(model);
            }
            if let Some(url) = &config.base_url {
                engine_config = engine_config.with_base_url(url);
            }
            Arc::new(AnthropicEngine::new(engine_config)?)
        }
    };
    Ok(engine)
}

async fn prompt_line<R>(input: &mut Lines<R>, prompt: &str) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{}", prompt);
    std::io::stdout().flush()?;
    input.next_line().await
}

/// Asks each pending question in order. Commands are never sent as answers.
async fn collect_answers<R>(
    input: &mut Lines<R>,
    questions: &[String],
) -> std::io::Result<AnswerInput>
where
    R: AsyncBufRead + Unpin,
{
    let mut answers = Vec::with_capacity(questions.len());
    for (i, question) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, question);
        let Some(line) = prompt_line(input, "   > ").await? else {
            return Ok(AnswerInput::Interrupted(Command::Quit));
        };
        match Command::parse(&line) {
            Command::Text(answer) => answers.push(answer),
            command => return Ok(AnswerInput::Interrupted(command)),
        }
    }
    Ok(AnswerInput::Submitted(answers))
}

async fn export_log(exporter: &ExportErrorLogHandler) {
    match exporter.handle().await {
        Ok(Some(export)) => match tokio::fs::write(&export.file_name, &export.contents).await {
            Ok(()) => println!(
                "Exported {} entries to {}",
                export.entry_count, export.file_name
            ),
            Err(err) => println!("Could not write {}: {}", export.file_name, err),
        },
        Ok(None) => println!("The error log has no entries"),
        Err(err) => println!("Could not read the error log: {}", err),
    }
}

fn report(session: &WizardSession, outcome: Result<WizardState, WizardError>) {
    if let Err(err) = &outcome {
        if err.is_validation() {
            println!("! {}", err.user_message());
            return;
        }
    }

    if let Some(notice) = session.notice() {
        let marker = if notice.is_error { "!" } else { "*" };
        println!("{} {}", marker, notice.message);
    }

    match session.state() {
        WizardState::ShowingResult => render_result(session),
        WizardState::ShowingMissingInfo => println!("The engine needs more information:"),
        _ => {}
    }
}

fn render_result(session: &WizardSession) {
    for phase in session.phases() {
        println!();
        println!("== {} {} ==", phase.phase_id, phase.title);
        for step in &phase.steps {
            if step.is_implementation() {
                println!("-- {} --", step.label);
                println!("{}", step.content);
                println!("-- end --");
            } else {
                println!("[{}] {}: {}", step.step_id, step.label, step.content);
            }
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &'static str) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(text.as_bytes()).lines()
    }

    fn questions() -> Vec<String> {
        vec!["Which database?".to_string(), "How many users?".to_string()]
    }

    #[test]
    fn parses_commands_and_trims_text() {
        assert_eq!(Command::parse(" :quit "), Command::Quit);
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse(":export"), Command::Export);
        assert_eq!(Command::parse(":new"), Command::New);
        assert_eq!(Command::parse("  Postgres "), Command::Text("Postgres".to_string()));
    }

    #[tokio::test]
    async fn answers_are_collected_in_order() {
        let mut input = lines("Postgres\n\n");
        assert_eq!(
            collect_answers(&mut input, &questions()).await.unwrap(),
            AnswerInput::Submitted(vec!["Postgres".to_string(), String::new()])
        );
    }

    #[tokio::test]
    async fn command_at_question_prompt_is_not_an_answer() {
        let mut input = lines("Postgres\n:export\n");
        assert_eq!(
            collect_answers(&mut input, &questions()).await.unwrap(),
            AnswerInput::Interrupted(Command::Export)
        );

        let mut input = lines(":quit\n");
        assert_eq!(
            collect_answers(&mut input, &questions()).await.unwrap(),
            AnswerInput::Interrupted(Command::Quit)
        );
    }

    #[tokio::test]
    async fn closed_input_interrupts_as_quit() {
        let mut input = lines("Postgres\n");
        assert_eq!(
            collect_answers(&mut input, &questions()).await.unwrap(),
            AnswerInput::Interrupted(Command::Quit)
        );
    }
}
