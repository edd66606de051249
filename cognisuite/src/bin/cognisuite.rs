//! `cognisuite` command-line front end.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use cognisuite::core::consumer::{Flow, PayloadMerger, StreamingConsumer};
use cognisuite::observability::tracing::{OutputFormat, TracingConfig, init_tracing};
use cognisuite::prelude::*;

#[derive(Parser)]
#[command(name = "cognisuite", version, about = "CogniSuite command-line client")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Backend origin
    #[arg(
        long,
        env = "COGNISUITE_BASE_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    base_url: String,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
    /// Log format (compact, pretty, json)
    #[arg(long, default_value = "compact", global = true)]
    log_format: OutputFormat,
    /// Whole-request timeout in seconds; unset means streams may run indefinitely
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Log every HTTP request and SSE event
    #[arg(long, global = true)]
    http_debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a source file and stream its analysis
    Analyze { file: PathBuf },
    /// Upload a document and ask a question about it
    Ask {
        file: PathBuf,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Generate structured JSON data
    GenerateData {
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Generate vector graphics code
    Vector(VectorArgs),
    /// List the formats and options the backend supports
    Formats,
    /// Ask the backend to validate vector code from a file
    Validate {
        #[arg(long)]
        format: VectorFormat,
        file: PathBuf,
    },
    /// Chat with the assistant; interactive when no message is given
    Chat { message: Vec<String> },
    /// Send a recording to the voice assistant and save the spoken reply
    Voice {
        audio: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args)]
struct VectorArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "svg")]
    format: VectorFormat,
    #[arg(long, default_value = "modern")]
    style: Style,
    #[arg(long, default_value = "medium")]
    complexity: Complexity,
    #[arg(long, default_value = "default")]
    color_scheme: ColorScheme,
    /// File or directory to write the code to; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

/// How a command ended, mapped onto the process exit status.
enum Outcome {
    Done,
    Failed(String),
    Cancelled,
}

impl Outcome {
    fn from_status(status: Status, error: Option<&str>) -> Self {
        match status {
            Status::Done => Outcome::Done,
            Status::Error => Outcome::Failed(error.unwrap_or("request failed").to_string()),
            _ => Outcome::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match TracingConfig::default().with_level_str(&cli.global.log_level) {
        Ok(config) => TracingConfig {
            format: cli.global.log_format,
            ..config
        },
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Failed(message)) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
        Ok(Outcome::Cancelled) => {
            eprintln!("cancelled");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_suite(global: &GlobalArgs) -> Result<CogniSuite, CogniError> {
    let mut builder = CogniSuite::builder()
        .base_url(&global.base_url)
        .http_debug(global.http_debug);
    if let Some(secs) = global.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// Unwrap an [`interruptible`] step, bailing out as cancelled on Ctrl-C.
macro_rules! or_cancelled {
    ($step:expr) => {
        match interruptible($step).await? {
            Some(value) => value,
            None => return Ok(Outcome::Cancelled),
        }
    };
    ($step:expr, $session:expr) => {
        match interruptible($step).await? {
            Some(value) => value,
            None => {
                $session.cancel();
                return Ok(Outcome::Cancelled);
            }
        }
    };
}

async fn run(cli: Cli) -> Result<Outcome, CogniError> {
    let suite = build_suite(&cli.global)?;

    match cli.command {
        Commands::Analyze { file } => {
            let mut analyzer = suite.code_analyzer();
            let file = or_cancelled!(UploadFile::from_path(&file));
            or_cancelled!(analyzer.upload(file));
            or_cancelled!(analyzer.start_analysis(), analyzer.consumer_mut());
            let mut live = LiveText::stdout();
            let status =
                drive_or_cancel(analyzer.consumer_mut(), |s| live.update(&s.analysis)).await;
            live.end(status);
            Ok(Outcome::from_status(status, analyzer.error_message()))
        }
        Commands::Ask { file, question } => {
            let mut inspector = suite.doc_inspector();
            let file = or_cancelled!(UploadFile::from_path(&file));
            or_cancelled!(inspector.upload(file));
            or_cancelled!(inspector.start_ask(&question.join(" ")), inspector.consumer_mut());
            let mut live = LiveText::stdout();
            let status = drive_or_cancel(inspector.consumer_mut(), |s| {
                if let Some(entry) = s.entries.last() {
                    live.update(&entry.answer);
                }
            })
            .await;
            live.end(status);
            Ok(Outcome::from_status(status, inspector.error_message()))
        }
        Commands::GenerateData { prompt, count } => {
            let mut generator = suite.data_generator();
            or_cancelled!(generator.start_generate(&prompt, count), generator);
            let status = drive_or_cancel(generator.consumer_mut(), |_| {}).await;
            if status == Status::Done {
                println!("{}", generator.data().pretty);
            }
            Ok(Outcome::from_status(status, generator.error_message()))
        }
        Commands::Vector(args) => run_vector(&suite, args).await,
        Commands::Formats => {
            let studio = suite.vector_studio();
            let formats = or_cancelled!(studio.supported_formats());
            println!("formats:       {}", formats.formats.join(", "));
            println!("styles:        {}", formats.styles.join(", "));
            println!("complexity:    {}", formats.complexity_levels.join(", "));
            println!("color schemes: {}", formats.color_schemes.join(", "));
            Ok(Outcome::Done)
        }
        Commands::Validate { format, file } => {
            let code = tokio::fs::read_to_string(&file).await?;
            let studio = suite.vector_studio();
            let report = or_cancelled!(studio.validate(&code, format));
            if let Some(error) = report.error {
                return Ok(Outcome::Failed(error));
            }
            println!(
                "{}: {}",
                if report.is_valid { "valid" } else { "invalid" },
                report.message.unwrap_or_default()
            );
            Ok(if report.is_valid {
                Outcome::Done
            } else {
                Outcome::Failed("code did not validate".to_string())
            })
        }
        Commands::Chat { message } => {
            let mut chat = suite.chat_assistant();
            if message.is_empty() {
                chat_repl(&mut chat).await
            } else {
                Ok(chat_turn(&mut chat, &message.join(" ")).await?)
            }
        }
        Commands::Voice { audio, out } => {
            let mut voice = suite.voice_assistant();
            let file = or_cancelled!(UploadFile::from_path(&audio));
            let reply = or_cancelled!(voice.send_recording(file));
            reply.save(&out).await?;
            eprintln!(
                "saved {} bytes of {} to {}",
                reply.audio.len(),
                reply.content_type,
                out.display()
            );
            Ok(Outcome::Done)
        }
    }
}

async fn run_vector(suite: &CogniSuite, args: VectorArgs) -> Result<Outcome, CogniError> {
    let request = VectorRequest::new(args.prompt)
        .with_format(args.format)
        .with_style(args.style)
        .with_complexity(args.complexity)
        .with_color_scheme(args.color_scheme);

    let mut studio = suite.vector_studio();
    or_cancelled!(studio.start_generate(&request), studio);
    let status = drive_or_cancel(studio.consumer_mut(), |_| {}).await;
    if status != Status::Done {
        return Ok(Outcome::from_status(status, studio.error_message()));
    }

    let output = studio.output();
    eprintln!(
        "valid: {} (attempts: {})",
        output.is_valid, output.generation_attempts
    );
    for error in &output.validation_errors {
        eprintln!("  - {error}");
    }
    match args.out {
        Some(path) => {
            let written = studio.save(&path).await?;
            eprintln!("wrote {}", written.display());
        }
        None => println!("{}", output.code),
    }
    Ok(Outcome::Done)
}

async fn chat_turn(chat: &mut ChatAssistant, message: &str) -> Result<Outcome, CogniError> {
    or_cancelled!(chat.start_send(message), chat);
    let mut live = LiveText::stdout();
    let status = drive_or_cancel(chat.consumer_mut(), |history| {
        if let Some(last) = history.messages.last() {
            live.update(&last.content);
        }
    })
    .await;
    live.end(status);
    let error = chat.messages().last().map(|m| m.content.clone());
    Ok(Outcome::from_status(status, error.as_deref()))
}

async fn chat_repl(chat: &mut ChatAssistant) -> Result<Outcome, CogniError> {
    eprintln!("type a message; /new starts over, /quit exits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let _ = std::io::stderr().flush();
        let Some(line) = lines.next_line().await? else {
            return Ok(Outcome::Done);
        };
        match line.trim() {
            "" => continue,
            "/quit" => return Ok(Outcome::Done),
            "/new" => {
                chat.new_conversation();
                eprintln!("(new conversation)");
            }
            message => match chat_turn(chat, message).await? {
                Outcome::Failed(error) => eprintln!("error: {error}"),
                Outcome::Cancelled => eprintln!("(cancelled)"),
                Outcome::Done => {}
            },
        }
    }
}

/// Run a step that precedes streaming, giving up on Ctrl-C.
///
/// `None` means the user interrupted; the step's future is dropped.
async fn interruptible<T>(
    step: impl Future<Output = Result<T, CogniError>>,
) -> Result<Option<T>, CogniError> {
    tokio::select! {
        result = step => result.map(Some),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

/// Pump until the round finishes, cancelling it on Ctrl-C.
async fn drive_or_cancel<M: PayloadMerger>(
    consumer: &mut StreamingConsumer<M>,
    mut observe: impl FnMut(&M),
) -> Status {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            flow = consumer.pump() => {
                observe(consumer.state());
                match flow {
                    Some(Flow::Continue) => {}
                    Some(Flow::Finished) | None => break,
                }
            }
            _ = &mut ctrl_c => {
                consumer.cancel();
                break;
            }
        }
    }
    consumer.status()
}

/// Prints growing text incrementally.
struct LiveText<W: Write> {
    out: W,
    printed: String,
}

impl LiveText<std::io::Stdout> {
    fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> LiveText<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            printed: String::new(),
        }
    }

    fn update(&mut self, text: &str) {
        if text == self.printed {
            return;
        }
        let _ = match text.strip_prefix(self.printed.as_str()) {
            Some(rest) => write!(self.out, "{rest}"),
            None => write!(self.out, "\n{text}"),
        };
        let _ = self.out.flush();
        self.printed = text.to_string();
    }

    /// Close the line. Text already shown for a cancelled round is marked
    /// as discarded, since the session no longer holds it.
    fn end(&mut self, status: Status) {
        if self.printed.is_empty() {
            return;
        }
        let _ = if status.is_busy() || status == Status::Idle {
            writeln!(self.out, "\n[partial output discarded]")
        } else {
            writeln!(self.out)
        };
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(live: LiveText<Vec<u8>>) -> String {
        String::from_utf8(live.out).unwrap()
    }

    #[test]
    fn live_text_prints_only_the_new_suffix() {
        let mut live = LiveText::new(Vec::new());
        live.update("He");
        live.update("Hello");
        live.update("Hello");
        live.end(Status::Done);
        assert_eq!(rendered(live), "Hello\n");
    }

    #[test]
    fn replaced_text_starts_a_new_line() {
        let mut live = LiveText::new(Vec::new());
        live.update("draft");
        live.update("final");
        live.end(Status::Error);
        assert_eq!(rendered(live), "draft\nfinal\n");
    }

    #[test]
    fn cancelled_round_marks_shown_text_as_discarded() {
        let mut live = LiveText::new(Vec::new());
        live.update("partial answer");
        live.end(Status::Idle);
        assert_eq!(rendered(live), "partial answer\n[partial output discarded]\n");

        let mut live = LiveText::new(Vec::new());
        live.end(Status::Idle);
        assert_eq!(rendered(live), "");
    }

    #[test]
    fn cancelled_status_maps_to_cancelled_outcome() {
        assert!(matches!(Outcome::from_status(Status::Idle, None), Outcome::Cancelled));
        assert!(matches!(
            Outcome::from_status(Status::Error, Some("boom")),
            Outcome::Failed(message) if message == "boom"
        ));
    }

    #[tokio::test]
    async fn interruptible_passes_results_through() {
        let value = interruptible(async { Ok::<_, CogniError>(7) }).await.unwrap();
        assert_eq!(value, Some(7));

        let err = interruptible(async {
            Err::<(), _>(CogniError::invalid_input("nope"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CogniError::InvalidInput(_)));
    }
}
