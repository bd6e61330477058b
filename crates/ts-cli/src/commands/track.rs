//! Interactive stopwatch session.
//!
//! Reads one command per line while the stopwatch ticks in the background.
//! Command errors are printed and the session carries on; end of input or
//! `quit` ends it.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use ts_core::{
    Categorizer, Clock, IdProvider, Persistence, Session, SessionError, Store, SuggestionState,
    TickSource, format_duration, match_category,
};

use super::categories;
use super::util::resolve_category;

const HELP: &str = "\
Commands:
  start              Start or resume the stopwatch
  pause              Pause the stopwatch
  reset              Zero the stopwatch and clear the description
  status             Show the timer, category and description
  category [NAME]    Select a category by ID or name, or list them
  describe [TEXT]    Set the description (empty clears it)
  suggest            Ask Claude for a category suggestion
  use                Select the suggested category
  log                Log the elapsed time and reset
  help               Show this help
  quit               End the session";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Status,
    Category(Option<String>),
    Describe(String),
    Suggest,
    UseSuggestion,
    Log,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));
        match word.to_lowercase().as_str() {
            "" => Self::Empty,
            "start" | "resume" => Self::Start,
            "pause" | "stop" => Self::Pause,
            "reset" => Self::Reset,
            "status" => Self::Status,
            "category" | "cat" => Self::Category((!rest.is_empty()).then(|| rest.to_string())),
            "describe" | "desc" => Self::Describe(rest.to_string()),
            "suggest" => Self::Suggest,
            "use" => Self::UseSuggestion,
            "log" => Self::Log,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Tick,
}

/// Runs an interactive session until `quit` or end of input.
pub async fn run_session<R, W, S, P, I, C, K>(
    input: R,
    writer: &mut W,
    session: &mut Session<S>,
    store: &mut Store<P, I, C>,
    categorizer: Option<&K>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: TickSource,
    P: Persistence,
    I: IdProvider,
    C: Clock,
    K: Categorizer,
{
    session.ensure_selection(store.categories());
    writeln!(writer, "TrackStar session. Type 'help' for commands.")?;
    write_selected(writer, session, store)?;

    let mut lines = input.lines();
    loop {
        // Overdue ticks drain before the next line is handled.
        let event = tokio::select! {
            biased;
            () = session.next_tick() => Event::Tick,
            line = lines.next_line() => Event::Line(line),
        };

        match event {
            Event::Tick => {
                tracing::trace!(elapsed = session.elapsed(), "tick");
            }
            Event::Line(line) => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                let command = Command::parse(&line);
                tracing::debug!(?command, "session command");
                if matches!(
                    handle_command(command, writer, session, store, categorizer).await?,
                    Flow::Quit
                ) {
                    break;
                }
            }
        }
    }

    if session.elapsed() > 0 {
        writeln!(
            writer,
            "Discarding {} of unlogged time.",
            session.formatted_time()
        )?;
    }
    session.pause();
    writeln!(writer, "Bye.")?;
    Ok(())
}

async fn handle_command<W, S, P, I, C, K>(
    command: Command,
    writer: &mut W,
    session: &mut Session<S>,
    store: &mut Store<P, I, C>,
    categorizer: Option<&K>,
) -> Result<Flow>
where
    W: Write,
    S: TickSource,
    P: Persistence,
    I: IdProvider,
    C: Clock,
    K: Categorizer,
{
    match command {
        Command::Empty => {}
        Command::Start => {
            if session.is_running() {
                writeln!(writer, "Timer is already running.")?;
            } else {
                session.start();
                writeln!(writer, "Timer started at {}.", session.formatted_time())?;
            }
        }
        Command::Pause => {
            if session.is_running() {
                session.pause();
                writeln!(writer, "Timer paused at {}.", session.formatted_time())?;
            } else {
                writeln!(writer, "Timer is not running.")?;
            }
        }
        Command::Reset => {
            session.reset();
            writeln!(writer, "Timer reset.")?;
        }
        Command::Status => write_status(writer, session, store)?,
        Command::Category(None) => categories::list(writer, store.categories(), false)?,
        Command::Category(Some(needle)) => match resolve_category(store.categories(), &needle) {
            Ok(category) => {
                session.select_category(Some(category.id.clone()));
                writeln!(writer, "Selected category {}.", category.name)?;
            }
            Err(err) => writeln!(writer, "Error: {err}")?,
        },
        Command::Describe(text) => {
            session.set_description(text);
            if session.description().is_empty() {
                writeln!(writer, "Description cleared.")?;
            } else {
                writeln!(writer, "Description set.")?;
            }
        }
        Command::Suggest => suggest(writer, session, store, categorizer).await?,
        Command::UseSuggestion => match session.use_suggestion(store.categories()) {
            Ok(category) => writeln!(writer, "Selected category {}.", category.name)?,
            Err(err) => writeln!(writer, "Error: {err}")?,
        },
        Command::Log => match session.log_time(store) {
            Ok(entry) => writeln!(
                writer,
                "Logged {} to {}.",
                format_duration(entry.duration_seconds),
                entry.category_name
            )?,
            Err(err @ SessionError::Store(_)) => {
                tracing::warn!(error = %err, "failed to save time entry");
                writeln!(writer, "Error: failed to save time entry: {err}")?;
            }
            Err(err) => writeln!(writer, "Error: {err}")?,
        },
        Command::Help => writeln!(writer, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
        Command::Unknown(word) => {
            writeln!(writer, "Unknown command '{word}'. Type 'help' for commands.")?;
        }
    }
    Ok(Flow::Continue)
}

async fn suggest<W, S, P, I, C, K>(
    writer: &mut W,
    session: &mut Session<S>,
    store: &Store<P, I, C>,
    categorizer: Option<&K>,
) -> Result<()>
where
    W: Write,
    S: TickSource,
    P: Persistence,
    I: IdProvider,
    C: Clock,
    K: Categorizer,
{
    let Some(categorizer) = categorizer else {
        writeln!(
            writer,
            "Error: suggestions need a Claude API key (set TRACKSTAR_API_KEY or config.toml)"
        )?;
        return Ok(());
    };

    writeln!(writer, "Asking Claude about {}...", session.formatted_time())?;
    match session.suggest(categorizer).await {
        Ok(SuggestionState::Ready(suggestion)) => {
            writeln!(
                writer,
                "Suggested category: {} ({} confidence)",
                suggestion.category, suggestion.confidence
            )?;
            if match_category(store.categories(), &suggestion.category).is_some() {
                writeln!(writer, "Type 'use' to select it.")?;
            } else {
                writeln!(
                    writer,
                    "No category named \"{}\" exists; create it or choose another.",
                    suggestion.category
                )?;
            }
        }
        Ok(SuggestionState::Failed(message)) => writeln!(writer, "Error: {message}")?,
        Ok(SuggestionState::Idle | SuggestionState::Pending) => {}
        Err(err) => writeln!(writer, "Error: {err}")?,
    }
    Ok(())
}

fn write_selected<W, S, P, I, C>(
    writer: &mut W,
    session: &Session<S>,
    store: &Store<P, I, C>,
) -> Result<()>
where
    W: Write,
    S: TickSource,
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    let name = session
        .selected()
        .and_then(|id| store.category(id))
        .map_or("(none)", |category| category.name.as_str());
    writeln!(writer, "Category: {name}")?;
    Ok(())
}

fn write_status<W, S, P, I, C>(
    writer: &mut W,
    session: &Session<S>,
    store: &Store<P, I, C>,
) -> Result<()>
where
    W: Write,
    S: TickSource,
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    writeln!(
        writer,
        "Timer: {} ({})",
        session.formatted_time(),
        session.stopwatch().state()
    )?;
    write_selected(writer, session, store)?;
    let description = if session.description().is_empty() {
        "(none)"
    } else {
        session.description()
    };
    writeln!(writer, "Description: {description}")?;
    if session.is_suggesting() {
        writeln!(writer, "Suggestion: pending")?;
        return Ok(());
    }
    match session.suggestion() {
        SuggestionState::Ready(suggestion) => writeln!(
            writer,
            "Suggestion: {} ({} confidence)",
            suggestion.category, suggestion.confidence
        )?,
        SuggestionState::Failed(message) => writeln!(writer, "Suggestion: failed ({message})")?,
        SuggestionState::Idle | SuggestionState::Pending => writeln!(writer, "Suggestion: none")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::future::Future;
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use insta::assert_snapshot;
    use ts_core::{
        CategorizeRequest, CategorySuggestion, FixedClock, IntervalTickSource, ManualTickSource,
        MemoryStorage, SequentialIds,
    };

    use crate::commands::util::fakes::StubCategorizer;

    /// Categorizer that answers after a delay on the tokio clock.
    struct SlowCategorizer {
        delay: Duration,
    }

    impl Categorizer for SlowCategorizer {
        type Error = String;

        fn categorize(
            &self,
            _request: &CategorizeRequest,
        ) -> impl Future<Output = Result<CategorySuggestion, Self::Error>> + Send {
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                CategorySuggestion::new("Client Meeting", 0.9).map_err(|err| err.to_string())
            }
        }
    }

    type TestStore = Store<MemoryStorage, SequentialIds, FixedClock>;

    fn store() -> TestStore {
        let now: DateTime<Utc> = "2025-03-01T10:00:00Z".parse().unwrap();
        Store::open_with(MemoryStorage::new(), SequentialIds::new("cat"), FixedClock(now)).unwrap()
    }

    async fn run_script(
        script: &str,
        session: &mut Session<ManualTickSource>,
        store: &mut TestStore,
        categorizer: Option<&StubCategorizer>,
    ) -> String {
        let mut output = Vec::new();
        run_session(script.as_bytes(), &mut output, session, store, categorizer)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("  START "), Command::Start);
        assert_eq!(
            Command::parse("category Client Meeting"),
            Command::Category(Some("Client Meeting".to_string()))
        );
        assert_eq!(Command::parse("category"), Command::Category(None));
        assert_eq!(
            Command::parse("describe  fixing the  parser "),
            Command::Describe("fixing the  parser".to_string())
        );
        assert_eq!(Command::parse("describe"), Command::Describe(String::new()));
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("dance"), Command::Unknown("dance".to_string()));
    }

    #[tokio::test]
    async fn describe_status_and_log() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());
        session.set_elapsed(65);

        let output = run_script(
            "describe kata practice\nstatus\nlog\nstatus\nquit\n",
            &mut session,
            &mut store,
            None,
        )
        .await;

        assert_snapshot!(output, @r"
        TrackStar session. Type 'help' for commands.
        Category: Python Development
        Description set.
        Timer: 00:01:05 (idle)
        Category: Python Development
        Description: kata practice
        Suggestion: none
        Logged 1m 5s to Python Development.
        Timer: 00:00:00 (idle)
        Category: Python Development
        Description: (none)
        Suggestion: none
        Bye.
        ");

        let entry = &store.entries()[0];
        assert_eq!(entry.duration_seconds, 65);
        assert_eq!(entry.description.as_deref(), Some("kata practice"));
        assert_eq!(entry.category_id.as_str(), "cat-1");
    }

    #[tokio::test]
    async fn log_with_empty_timer_is_rejected() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());

        let output = run_script("log\n", &mut session, &mut store, None).await;

        assert!(output.contains("Error: timer is empty"));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn start_pause_and_quit_release_the_ticker() {
        let mut store = store();
        let source = ManualTickSource::new();
        let mut session = Session::new(source.clone());

        let output = run_script("start\nstart\npause\npause\nstart\n", &mut session, &mut store, None).await;

        assert_snapshot!(output, @r"
        TrackStar session. Type 'help' for commands.
        Category: Python Development
        Timer started at 00:00:00.
        Timer is already running.
        Timer paused at 00:00:00.
        Timer is not running.
        Timer started at 00:00:00.
        Bye.
        ");
        assert_eq!(source.started(), 2);
        assert_eq!(source.live(), 0);
    }

    #[tokio::test]
    async fn suggest_then_use_selects_category() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());
        session.set_elapsed(1800);
        let categorizer = StubCategorizer::ok("client meeting", 0.9);

        let output = run_script(
            "describe weekly sync\nsuggest\nuse\nlog\n",
            &mut session,
            &mut store,
            Some(&categorizer),
        )
        .await;

        assert_snapshot!(output, @r"
        TrackStar session. Type 'help' for commands.
        Category: Python Development
        Description set.
        Asking Claude about 00:30:00...
        Suggested category: client meeting (90% confidence)
        Type 'use' to select it.
        Selected category Client Meeting.
        Logged 30m to Client Meeting.
        Bye.
        ");
        let requests = categorizer.requests();
        assert_eq!(requests[0].description.as_deref(), Some("weekly sync"));
    }

    #[tokio::test]
    async fn suggestion_for_missing_category_is_not_applied() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());
        session.set_elapsed(600);
        let categorizer = StubCategorizer::ok("Gardening", 0.7);

        let output = run_script("suggest\nuse\n", &mut session, &mut store, Some(&categorizer)).await;

        assert!(output.contains("No category named \"Gardening\" exists; create it or choose another."));
        assert!(output.contains(
            "Error: suggested category \"Gardening\" doesn't exist; create it or choose another"
        ));
        assert_eq!(session.selected().map(|id| id.as_str()), Some("cat-1"));
    }

    #[tokio::test]
    async fn suggest_failure_and_missing_key() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());
        session.set_elapsed(60);
        let categorizer = StubCategorizer::failing("timed out");

        let output = run_script("suggest\n", &mut session, &mut store, Some(&categorizer)).await;
        assert!(output.contains("Error: failed to get a category suggestion: timed out"));

        let output = run_script("suggest\n", &mut session, &mut store, None::<&StubCategorizer>).await;
        assert!(output.contains("suggestions need a Claude API key"));
    }

    #[tokio::test]
    async fn category_selection_and_unknown_commands() {
        let mut store = store();
        let mut session = Session::new(ManualTickSource::new());
        session.set_elapsed(5);

        let output = run_script(
            "category binge watching\ncategory Gardening\nfly\n",
            &mut session,
            &mut store,
            None,
        )
        .await;

        assert_snapshot!(output, @r"
        TrackStar session. Type 'help' for commands.
        Category: Python Development
        Selected category Binge Watching.
        Error: category not found: Gardening
        Unknown command 'fly'. Type 'help' for commands.
        Discarding 00:00:05 of unlogged time.
        Bye.
        ");
        assert_eq!(session.selected().map(|id| id.as_str()), Some("cat-4"));
    }

    #[tokio::test(start_paused = true)]
    async fn seconds_elapsed_during_a_suggestion_are_logged() {
        let mut store = store();
        let mut session = Session::new(IntervalTickSource);
        session.set_elapsed(10);
        let categorizer = SlowCategorizer {
            delay: Duration::from_secs(5),
        };

        let mut output = Vec::new();
        run_session(
            "start\nsuggest\nlog\n".as_bytes(),
            &mut output,
            &mut session,
            &mut store,
            Some(&categorizer),
        )
        .await
        .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Logged 15s to Python Development."), "{output}");
        assert_eq!(store.entries()[0].duration_seconds, 15);
    }
}
