use clap::Parser;
use clap::error::ErrorKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;
use zen_cli::cli::{Cli, Command, collect_overrides};
use zen_cli::render;
use zen_core::assistant::Assistant;
use zen_core::config::{
    Config, Palette, load_config_with_fallback, merge_overrides, palette_for_theme,
};
use zen_core::error::AppError;
use zen_core::locale::{self, Language, Message};
use zen_core::model::Task;
use zen_core::session::{CommitOutcome, Session};
use zen_core::storage::json_store;
use zen_core::store::{NewTask, StatusFilter, TaskFilter, TaskPatch};
use zen_core::surface::{
    ChatSurface, SubmitOutcome, VoiceOutcome, VoiceSurface, recognizer_from_config,
};
use zen_core::task_api;

const CHAT_HELP: &str = "\
Type a request in plain words, for example \"add buy eggs high priority\".
  /list              show tasks in the current view
  /filter <bucket>   all, active or completed
  /lang              switch between English and Urdu
  /voice             capture one spoken command
  /history           show this conversation
  help, ?            show this help
  exit, quit         leave";

/// Settings resolved once per invocation.
struct Runtime {
    config: Config,
    language: Language,
    palette: Palette,
    assistant: Assistant,
    json: bool,
}

impl Runtime {
    fn load(cli: &Cli) -> Result<Self, AppError> {
        let loaded = load_config_with_fallback();
        if let Some(err) = loaded.error {
            eprintln!("WARNING: {err}; using default configuration");
        }
        let overrides = collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
        let config = merge_overrides(&loaded.config, &overrides);

        Ok(Self {
            language: cli.lang.or(config.language).unwrap_or_default(),
            palette: palette_for_theme(config.theme.as_deref()),
            assistant: Assistant::from_config(&config, cli.offline),
            json: cli.json,
            config,
        })
    }

    fn session(&self) -> Result<Session, AppError> {
        let paths = json_store::store_paths()?;
        Ok(Session::restore(paths)?.with_language(self.language))
    }

    fn print_task(&self, verb: &str, task: &Task) {
        if self.json {
            println!("{}", render::task_json(task));
        } else {
            println!("{verb} task: {} ({})", task.title, task.id);
        }
    }

    fn print_reply(&self, reply: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "reply": reply }));
        } else {
            println!("{}", self.palette.accentize(reply));
        }
    }

    /// Compact listing of the session's current view.
    fn print_view(&self, session: &Session) {
        let tasks = session.store.view(&session.filter);
        if tasks.is_empty() {
            let message = if session.filter.search.is_empty() {
                Message::NoTasks
            } else {
                Message::NoMatches
            };
            println!("{}", locale::text(session.language, message));
        } else {
            println!("{}", render::tasks_compact(&tasks, &self.palette));
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn non_empty(tags: Vec<String>) -> Option<Vec<String>> {
    (!tags.is_empty()).then_some(tags)
}

async fn run_command(command: Command, runtime: &Runtime) -> Result<(), AppError> {
    tracing::debug!(?command, language = %runtime.language, "running command");
    match command {
        Command::Login { name, email } => {
            let user = task_api::login(&name, &email)?;
            if runtime.json {
                println!("{}", render::user_json(&user));
            } else {
                println!("Logged in as {} <{}>", user.name, user.email);
            }
        }
        Command::Logout => {
            let user = task_api::logout()?;
            if runtime.json {
                println!("{}", render::user_json(&user));
            } else {
                println!("Logged out {}", user.email);
            }
        }
        Command::Whoami => {
            let user = task_api::current_user()?;
            if runtime.json {
                println!("{}", render::user_json(&user));
            } else {
                println!("{} <{}>", user.name, user.email);
            }
        }
        Command::Add {
            title,
            description,
            priority,
            tags,
            due,
            recurring,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let task = task_api::add_task(NewTask {
                title,
                description,
                priority: priority.unwrap_or_default(),
                tags,
                due_date: due,
                recurring,
            })?;
            runtime.print_task("Added", &task);
        }
        Command::List { filter, search } => {
            let filter = TaskFilter {
                status: filter,
                search: search.unwrap_or_default().trim().to_string(),
            };
            let tasks = task_api::list_tasks(&filter)?;
            if runtime.json {
                println!("{}", render::tasks_json(&tasks));
            } else if tasks.is_empty() {
                let message = if filter.search.is_empty() {
                    Message::NoTasks
                } else {
                    Message::NoMatches
                };
                println!("{}", locale::text(runtime.language, message));
            } else {
                println!("{}", render::tasks_table(&tasks));
            }
        }
        Command::Show { id } => {
            let task = task_api::get_task_by_id(&id)?;
            if runtime.json {
                println!("{}", render::task_json(&task));
            } else {
                println!("{}", render::task_detail(&task, &runtime.palette));
            }
        }
        Command::Toggle { id } => {
            let task = task_api::toggle_task(&id)?;
            let verb = if task.completed { "Completed" } else { "Reopened" };
            runtime.print_task(verb, &task);
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            tags,
            due,
            recurring,
        } => {
            let task = task_api::edit_task(
                &id,
                TaskPatch {
                    title,
                    description,
                    priority,
                    tags: non_empty(tags),
                    due_date: due,
                    recurring,
                },
            )?;
            runtime.print_task("Updated", &task);
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(&id)?;
            runtime.print_task("Deleted", &task);
        }
        Command::Recur => {
            let rolled = task_api::roll_recurring_tasks()?;
            if runtime.json {
                println!("{}", render::tasks_json(&rolled));
            } else {
                println!("Rescheduled {} recurring task(s)", rolled.len());
                for task in &rolled {
                    println!(
                        "  {} ({}) due {}",
                        task.title,
                        task.id,
                        task.due_date.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Command::Say { utterance } => {
            let mut session = runtime.session()?;
            let utterance = utterance.join(" ");
            let before = session.filter.clone();
            let CommitOutcome::Applied(reply) =
                runtime.assistant.handle(&mut session, &utterance).await
            else {
                return Ok(());
            };

            // One-shot session: a changed view is shown right away.
            let view_changed = session.filter != before;
            if runtime.json && view_changed {
                let tasks = session.store.view(&session.filter);
                println!(
                    "{}",
                    serde_json::json!({ "reply": reply, "tasks": render::tasks_json(&tasks) })
                );
            } else {
                runtime.print_reply(&reply);
                if view_changed {
                    runtime.print_view(&session);
                }
            }
        }
        Command::Ask { question } => {
            let reply = runtime
                .assistant
                .ask(&question.join(" "), runtime.language)
                .await;
            runtime.print_reply(&reply);
        }
        Command::Voice => {
            let session = Mutex::new(runtime.session()?);
            let voice = VoiceSurface::new(recognizer_from_config(&runtime.config.stt_command));
            run_voice(&voice, &session, runtime).await;
        }
        Command::Chat => run_chat(runtime).await?,
    }

    Ok(())
}

async fn run_voice(voice: &VoiceSurface, session: &Mutex<Session>, runtime: &Runtime) {
    let language = session.lock().await.language;
    if !voice.is_available() {
        runtime.print_reply(locale::text(language, Message::VoiceDisabled));
        return;
    }
    eprintln!("{}", VoiceSurface::listening_status(language));

    match voice.capture(&runtime.assistant, session).await {
        VoiceOutcome::Heard { status, reply } => {
            println!("{}", runtime.palette.mutedize(&status));
            if let CommitOutcome::Applied(reply) = reply {
                runtime.print_reply(&reply);
            }
        }
        VoiceOutcome::Notice(message) | VoiceOutcome::Failed(message) => {
            runtime.print_reply(&message)
        }
        VoiceOutcome::Unavailable => {
            runtime.print_reply(locale::text(language, Message::VoiceDisabled))
        }
        VoiceOutcome::Busy | VoiceOutcome::Silent => {}
    }
}

async fn run_chat(runtime: &Runtime) -> Result<(), AppError> {
    let session = Mutex::new(runtime.session()?);
    let chat = ChatSurface::new();
    let voice = VoiceSurface::new(recognizer_from_config(&runtime.config.stt_command));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !runtime.json {
        println!("{}", runtime.palette.mutedize("Type help for commands, exit to quit."));
    }

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            println!("{CHAT_HELP}");
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(head, rest)| (head, rest.trim())) {
            ("/list", _) => {
                let guard = session.lock().await;
                if runtime.json {
                    let tasks = guard.store.view(&guard.filter);
                    println!("{}", render::tasks_json(&tasks));
                } else {
                    runtime.print_view(&guard);
                }
            }
            ("/filter", bucket) => match bucket.parse::<StatusFilter>() {
                Ok(status) => {
                    session.lock().await.filter.status = status;
                    println!("Showing {} tasks", status.as_str());
                }
                Err(err) => eprintln!("ERROR: {}", AppError::invalid_input(err)),
            },
            ("/lang", _) => {
                let mut guard = session.lock().await;
                guard.language = guard.language.toggled();
                println!("Language: {}", guard.language);
            }
            ("/voice", _) => run_voice(&voice, &session, runtime).await,
            ("/history", _) => {
                println!("{}", render::transcript(&chat.transcript(), &runtime.palette))
            }
            _ => match chat.submit(&runtime.assistant, &session, line).await {
                SubmitOutcome::Replied(reply) => runtime.print_reply(&reply),
                SubmitOutcome::Busy => eprintln!("Still working on the previous request."),
                SubmitOutcome::Ignored | SubmitOutcome::Superseded => {}
            },
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let runtime = match Runtime::load(&cli) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Command::Chat);
    if let Err(err) = run_command(command, &runtime).await {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
