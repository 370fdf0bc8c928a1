mod labels;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use japa_core::*;
use labels::labels;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "japa")]
#[command(about = "Mantra repetition (japa) counter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretend the current day is this date (YYYY-MM-DD), for testing
    #[arg(long, global = true, hide = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// List mantras with their counts (default)
    List,

    /// Add a new mantra
    Add {
        /// Text of the mantra
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Delete a mantra by list position or id
    Delete {
        mantra: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Select the mantra that tap/back/reset act on
    Select { mantra: String },

    /// Count one or more beads
    Tap {
        /// Mantra (list position or id); defaults to the selected one
        #[arg(long)]
        mantra: Option<String>,

        /// Number of taps
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Undo the last bead of the current mala
    Back {
        #[arg(long)]
        mantra: Option<String>,
    },

    /// Restart the current mala from bead 0
    Reset {
        #[arg(long)]
        mantra: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Toggle the completion sound
    Sound,

    /// Set display language (en, hi)
    Lang { language: Language },

    /// Export per-mantra statistics to CSV
    Export { path: PathBuf },
}

/// Local clock unless a day was forced on the command line
struct CliClock {
    fixed: Option<NaiveDate>,
}

impl Clock for CliClock {
    fn today(&self) -> NaiveDate {
        self.fixed.unwrap_or_else(|| LocalClock.today())
    }
}

/// Rings the terminal bell when a mala completes
struct TerminalBell {
    enabled: bool,
}

impl CycleFeedback for TerminalBell {
    fn cycle_completed(&mut self, mantra: &Mantra, sound_enabled: bool) {
        tracing::debug!("Bell for {}", mantra.name);
        if self.enabled && sound_enabled {
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }
    }
}

type Session = JapaSession<JsonFileStore, CliClock, TerminalBell>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    japa_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut session = JapaSession::open(
        JsonFileStore::in_dir(&data_dir),
        CliClock { fixed: cli.today },
        TerminalBell {
            enabled: config.feedback.terminal_bell,
        },
    );

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => {
            print_mantras(session.state());
            Ok(())
        }
        Commands::Add { name } => cmd_add(&mut session, &name.join(" ")),
        Commands::Delete { mantra, yes } => cmd_delete(&mut session, &mantra, yes),
        Commands::Select { mantra } => {
            let id = resolve_mantra(session.state(), Some(&mantra))?;
            session.dispatch(Action::SelectMantra(id));
            print_mantras(session.state());
            Ok(())
        }
        Commands::Tap { mantra, count } => cmd_tap(&mut session, mantra.as_deref(), count),
        Commands::Back { mantra } => {
            let id = resolve_mantra(session.state(), mantra.as_deref())?;
            session.dispatch(Action::StepBack(id.clone()));
            print_status(session.state(), &id);
            Ok(())
        }
        Commands::Reset { mantra, yes } => cmd_reset(&mut session, mantra.as_deref(), yes),
        Commands::Sound => {
            session.dispatch(Action::ToggleSound);
            let l = labels(session.state().language);
            println!(
                "{}",
                if session.state().sound_enabled {
                    l.sound_on
                } else {
                    l.sound_off
                }
            );
            Ok(())
        }
        Commands::Lang { language } => {
            session.dispatch(Action::SetLanguage(language));
            println!("{}", labels(language).language_set);
            Ok(())
        }
        Commands::Export { path } => {
            let rows = write_stats_csv(session.state(), &path)?;
            println!("✓ Exported {} mantras to {}", rows, path.display());
            Ok(())
        }
    }
}

fn cmd_add(session: &mut Session, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Other("mantra name must not be empty".into()));
    }

    session.dispatch(Action::CreateMantra {
        name: name.to_string(),
    });
    let state = session.state();
    println!("{}: {} ({})", labels(state.language).added, state.mantras[0].name, state.mantras[0].id);
    Ok(())
}

fn cmd_delete(session: &mut Session, mantra: &str, yes: bool) -> Result<()> {
    let id = resolve_mantra(session.state(), Some(mantra))?;
    let l = labels(session.state().language);

    if !yes && !confirm(l.confirm_delete)? {
        println!("{}", l.cancelled);
        return Ok(());
    }

    session.dispatch(Action::DeleteMantra(id.clone()));
    println!("{}: {}", l.deleted, id);
    Ok(())
}

fn cmd_tap(session: &mut Session, mantra: Option<&str>, count: u32) -> Result<()> {
    let id = resolve_mantra(session.state(), mantra)?;

    for _ in 0..count {
        let result = session.dispatch(Action::Tap(id.clone()));
        if result.cycle_completed {
            println!("🔔 {}", labels(session.state().language).mala_complete);
        }
    }

    print_status(session.state(), &id);
    Ok(())
}

fn cmd_reset(session: &mut Session, mantra: Option<&str>, yes: bool) -> Result<()> {
    let id = resolve_mantra(session.state(), mantra)?;
    let l = labels(session.state().language);

    if !yes && !confirm(l.confirm_reset)? {
        println!("{}", l.cancelled);
        return Ok(());
    }

    session.dispatch(Action::ResetCurrentCycle(id.clone()));
    println!("{}", l.reset_done);
    print_status(session.state(), &id);
    Ok(())
}

/// Find a mantra by 1-based list position or id, or fall back to the selection
fn resolve_mantra(state: &AppState, arg: Option<&str>) -> Result<MantraId> {
    let Some(arg) = arg else {
        return state
            .selected_mantra()
            .map(|m| m.id.clone())
            .ok_or_else(|| {
                Error::Other("no mantra selected; use `japa select <mantra>` or --mantra".into())
            });
    };

    if let Ok(position) = arg.parse::<usize>() {
        if let Some(mantra) = position.checked_sub(1).and_then(|i| state.mantras.get(i)) {
            return Ok(mantra.id.clone());
        }
    }

    let id = MantraId::from(arg);
    if state.contains(&id) {
        Ok(id)
    } else {
        Err(Error::Other(format!("no mantra matches '{}'", arg)))
    }
}

fn print_mantras(state: &AppState) {
    let l = labels(state.language);
    if state.mantras.is_empty() {
        println!("{}", l.no_mantras);
        return;
    }

    for (i, mantra) in state.mantras.iter().enumerate() {
        let marker = if state.selected_mantra_id.as_ref() == Some(&mantra.id) {
            format!("  ← {}", l.selected)
        } else {
            String::new()
        };
        println!("{:>3}. {}{}", i + 1, mantra.name, marker);
        println!("     {}", stats_line(mantra, state.language));
    }
}

fn print_status(state: &AppState, id: &MantraId) {
    if let Some(mantra) = state.mantra(id) {
        println!("{}", mantra.name);
        println!("  {}", stats_line(mantra, state.language));
    }
}

fn stats_line(mantra: &Mantra, language: Language) -> String {
    let l = labels(language);
    format!(
        "[{}/{}] {:>3.0}%  {}: {} ({} {})  {}: {} ({} {})",
        mantra.current_step,
        CYCLE_LENGTH,
        mantra.progress() * 100.0,
        l.today,
        mantra.today_count,
        mantra.today_cycles,
        l.malas,
        l.lifetime,
        mantra.lifetime_count,
        mantra.lifetime_cycles,
        l.malas
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
