use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::batch::{BatchReport, check_destination};
use crate::cli::Args;
use crate::config::Settings;
use crate::convert::{AudioFormat, Capabilities, ConversionChain, FormatPolicy};
use crate::library::discover;

mod event_loop;
mod headless;
mod logging;
mod settings;
mod startup;

/// Every planned file converted.
pub const EXIT_OK: u8 = 0;
/// Startup precondition or batch-level failure.
pub const EXIT_FATAL: u8 = 1;
/// Finished with per-file failures, or stopped early.
pub const EXIT_INCOMPLETE: u8 = 2;

fn exit_code_for(report: Option<&BatchReport>) -> u8 {
    match report {
        Some(r) if r.is_full_success() => EXIT_OK,
        _ => EXIT_INCOMPLETE,
    }
}

fn destination_root(args: &Args, settings: &Settings) -> anyhow::Result<PathBuf> {
    match args.output.clone().or_else(|| settings.convert.output_dir.clone()) {
        Some(p) => Ok(p),
        None => env::current_dir().context("cannot determine the current directory"),
    }
}

pub fn run(args: Args) -> anyhow::Result<ExitCode> {
    let settings = settings::load_settings();

    if args.print_config {
        print!("{}", settings.to_toml().context("failed to render settings")?);
        return Ok(ExitCode::from(EXIT_OK));
    }

    let Some(input) = args.input.clone() else {
        bail!("no input file or folder given");
    };

    logging::init(&settings.log, args.headless);

    let caps = Capabilities::probe(&settings.backends).context("cannot convert audio")?;
    let warnings = startup::announce_capabilities(&caps);

    let files = discover(&input, &settings.library).context("cannot read input")?;
    if files.is_empty() {
        bail!(
            "no files with extension(s) {:?} under {}",
            settings.library.extensions,
            input.display()
        );
    }

    let destination = destination_root(&args, &settings)?;
    check_destination(&destination)?;

    let chain = ConversionChain::new(
        caps.build_converters(&settings),
        FormatPolicy {
            target: AudioFormat::Mp3,
            accept_fallback: settings.convert.accept_fallback_format,
        },
    );

    if args.headless {
        for w in &warnings {
            eprintln!("oggshift: warning: {w}");
        }
        let report = headless::run(&files, &chain, &destination)?;
        return Ok(ExitCode::from(exit_code_for(Some(&report))));
    }

    let mut app = App::new(files, input, destination);
    let autostart = startup::apply_startup(&mut app, &caps, args.yes);
    let mut state = event_loop::EventLoopState::new(chain);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if autostart {
        event_loop::start_batch(&mut app, &mut state);
    }

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut state);
    // The loop may have bailed on a terminal error with the worker still going.
    event_loop::shutdown(&mut app, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result?;

    if let Some(reason) = &app.aborted {
        bail!("batch aborted: {reason}");
    }
    if let Some(report) = &app.report {
        for line in report.summary_lines() {
            println!("{line}");
        }
    }
    info!(state = app.state.label(), "exiting");
    Ok(ExitCode::from(exit_code_for(app.report.as_ref())))
}
