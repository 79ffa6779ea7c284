use clap::Parser;
use console::style;
use cryptoscope::assistant::{AssistantContext, CryptoAssistant};
use cryptoscope::cli::{Args, Command};
use cryptoscope::client::HttpBackend;
use cryptoscope::config::Config;
use cryptoscope::pipeline::PipelineSequencer;
use cryptoscope::presenter::{Tab, UiAction};
use cryptoscope::reporter::{HtmlReporter, TerminalRenderer};
use cryptoscope::resolver::NavigationContext;
use cryptoscope::storage::{load_envelope, FileScope};
use cryptoscope::ui::{typing_indicator, PipelineTerminalUI};
use cryptoscope::upload::UploadFlow;
use cryptoscope::{ResultPresenter, ScopeResult};
use env_logger::Env;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

fn display_banner(fast: bool) {
    let user = whoami::username();
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string());
    let platform = format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH);

    println!();
    println!("     \x1b[38;5;51m ██████╗██████╗ ██╗   ██╗██████╗ ████████╗ ██████╗ \x1b[0m");
    println!("     \x1b[38;5;45m██╔════╝██╔══██╗╚██╗ ██╔╝██╔══██╗╚══██╔══╝██╔═══██╗\x1b[0m");
    println!("     \x1b[38;5;39m██║     ██████╔╝ ╚████╔╝ ██████╔╝   ██║   ██║   ██║\x1b[0m");
    println!("     \x1b[38;5;33m██║     ██╔══██╗  ╚██╔╝  ██╔═══╝    ██║   ██║   ██║\x1b[0m");
    println!("     \x1b[38;5;27m╚██████╗██║  ██║   ██║   ██║        ██║   ╚██████╔╝\x1b[0m");
    println!("     \x1b[38;5;21m ╚═════╝╚═╝  ╚═╝   ╚═╝   ╚═╝        ╚═╝    ╚═════╝ \x1b[0m");
    println!();
    println!("              \x1b[3;38;5;147m\"See the crypto inside the binary\"\x1b[0m");
    println!();

    println!("    \x1b[38;5;240m┌─ SYSTEM INFO ─────────────────────────────────────┐\x1b[0m");
    for (label, value) in [
        ("User", user.as_str()),
        ("Host", host.as_str()),
        ("Platform", platform.as_str()),
        ("Version", env!("CARGO_PKG_VERSION")),
    ] {
        println!(
            "    \x1b[38;5;240m│\x1b[0m ◉ {:<10}\x1b[38;5;145m{:<37}\x1b[0m\x1b[38;5;240m│\x1b[0m",
            label, value
        );
    }
    println!("    \x1b[38;5;240m└───────────────────────────────────────────────────┘\x1b[0m");
    println!();

    if !fast {
        std::thread::sleep(Duration::from_millis(300));
    }
}

async fn show_dashboard(
    args: &Args,
    backend: &HttpBackend,
    session: &FileScope,
    ctx: NavigationContext,
    tab: Tab,
    graph: bool,
    html: Option<&PathBuf>,
) -> ScopeResult<()> {
    let sequencer = if args.fast {
        PipelineSequencer::default().with_time_scale(0.0)
    } else {
        PipelineSequencer::default()
    };
    let presenter = ResultPresenter::new(backend, session, sequencer);

    let mut state = {
        let mut ui = PipelineTerminalUI::new(args.quiet);
        let mut rng = rand::thread_rng();
        presenter.present(&ctx, &mut ui, &mut rng).await
    };

    state.apply(UiAction::SelectTab(tab));
    if graph {
        state.apply(UiAction::ToggleView);
    }

    TerminalRenderer::new().render(&mut std::io::stdout().lock(), &state)?;

    if let Some(path) = html {
        let written = HtmlReporter::new().generate_report(&state.view, path)?;
        println!(
            "    {} HTML report generated: {}",
            style("▶").green(),
            style(written.display()).white().bold()
        );
    }
    Ok(())
}

async fn run(args: Args, config: Config) -> ScopeResult<()> {
    let backend = HttpBackend::new(&config)?;
    let session = FileScope::new(config.session_path());
    log::debug!("Session scope at {}", session.path().display());

    match &args.command {
        Command::Show {
            id,
            from,
            query,
            html,
            tab,
            graph,
        } => {
            let ctx = match query {
                Some(query) => NavigationContext::from_query(query),
                None => NavigationContext::new(id.clone(), from.clone()),
            };
            show_dashboard(&args, &backend, &session, ctx, *tab, *graph, html.as_ref()).await
        }

        Command::Submit { file, html } => {
            let mut flow = UploadFlow::new(config.max_upload_bytes());
            let selected = flow.select(file)?;
            println!(
                "    {} Analyzing {} ({:.2} MB)",
                style("▶").cyan(),
                style(&selected.name).white().bold(),
                selected.size as f64 / (1024.0 * 1024.0)
            );

            let outcome = flow.submit(&backend, &session).await?;
            log::info!(
                "Result cached for {} at {:?}",
                outcome.envelope.filename,
                outcome.envelope.timestamp
            );

            show_dashboard(
                &args,
                &backend,
                &session,
                NavigationContext::default(),
                Tab::Overview,
                false,
                html.as_ref(),
            )
            .await
        }

        Command::Ask { message } => {
            let context = AssistantContext::from_envelope(load_envelope(&session).as_ref());
            let mut assistant = CryptoAssistant::new();
            let message = message.join(" ");

            if !args.fast {
                let indicator = typing_indicator(args.quiet);
                let delay = rand::thread_rng().gen_range(1500..2500);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                indicator.finish_and_clear();
            }

            if let Some(reply) = assistant.ask(&message, &context) {
                TerminalRenderer::new().render_reply(&mut std::io::stdout().lock(), &reply)?;
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if !args.quiet {
        display_banner(args.fast);
    }

    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    log::debug!("cryptoscope starting with args: {:?}", args);

    let mut config = Config::from_env();
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(session) = &args.session {
        config.session = session.clone();
    }

    if let Err(e) = run(args, config).await {
        eprintln!("    {} {}", style("✗").red().bold(), style(&e).red());
        std::process::exit(1);
    }
}
