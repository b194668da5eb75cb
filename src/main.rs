use clap::Parser;
use miette::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use formgate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` ends quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let level = if global.verbose {
        "debug".to_string()
    } else {
        std::env::var("FORMGATE_LOG").unwrap_or_else(|_| "warn".to_string())
    };
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::List => formgate::cli::commands::list::run(&global),
        Commands::Show(args) => formgate::cli::commands::show::run(args, &global),
        Commands::Schema(args) => formgate::cli::commands::schema::run(args, &global),
        Commands::Fill(args) => formgate::cli::commands::fill::run(args, &global),
        Commands::Submit(args) => formgate::cli::commands::submit::run(args, &global),
        Commands::Config(cmd) => formgate::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => formgate::cli::commands::completions::run(args),
    }
}
