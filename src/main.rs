use clap::Parser;
use conformance::cli::{run, Cli};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "Uncaught panic");
        eprintln!("{info}");
        std::process::exit(1);
    }));

    if let Err(e) = run::execute(&cli).await {
        error!(error = %e, kind = e.tag(), "Fatal error");
        eprintln!("[{}] {e}", e.tag());
        std::process::exit(1);
    }
}
