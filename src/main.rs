use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gopher_vfs::{GopherSession, OpenOptions, StreamWrapper};

/// Fetch a gopher resource: stream its bytes to stdout, or list it as a menu.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gopher URL to fetch
    url: String,

    /// Treat the URL as a menu and list its entries
    #[arg(long, default_value_t = false)]
    menu: bool,

    /// Print menu entries as JSON (implies --menu)
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let opts = OpenOptions {
        report_errors: true,
        use_path: false,
    };
    let mut session = GopherSession::new();

    if args.menu || args.json {
        session
            .opendir(&args.url, &opts)
            .context("unable to get directory listing")?;

        let mut entries = Vec::new();
        while let Some(entry) = session.readdir() {
            entries.push(entry);
        }
        session.closedir();
        info!(count = entries.len(), "menu retrieved");

        if args.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for entry in &entries {
                println!("{entry}");
            }
        }
    } else {
        session
            .open(&args.url, "rb", &opts)
            .context("unable to open gopher stream")?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        loop {
            let chunk = session.read(8192)?;
            if chunk.is_empty() {
                break;
            }
            out.write_all(&chunk)?;
        }
        session.close();
    }

    Ok(())
}
