use twa_pack::app::{self, Action};
mod cli;

fn print_version() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    let action = match command {
        Some("version") | Some("--version") | Some("-V") => {
            print_version();
            return Ok(());
        }
        Some("help") | Some("--help") | Some("-h") => {
            cli::print_help();
            return Ok(());
        }
        Some(other) => match Action::parse(other) {
            Some(action) => action,
            None => {
                eprintln!(
                    "twa-pack: unknown command `{other}`; use build|init|manifest|configure|doctor"
                );
                std::process::exit(2);
            }
        },
        None => {
            cli::print_help();
            std::process::exit(2);
        }
    };

    let opts = match cli::parse_run_cli(&args[2..]) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("twa-pack: {e}");
            std::process::exit(2);
        }
    };

    twa_pack::logging::init();
    let out = app::run(action, &opts).await;
    println!("{}", serde_json::to_string_pretty(&out)?);
    if let Some(err) = &out.error {
        tracing::error!(code = %err.code, "{}", err.message);
    }
    if !out.ok {
        std::process::exit(1);
    }
    Ok(())
}
