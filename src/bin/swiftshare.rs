fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match swiftshare::cli::parse_args(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!();
            swiftshare::cli::print_usage();
            std::process::exit(2);
        }
    };

    init_logging(invocation.verbosity);

    if swiftshare::cli::run(invocation).await.is_err() {
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    init_logging(0);
    eprintln!("CLI support not compiled in");
    std::process::exit(1);
}
