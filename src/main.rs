use clap::Parser;
use tokenrelay::cli::{
    Args, build_config, init_logging, load_secrets, load_store, validate_origin,
};
use tokenrelay::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some((access_secret, refresh_secret)) = load_secrets(&args) else {
        std::process::exit(1);
    };

    let Some(origin) = validate_origin(&args.origin) else {
        std::process::exit(1);
    };

    let Some(store) = load_store(args.users_file.as_deref()) else {
        std::process::exit(1);
    };

    let config = build_config(&args, store, &origin, access_secret, refresh_secret);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(
            address = %local_addr,
            rotate_refresh_tokens = config.rotate_refresh_tokens,
            secure_cookies = config.secure_cookies,
            "Listening"
        ),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
