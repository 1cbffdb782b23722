//! Chat server binary

use parlor::{ServerConfig, ServerManager};

fn print_usage() {
    println!("Usage: parlor [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>    Port to listen on (default: 7777)");
    println!("  --log-packets    Log every handled packet at debug level");
    println!("  --help           Show this help");
}

fn parse_args() -> Result<Option<ServerConfig>, String> {
    let mut config = ServerConfig::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--port requires a value".to_string())?;
                config.port = value
                    .parse()
                    .map_err(|_| format!("invalid port: {}", value))?;
            }
            "--log-packets" => config.log_packets = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown option: {}", other)),
        }
    }
    Ok(Some(config))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = match parse_args() {
        Ok(Some(config)) => config,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {}", err);
            print_usage();
            std::process::exit(1);
        }
    };

    let server = ServerManager::new(config);
    server.run().await?;
    Ok(())
}
