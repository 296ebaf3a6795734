use std::fs;
use std::path::Path;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use card_dealer::services;
use card_dealer::settings;

#[derive(Parser)]
#[command(version, about = "Reward card distribution service", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();

    init_logging(&args.log4rs).expect("Failed to initialize logging.");

    let config = settings::Settings::new(&args.config).expect("Could not load config file.");
    let conn = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.postgres.url)
        .await
        .expect("Could not connect to database.");

    sqlx::migrate!()
        .run(&conn)
        .await
        .expect("Could not run database migrations.");

    println!("[*] Starting services.");
    services::start_services(conn, config)
        .await
        .expect("Could not start services.");
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
