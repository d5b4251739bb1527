use std::net::SocketAddr;
use tokio::net::TcpListener;

use invite::config::Config;
use invite::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = Config::load();
    let pool = invite::db::init_pool(&config.database_url).await?;
    let store = Store::new(pool.clone(), config.remote.clone());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => {
            let Some(file) = args.get(1) else {
                eprintln!("usage: invite import <rsvps.json>");
                std::process::exit(2);
            };
            invite::cli::import_rsvps(&store, file).await?;
            return Ok(());
        }
        Some(other) => {
            eprintln!("unknown command: {other}");
            eprintln!("usage: invite [import <rsvps.json>]");
            std::process::exit(2);
        }
        None => {}
    }

    let app = invite::build_app(pool, store, config.site, config.secure_cookies).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
