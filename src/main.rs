// main.rs
use actix_cors::Cors;
use actix_files::Files;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use brightside_backend::auth::SessionStore;
use brightside_backend::config::Config;
use brightside_backend::routes;
use brightside_backend::store::Store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("starting up...");

    let config = Config::from_env();
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        log::error!("cannot create data dir {}: {}", config.data_dir, e);
        std::process::exit(1);
    }

    let bind_addr = config.bind_addr.clone();
    let public_dir = config.public_dir.clone();
    let allowed_origin = config.allowed_origin.clone();

    let store = web::Data::new(Store::new(config.data_dir.clone()));
    let config = web::Data::new(config);
    let sessions = web::Data::new(SessionStore::new());

    log::info!("listening on {}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // forms are small; anything bigger than 64k is not a quote request
        let payload_config = web::PayloadConfig::new(64 * 1024);

        App::new()
            .app_data(config.clone())
            .app_data(store.clone())
            .app_data(sessions.clone())
            .app_data(payload_config)
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes)
            .service(Files::new("/", public_dir.clone()).index_file("index.html"))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
