use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use teamsplit::{settings::Settings, store::GroupStore};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "teamsplit={level},actix_web={level}",
            level = settings.log.level
        ))
        .init();

    tracing::info!("Using database {}", settings.mongodb.database);
    let store = GroupStore::connect(&settings.mongodb.uri, &settings.mongodb.database).await?;
    tracing::info!("Connected");

    let addr = (settings.server.bind.clone(), settings.server.port);
    tracing::info!("Server listening on {}:{}", addr.0, addr.1);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(store.clone()))
            .configure(teamsplit::routes::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
