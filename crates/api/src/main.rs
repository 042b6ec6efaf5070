mod application;
mod handlers;
mod pipeline;
mod rates;
mod seed;
mod state;
mod tasks;


use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(err) = application::run().await {
        eprintln!("[carmarket] bootstrap failed: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}
