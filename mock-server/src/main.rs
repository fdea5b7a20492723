use loans_stub_server::Stubs;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("stub loans API listening on {addr} (no routes registered)");
    loans_stub_server::run(listener, Stubs::new()).await
}
