//! Binary entry point - delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    citysite_backend::run().await;
}
