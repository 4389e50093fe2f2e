use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(err) = jx_api::run().await {
        error!(error = %err, "jx-api exited with an error");
        std::process::exit(1);
    }
}
