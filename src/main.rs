use jujushell_operator::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("jujushell_operator=info")
        .init();

    Cli::parse().run().await
}
