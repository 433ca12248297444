#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = akademika::run().await {
        eprintln!("akademika fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
