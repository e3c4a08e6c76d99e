fn main() -> anyhow::Result<()> {
    md3kit::cli::run_cli()
}
