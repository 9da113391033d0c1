fn main() -> anyhow::Result<()> {
    bigloca::cli::run_cli()
}
