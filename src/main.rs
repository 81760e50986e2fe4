fn main() -> anyhow::Result<()> {
    contract_engine::cli::run_cli()
}
