fn main() -> anyhow::Result<()> {
    wawata::Cli::run()
}
