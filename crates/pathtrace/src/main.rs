fn main() -> anyhow::Result<()> {
    pathtrace_cli::pathtrace()
}
