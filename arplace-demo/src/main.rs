mod scenario;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = scenario::Options::from_args(std::env::args().skip(1))?;
    scenario::run(&options)
}
