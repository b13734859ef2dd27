use log::LevelFilter;
use simplelog::{ConfigBuilder, SimpleLogger};

pub fn setup_simple_logger() -> anyhow::Result<()> {
    let logger_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .add_filter_allow_str("scripts")
        .build();

    Ok(SimpleLogger::init(LevelFilter::Info, logger_config)?)
}
