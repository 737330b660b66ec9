use anyhow::{Context, Result};
use tracing::debug;

use library_sort::{ConfigManager, Output, logging, sort, verify};

fn main() -> Result<()> {
    let config = ConfigManager::load_config().context("Failed to load configuration")?;

    logging::init_logger(config.output.verbose);
    debug!(?config, "Loaded configuration");

    let output = Output::from_config(&config.output);
    let (input_path, output_path) = (&config.files.input, &config.files.output);

    if sort(input_path, output_path, &output) {
        verify(input_path, output_path, &output);
    }

    Ok(())
}
