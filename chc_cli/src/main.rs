use std::{fs::write, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use chc_core::{holiday_client, holiday_client::Config, ical::generator::Emitter};
use clap::Parser;

#[derive(Debug, Parser)]
pub struct Arguments {
    /// the holiday observances page
    #[arg(long, default_value = holiday_client::URL)]
    pub url: String,
    /// how many years around the page's modification year are searched
    #[arg(
        long,
        default_value_t = chc_core::year::DEFAULT_YEAR_WINDOW,
        value_parser = clap::value_parser!(u16)
    )]
    pub year_window: u16,
    /// write the calendar to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl From<&Arguments> for Config {
    fn from(value: &Arguments) -> Self {
        Config {
            url: value.url.clone(),
            year_window: value.year_window,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Arguments::parse();
    let calendar = holiday_client::get(&Config::from(&args)).await?;
    let text = calendar.generate();
    match &args.output {
        Some(path) => {
            write(path, text).with_context(|| format!("could not write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => std::io::stdout().lock().write_all(text.as_bytes())?,
    }
    Ok(())
}
