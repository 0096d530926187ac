mod scrape;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use idds::{browser, extract::Selectors, output};

/// Library codes the portal lists on its landing page. Anything else has no
/// link to click and is rejected before a browser starts.
const LIBRARIES: [&str; 12] = [
    "CAPE", "CCRS", "CIC", "DAD", "HCD", "NACRS", "NRS", "ODB", "OHIP", "OMHRS", "RPDB", "SDS",
];

#[derive(Parser)]
#[command(
    name = "ices-schema",
    version,
    about = "Scrape one dataset's variable schema from the ICES Data Dictionary into a CSV file"
)]
struct Args {
    /// Library code as listed on the portal landing page, e.g. "DAD".
    library: String,

    /// Dataset entry exactly as listed on the library page,
    /// e.g. "a. DADyyyy: Discharge Abstract Database -DAD".
    dataset: String,

    /// Snapshot date stamped into the default output filename
    /// (YYYY-MM-DD, today if omitted).
    #[arg(short, long)]
    date: Option<String>,

    /// Output CSV path; derived from library, dataset and date if omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    headed: bool,
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date {raw:?} ({e}), expected YYYY-MM-DD"))
}

fn default_output(library: &str, dataset: &str, date: NaiveDate) -> PathBuf {
    // Dataset entries carry spaces and colons; neither belongs in a filename.
    let dataset = dataset.replace([' ', ':'], "-");
    PathBuf::from(format!("{library}__{dataset}__{date}.csv"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let args = Args::parse();

    anyhow::ensure!(
        LIBRARIES.contains(&args.library.as_str()),
        "unknown library {:?}, the portal lists: {}",
        args.library,
        LIBRARIES.join(", ")
    );
    let date = match &args.date {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.library, &args.dataset, date));

    tracing::info!(
        target: "schema",
        "library = {}, dataset = {:?}, date = {date}",
        args.library,
        args.dataset,
    );
    tracing::info!(target: "schema", "output = {}, headed = {}", output.display(), args.headed);

    let chrome = browser::launch(args.headed)?;
    let tab = browser::single_tab(&chrome)?;

    let ctx = scrape::Context {
        tab,
        library: args.library,
        dataset: args.dataset,
        sel: Selectors::default(),
    };
    let records = scrape::run(&ctx).await?;

    output::write_csv(&output, &records)?;
    tracing::info!(
        target: "schema",
        "\x1b[36mwrote {} variables to {}\x1b[0m",
        records.len(),
        output.display(),
    );

    Ok(())
}
