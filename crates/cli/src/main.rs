//! # CLI - Bar Store Interactive Shell
//!
//! A REPL over a [`FileStore`] of one-minute price bars. Reads commands from
//! stdin and prints results to stdout; logs go to stderr. Works both
//! interactively and with commands piped in.
//!
//! ## Commands
//!
//! ```text
//! IMPORT sym file.csv       Load bars (id,open,high,low,close,volume per line)
//! READ sym from [through]   Print bars of one date or an inclusive date range
//! DELETE sym date           Remove a date bucket
//! LOOKUP sym date           Index node of a date
//! PREV|NEXT sym date        Index node strictly before / after a date
//! FIRST|LAST sym            Earliest / latest index node
//! BACKFILL sym n [before]   Last n bars of the latest (or an earlier) bucket
//! CHECK sym                 Verify the data file against its index
//! EXIT / QUIT               Leave the shell
//! ```
//!
//! ## Configuration
//!
//! ```text
//! BARSTORE_DATA_DIR   data file directory   (default: "data/bars")
//! BARSTORE_INDEX_DIR  index file directory  (default: "data/index")
//! RUST_LOG            log filter            (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! barstore started (data=data/bars, index=data/index)
//! > IMPORT AAPL aapl.csv
//! OK imported 780 bars across 2 dates
//! > FIRST AAPL
//! 20240102,0,390
//! > CHECK AAPL
//! OK (780 records in 2 blocks)
//! > EXIT
//! bye
//! ```

mod shell;

use anyhow::{Context, Result};
use codec::PriceBarCodec;
use config::StoreConfig;
use filestore::FileStore;
use shell::{Shell, HELP};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = StoreConfig::from_env()?;
    println!(
        "barstore started (data={}, index={})",
        config.data_dir.display(),
        config.index_dir.display()
    );
    let store = FileStore::open(PriceBarCodec, config).context("failed to open store")?;
    let mut shell = Shell::new(store);

    println!("{}", HELP);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        if !shell.execute(&line?, &mut out)? {
            break;
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}
