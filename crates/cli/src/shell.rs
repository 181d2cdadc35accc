//! Command dispatch for the interactive shell.

use anyhow::{bail, Context, Result};
use codec::{PriceBar, PriceBarCodec};
use filestore::{FileStore, StoreError, WriteOutcome};
use index::IndexNode;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::str::FromStr;

pub const HELP: &str = "\
Commands: IMPORT sym file.csv | READ sym from [through] | DELETE sym date
          LOOKUP|PREV|NEXT sym date | FIRST|LAST sym
          BACKFILL sym n [before] | CHECK sym | EXIT";

pub struct Shell {
    store: FileStore<PriceBarCodec>,
}

impl Shell {
    pub fn new(store: FileStore<PriceBarCodec>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut FileStore<PriceBarCodec> {
        &mut self.store
    }

    /// Runs one command line and writes its response to `out`.
    ///
    /// Returns `false` once the session should end.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(true);
        };
        let args: Vec<&str> = parts.collect();

        let result = match cmd.to_uppercase().as_str() {
            "IMPORT" => self.import(&args, out),
            "READ" => self.read(&args, out),
            "DELETE" => self.delete(&args, out),
            "LOOKUP" => self.node_query(&args, out, |s, sym, d| s.lookup(sym, d)),
            "PREV" => self.node_query(&args, out, |s, sym, d| s.prev(sym, d)),
            "NEXT" => self.node_query(&args, out, |s, sym, d| s.next(sym, d)),
            "FIRST" => self.edge_query(&args, out, |s, sym| s.first(sym)),
            "LAST" => self.edge_query(&args, out, |s, sym| s.last(sym)),
            "BACKFILL" => self.backfill(&args, out),
            "CHECK" => self.check(&args, out),
            "EXIT" | "QUIT" => {
                writeln!(out, "bye")?;
                return Ok(false);
            }
            other => {
                writeln!(out, "unknown command: {}", other)?;
                return Ok(true);
            }
        };

        if let Err(e) = result {
            writeln!(out, "ERR {:#}", e)?;
        }
        Ok(true)
    }

    fn import<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        expect_args(args, 2, 2, "IMPORT sym file.csv")?;
        let (symbol, path) = (args[0], args[1]);

        let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
        let mut by_date: BTreeMap<u64, Vec<PriceBar>> = BTreeMap::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || (i == 0 && line.starts_with("id")) {
                continue;
            }
            let bar = parse_bar(symbol, line).with_context(|| format!("{}:{}", path, i + 1))?;
            by_date.entry(bar.date()).or_default().push(bar);
        }

        let dates = by_date.len();
        let mut bars = 0;
        for (date, records) in by_date {
            bars += records.len();
            self.store.write(symbol, date, records)?;
        }
        writeln!(out, "OK imported {} bars across {} dates", bars, dates)?;
        Ok(())
    }

    fn read<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        expect_args(args, 2, 3, "READ sym from [through]")?;
        let from: u64 = parse_arg(args[1], "from")?;
        let through = match args.get(2) {
            Some(t) => parse_arg(t, "through")?,
            None => from,
        };

        let bars = self.store.read_range(args[0], from, through)?;
        print_bars(out, &bars)
    }

    fn delete<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        expect_args(args, 2, 2, "DELETE sym date")?;
        let date = parse_arg(args[1], "date")?;
        match self.store.write(args[0], date, Vec::new())? {
            WriteOutcome::Skipped => writeln!(out, "(nil)")?,
            _ => writeln!(out, "OK")?,
        }
        Ok(())
    }

    fn node_query<W, F>(&mut self, args: &[&str], out: &mut W, query: F) -> Result<()>
    where
        W: Write,
        F: FnOnce(&mut FileStore<PriceBarCodec>, &str, u64) -> Result<Option<IndexNode>, StoreError>,
    {
        expect_args(args, 2, 2, "LOOKUP|PREV|NEXT sym date")?;
        let date = parse_arg(args[1], "date")?;
        print_node(out, query(&mut self.store, args[0], date)?)
    }

    fn edge_query<W, F>(&mut self, args: &[&str], out: &mut W, query: F) -> Result<()>
    where
        W: Write,
        F: FnOnce(&mut FileStore<PriceBarCodec>, &str) -> Result<Option<IndexNode>, StoreError>,
    {
        expect_args(args, 1, 1, "FIRST|LAST sym")?;
        print_node(out, query(&mut self.store, args[0])?)
    }

    fn backfill<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        expect_args(args, 2, 3, "BACKFILL sym n [before]")?;
        let n = parse_arg(args[1], "n")?;
        let before = args.get(2).map(|b| parse_arg(b, "before")).transpose()?;

        let bars = self.store.backfill(args[0], n, before)?;
        print_bars(out, &bars)
    }

    fn check<W: Write>(&mut self, args: &[&str], out: &mut W) -> Result<()> {
        expect_args(args, 1, 1, "CHECK sym")?;
        let report = self.store.check_integrity(args[0])?;
        writeln!(
            out,
            "OK ({} records in {} blocks)",
            report.records, report.blocks
        )?;
        Ok(())
    }
}

fn expect_args(args: &[&str], min: usize, max: usize, usage: &str) -> Result<()> {
    if args.len() < min || args.len() > max {
        bail!("usage: {}", usage);
    }
    Ok(())
}

fn parse_arg<T>(raw: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("invalid {} '{}'", name, raw))
}

/// Parses `id,open,high,low,close,volume`.
fn parse_bar(symbol: &str, line: &str) -> Result<PriceBar> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        bail!("expected 6 fields, found {}", fields.len());
    }
    Ok(PriceBar::new(
        symbol,
        parse_arg(fields[0], "id")?,
        parse_arg(fields[1], "open")?,
        parse_arg(fields[2], "high")?,
        parse_arg(fields[3], "low")?,
        parse_arg(fields[4], "close")?,
        parse_arg(fields[5], "volume")?,
    ))
}

fn print_bars<W: Write>(out: &mut W, bars: &[PriceBar]) -> Result<()> {
    if bars.is_empty() {
        writeln!(out, "(empty)")?;
        return Ok(());
    }
    for b in bars {
        writeln!(
            out,
            "{} {} {} {} {} {}",
            b.id, b.open, b.high, b.low, b.close, b.volume
        )?;
    }
    writeln!(out, "({} bars)", bars.len())?;
    Ok(())
}

fn print_node<W: Write>(out: &mut W, node: Option<IndexNode>) -> Result<()> {
    match node {
        Some(n) => writeln!(out, "{}", n)?,
        None => writeln!(out, "(nil)")?,
    }
    Ok(())
}
