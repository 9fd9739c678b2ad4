//! Purpose: Interactive load/display/sort loop for `tabsort menu`.
//! Exports: `run_menu`.
//! Role: Prompting glue over the library; every action reports count and elapsed time.
//! Invariants: Action failures are reported and the loop continues.
//! Invariants: Only choice 9 or end of input ends the loop.

use std::io::{BufRead, Write};

use super::*;

const MENU: &str = "\
Menu:
  1. Load Bids
  2. Display All Bids
  3. Sort By Title
  4. Sort By ID
  5. Sort By Fund
  6. Sort By Title (selection)
  9. Exit
Enter choice: ";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Choice {
    Load,
    Display,
    Sort(SortKey, Algorithm),
    Exit,
}

fn parse_choice(line: &str) -> Option<Choice> {
    match line.trim().parse::<u32>().ok()? {
        1 => Some(Choice::Load),
        2 => Some(Choice::Display),
        3 => Some(Choice::Sort(SortKey::Title, Algorithm::Quick)),
        4 => Some(Choice::Sort(SortKey::Id, Algorithm::Selection)),
        5 => Some(Choice::Sort(SortKey::Fund, Algorithm::Selection)),
        6 => Some(Choice::Sort(SortKey::Title, Algorithm::Selection)),
        9 => Some(Choice::Exit),
        _ => None,
    }
}

fn write_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write menu output")
        .with_source(err)
}

fn report_elapsed<W: Write>(out: &mut W, elapsed: Duration) -> io::Result<()> {
    writeln!(out, "time: {:.3} milliseconds", millis(elapsed))?;
    writeln!(out, "time: {:.6} seconds", elapsed.as_secs_f64())
}

pub(super) fn run_menu<R: BufRead, W: Write>(
    mut input: R,
    mut out: W,
    path: &Path,
    config: &LoadConfig,
    color_mode: ColorMode,
) -> Result<(), Error> {
    let mut bids: Vec<Bid> = Vec::new();
    let mut line = String::new();

    loop {
        write!(out, "{MENU}").map_err(write_error)?;
        out.flush().map_err(write_error)?;

        line.clear();
        let read = input.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read menu choice")
                .with_source(err)
        })?;
        if read == 0 {
            writeln!(out).map_err(write_error)?;
            break;
        }

        let result = match parse_choice(&line) {
            Some(Choice::Exit) => break,
            Some(Choice::Load) => {
                writeln!(out, "Loading CSV file {}", path.display()).map_err(write_error)?;
                load_file(path, config).map(|loaded| {
                    bids = loaded.bids;
                    (bids.len(), "read", loaded.elapsed)
                })
            }
            Some(Choice::Display) => {
                for bid in &bids {
                    writeln!(out, "{bid}").map_err(write_error)?;
                }
                writeln!(out).map_err(write_error)?;
                continue;
            }
            Some(Choice::Sort(key, algorithm)) => timed_sort(&mut bids, key, algorithm)
                .map(|(stats, elapsed)| (stats.records, "sorted", elapsed)),
            None => {
                writeln!(out, "Please make valid selection").map_err(write_error)?;
                continue;
            }
        };

        match result {
            Ok((count, verb, elapsed)) => {
                writeln!(out, "{count} bids {verb}").map_err(write_error)?;
                report_elapsed(&mut out, elapsed).map_err(write_error)?;
            }
            Err(err) => {
                let err = add_io_hint(add_parse_hint(err));
                writeln!(out, "{}", error_text(&err, color_mode.use_color(false)))
                    .map_err(write_error)?;
            }
        }
    }

    writeln!(out, "Good bye.").map_err(write_error)?;
    Ok(())
}
