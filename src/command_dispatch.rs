//! Purpose: Hold top-level CLI command dispatch for `tabsort`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Summaries are single JSON objects; `show` emits one line per bid.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    config: &LoadConfig,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tabsort", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Menu { file } => {
            let path = file.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH));
            let stdin = io::stdin();
            menu::run_menu(stdin.lock(), io::stdout(), &path, config, color_mode)?;
            Ok(RunOutcome::ok())
        }
        Command::Load { file } => {
            let loaded = load_file(&file, config)?;
            emit_json(json!({
                "file": file.display().to_string(),
                "rows": loaded.table.row_count(),
                "columns": loaded.table.column_count(),
                "bids": loaded.bids.len(),
                "elapsed_ms": millis(loaded.elapsed),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Sort {
            file,
            by,
            algo,
            show,
        } => {
            let mut loaded = load_file(&file, config)?;
            let key = SortKey::from(by);
            let algorithm = Algorithm::from(algo);
            let (stats, elapsed) = timed_sort(&mut loaded.bids, key, algorithm)?;

            let mut summary = json!({
                "file": file.display().to_string(),
                "key": key.name(),
                "algorithm": algorithm.name(),
                "stats": stats,
                "elapsed_ms": millis(elapsed),
            });
            if show {
                summary["bids"] = Value::Array(loaded.bids.iter().map(bid_json).collect());
            }
            emit_json(summary);
            Ok(RunOutcome::ok())
        }
        Command::Show { file, json } => {
            let loaded = load_file(&file, config)?;
            for bid in &loaded.bids {
                if json {
                    let line = serde_json::to_string(&bid_json(bid))
                        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
                    println!("{line}");
                } else {
                    println!("{bid}");
                }
            }
            Ok(RunOutcome::ok())
        }
    }
}
