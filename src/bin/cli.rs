use chrono::{NaiveDate, NaiveTime};
use polars::prelude::{AnyValue, DataFrame};
use rotation_tool::persistence::to_paste_payload;
use rotation_tool::{
    BoardMetadata, NewEntry, RotationBoard, ScheduleEntry, load_board_from_csv,
    load_board_from_json, persistence::parse_iso_instant, save_board_to_csv, save_board_to_json,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: &AnyValue| match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    };

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            if let Ok(ref av) = col.get(row_idx) {
                widths[ci] = widths[ci].max(cell(av).len());
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push_str(&format!(" {:<width$} |", name, width = widths[i]));
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let s = col.get(row_idx).map(|av| cell(&av)).unwrap_or_default();
            out.push_str(&format!(" {:<width$} |", s, width = widths[ci]));
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn show(board: &RotationBoard) {
    match board.dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Render error: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current schedule\n  lanes                              List visible lanes\n  add <lane> <D#> <HHMM> <hours> <minutes> <label> [color]\n                                     Add a schedule entry\n  delete <idx>                       Delete an entry\n  dup <idx>                          Duplicate an entry one hour later\n  lane add <name>                    Add (or restore) a lane\n  lane remove <name>                 Remove a lane and its entries\n  optimize                           Repack entries into the fewest lanes\n  copy                               Print visible entries as a paste payload\n  paste <json...>                    Replace entries from a paste payload\n  timeline                           Print the timeline feed as JSON\n  decode <D# HHMM>                   Resolve a day token\n  encode <YYYY-MM-DDTHH:MM[:SS]>     Encode an instant as a day token\n  meta show                          Show board metadata\n  meta name <text...>                Update board name\n  meta base <YYYY-MM-DD>             Update cycle base date\n  meta lanes <n>                     Update base lane count\n  save <json|csv> <path>             Persist board to disk\n  load <json|csv> <path>             Load board from disk\n  quit|exit                          Exit"
    );
}

fn print_metadata(board: &RotationBoard) {
    let metadata = board.metadata();
    println!("Board name      : {}", metadata.board_name);
    println!("Cycle base date : {}", metadata.base_date);
    println!("Base lane count : {}", metadata.base_lane_count);
}

fn parse_day(token: &str) -> Option<u32> {
    token.trim_start_matches(['D', 'd']).parse().ok()
}

fn parse_clock(token: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(token, "%H%M")
        .or_else(|_| NaiveTime::parse_from_str(token, "%H:%M"))
        .ok()
}

fn update_metadata(board: &mut RotationBoard, apply: impl FnOnce(&mut BoardMetadata)) {
    let mut metadata = board.metadata().clone();
    apply(&mut metadata);
    match board.set_metadata(metadata) {
        Ok(_) => print_metadata(board),
        Err(e) => println!("Error: {}", e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let metadata = BoardMetadata::from_env().unwrap_or_else(|e| {
        println!("Config error: {} (using defaults)", e);
        BoardMetadata::default()
    });
    let mut board = RotationBoard::with_sample_entries(metadata);

    println!("Rotation Tool (CLI) - type 'help' for commands\n");
    show(&board);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => show(&board),
            "lanes" => println!("Lanes: {}", board.visible_lanes().join(", ")),
            "add" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 6 {
                    println!("Usage: add <lane> <D#> <HHMM> <hours> <minutes> <label> [color]");
                    continue;
                }
                let Some(day) = parse_day(args[1]) else {
                    println!("Invalid day (D1..D7)");
                    continue;
                };
                let Some(departure) = parse_clock(args[2]) else {
                    println!("Invalid departure time (HHMM)");
                    continue;
                };
                let (Ok(hours), Ok(minutes)) = (args[3].parse::<u32>(), args[4].parse::<u32>())
                else {
                    println!("Invalid duration");
                    continue;
                };
                let mut form = NewEntry::new(args[0], day, departure);
                form.duration_hours = hours;
                form.duration_minutes = minutes;
                form.label = args[5].to_string();
                if let Some(color) = args.get(6) {
                    form.color = color.to_string();
                }
                match board.add_entry(form) {
                    Ok(idx) => {
                        println!("Added entry {}.", idx);
                        show(&board);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "delete" | "dup" => {
                let Some(idx) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
                    println!("Usage: {} <idx>", cmd);
                    continue;
                };
                let result = if cmd == "delete" {
                    board.delete_entry(idx).map(|_| format!("Deleted entry {}.", idx))
                } else {
                    board
                        .duplicate_entry(idx)
                        .map(|copy| format!("Duplicated entry {} as {}.", idx, copy))
                };
                match result {
                    Ok(msg) => {
                        println!("{}", msg);
                        show(&board);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "lane" => match (parts.next(), parts.next()) {
                (Some("add"), Some(name)) => match board.add_lane(name) {
                    Ok(true) => println!("Lane '{}' added.", name),
                    Ok(false) => println!("Lane '{}' already exists.", name),
                    Err(e) => println!("Error: {}", e),
                },
                (Some("remove"), Some(name)) => match board.remove_lane(name) {
                    Ok(removed) => println!("Lane '{}' removed ({} entries dropped).", name, removed),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: lane add|remove <name>"),
            },
            "optimize" => match board.optimize() {
                Ok(summary) => {
                    println!("Optimized ({})", summary.to_cli_summary());
                    show(&board);
                }
                Err(e) => println!("Optimize error: {}", e),
            },
            "copy" => {
                let visible: Vec<ScheduleEntry> =
                    board.visible_entries().into_iter().cloned().collect();
                match to_paste_payload(&visible) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "paste" => {
                let payload = input[cmd.len()..].trim();
                if payload.is_empty() {
                    println!("Usage: paste <json...>");
                    continue;
                }
                match board.apply_paste(payload) {
                    Ok(summary) => {
                        println!(
                            "Schedule updated: kept {} of {} rows.",
                            summary.kept, summary.received
                        );
                        show(&board);
                    }
                    Err(e) => println!("Invalid data: {}", e),
                }
            }
            "timeline" => match serde_json::to_string_pretty(&board.timeline()) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("Error: {}", e),
            },
            "decode" => {
                let token = input[cmd.len()..].trim();
                let decoded = board.cycle().decode_str(token);
                let note = if decoded.is_fallback() { " (fallback)" } else { "" };
                println!("{}{}", decoded.instant(), note);
            }
            "encode" => match parts.next().and_then(parse_iso_instant) {
                Some(instant) => println!("{}", board.cycle().encode(instant)),
                None => println!("Usage: encode <YYYY-MM-DDTHH:MM[:SS]>"),
            },
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&board),
                Some("name") => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta name <text...>");
                        continue;
                    }
                    let name = rest.join(" ");
                    update_metadata(&mut board, |m| m.board_name = name);
                }
                Some("base") => match parts
                    .next()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                {
                    Some(date) => update_metadata(&mut board, |m| m.base_date = date),
                    None => println!("Usage: meta base <YYYY-MM-DD>"),
                },
                Some("lanes") => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
                    Some(count) => update_metadata(&mut board, |m| m.base_lane_count = count),
                    None => println!("Usage: meta lanes <n>"),
                },
                Some(_) => println!("Usage: meta show|name <text...>|base <YYYY-MM-DD>|lanes <n>"),
            },
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match save_board_to_json(&board, path) {
                    Ok(_) => println!("Board saved to {}", path),
                    Err(e) => println!("Save error: {}", e),
                },
                (Some("csv"), Some(path)) => match save_board_to_csv(&board, path) {
                    Ok(_) => println!("Board exported to {}", path),
                    Err(e) => println!("Save error: {}", e),
                },
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => {
                let loaded = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => Some((path, load_board_from_json(path))),
                    (Some("csv"), Some(path)) => {
                        Some((path, load_board_from_csv(path, board.metadata().clone())))
                    }
                    _ => None,
                };
                match loaded {
                    Some((path, Ok(loaded))) => {
                        board = loaded;
                        println!("Board loaded from {}", path);
                        show(&board);
                    }
                    Some((_, Err(e))) => println!("Load error: {}", e),
                    None => println!("Usage: load <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
