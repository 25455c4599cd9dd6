use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use study_planner::{
    ItemId, Schedule, ScheduleError, load_schedule_from_csv, load_schedule_from_json,
    record::date_from_i32, save_schedule_to_csv, save_schedule_to_json,
};
use std::io::{self, Write};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Date(days) => date_from_i32(*days).to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, row: &[String]| {
        out.push('|');
        for (ci, cell) in row.iter().enumerate() {
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(widths[ci] - cell.chars().count()));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_schedule(schedule: &Schedule) {
    if schedule.is_empty() {
        println!("(empty schedule, base date {})", schedule.base_date());
        return;
    }
    match schedule.to_dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering schedule: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show                                   Show current schedule\n  summary                                One-line schedule summary\n  base [YYYY-MM-DD]                      Show or move the base date\n  add <days> <label...>                  Append a study of <days> days\n  study <YYYY-MM-DD> <YYYY-MM-DD> <label...>\n                                         Insert a study on a fixed window\n  break <YYYY-MM-DD> <YYYY-MM-DD> <label...>\n                                         Insert a break\n  delete <id>                            Delete an item and all its parts\n  note <id> <text...>                    Set the note of an item\n  save <json|csv> <path>                 Save the schedule\n  load <json|csv> <path>                 Load a schedule\n  quit|exit                              Exit"
    );
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn report(result: Result<Schedule, ScheduleError>, schedule: &mut Schedule, done: &str) {
    match result {
        Ok(next) => {
            *schedule = next;
            println!("{done}");
            print_schedule(schedule);
        }
        Err(ScheduleError::NotFound(id)) => println!("Item {id} not found."),
        Err(e) => println!("Error: {}", e),
    }
}

fn main() {
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let today = chrono::Local::now().date_naive();
    let mut schedule = Schedule::empty(today);

    println!("Study Planner (CLI) - type 'help' for commands\n");
    print_schedule(&schedule);

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
        debug!(cmd, "cli command");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_schedule(&schedule),
            "summary" => println!("{}", schedule.summary().to_cli_summary()),
            "base" => match parts.next() {
                None => println!("Base date: {}", schedule.base_date()),
                Some(date_s) => match parse_date(date_s) {
                    Some(date) => {
                        let result = schedule.with_base_date(date);
                        report(result, &mut schedule, &format!("Base date set to {date}."));
                    }
                    None => println!("Invalid date (YYYY-MM-DD)"),
                },
            },
            "add" => {
                let days_s = parts.next();
                let label = parts.collect::<Vec<_>>().join(" ");
                match days_s {
                    Some(days_s) if !label.is_empty() => {
                        let days: i64 = match days_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid duration");
                                continue;
                            }
                        };
                        let result = schedule.append_study(label.as_str(), days, "");
                        report(result, &mut schedule, &format!("Study '{label}' added."));
                    }
                    _ => println!("Usage: add <days> <label...>"),
                }
            }
            "study" | "break" => {
                let start_s = parts.next();
                let end_s = parts.next();
                let label = parts.collect::<Vec<_>>().join(" ");
                match (start_s, end_s) {
                    (Some(start_s), Some(end_s)) if !label.is_empty() => {
                        let (Some(start), Some(end)) = (parse_date(start_s), parse_date(end_s))
                        else {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        };
                        let result = if cmd == "study" {
                            schedule.insert_study(label.as_str(), start, end, "")
                        } else {
                            schedule.insert_break(label.as_str(), start, end, "")
                        };
                        report(
                            result,
                            &mut schedule,
                            &format!("{} '{label}' inserted.", if cmd == "study" { "Study" } else { "Break" }),
                        );
                    }
                    _ => println!("Usage: {cmd} <YYYY-MM-DD> <YYYY-MM-DD> <label...>"),
                }
            }
            "delete" => match parts.next().map(str::parse::<ItemId>) {
                Some(Ok(id)) => {
                    let result = schedule.delete_item(id);
                    report(result, &mut schedule, &format!("Deleted item {id}."));
                }
                Some(Err(_)) => println!("Invalid id"),
                None => println!("Usage: delete <id>"),
            },
            "note" => {
                let id_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                match id_s.map(str::parse::<ItemId>) {
                    Some(Ok(id)) => {
                        let result = schedule.set_note(id, text);
                        report(result, &mut schedule, &format!("Note updated for {id}."));
                    }
                    Some(Err(_)) => println!("Invalid id"),
                    None => println!("Usage: note <id> <text...>"),
                }
            }
            "save" => {
                let format = parts.next();
                let path = parts.next();
                let result = match (format, path) {
                    (Some("json"), Some(path)) => save_schedule_to_json(&schedule, path),
                    (Some("csv"), Some(path)) => save_schedule_to_csv(&schedule, path),
                    _ => {
                        println!("Usage: save <json|csv> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(_) => println!("Schedule saved to {}.", path.unwrap_or_default()),
                    Err(e) => println!("Error saving schedule: {}", e),
                }
            }
            "load" => {
                let format = parts.next();
                let path = parts.next();
                let result = match (format, path) {
                    (Some("json"), Some(path)) => load_schedule_from_json(path),
                    (Some("csv"), Some(path)) => load_schedule_from_csv(path, today).map(Some),
                    _ => {
                        println!("Usage: load <json|csv> <path>");
                        continue;
                    }
                };
                let path = path.unwrap_or_default();
                match result {
                    Ok(Some(loaded)) => {
                        schedule = loaded;
                        println!("Schedule loaded from {}.", path);
                        print_schedule(&schedule);
                    }
                    Ok(None) => println!("No study plan stored in {}.", path),
                    Err(e) => println!("Error loading schedule: {}", e),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
