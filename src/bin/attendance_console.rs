//! Terminal front end for the attendance backend.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use attendance_tracker::attendance::service::parse_date;
use attendance_tracker::attendance::{
    AggregateResult, AttendanceService, HttpAttendanceStore, QueryController, QueryOutcome,
};
use attendance_tracker::config::ConsoleConfig;
use attendance_tracker::utils::logging;
use tracing::info;

const HELP: &str = "\
commands:
  select <employee_id>             inspect an employee (clears the date filter)
  date [YYYY-MM-DD]                filter by day; no argument clears it
  fetch                            fetch attendance for the selection
  mark <employee_id> <date> <status>   record Present or Absent
  show                             print the current selection and results
  help                             this text
  quit                             leave";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Select(String),
    Date(Option<String>),
    Fetch,
    Mark {
        employee_id: String,
        date: String,
        status: String,
    },
    Show,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match (verb, args.as_slice()) {
        ("select", [id]) => Command::Select(id.to_string()),
        ("select", []) => Command::Select(String::new()),
        ("date", []) => Command::Date(None),
        ("date", [day]) => Command::Date(Some(day.to_string())),
        ("fetch", []) => Command::Fetch,
        ("mark", [id, date, status]) => Command::Mark {
            employee_id: id.to_string(),
            date: date.to_string(),
            status: status.to_string(),
        },
        ("show", []) => Command::Show,
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("unrecognised command: {line}")),
    };
    Ok(Some(command))
}

fn render(aggregate: &AggregateResult) -> String {
    if aggregate.records.is_empty() {
        return "No attendance records found.".to_string();
    }

    let mut out = format!("Total Present Days: {}\n", aggregate.present_count);
    out.push_str("Date       | Status\n");
    out.push_str("-----------+--------");
    for entry in &aggregate.records {
        out.push_str(&format!("\n{} | {}", entry.date, entry.status));
    }
    out
}

fn print_outcome(outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::Completed(aggregate) => println!("{}", render(aggregate)),
        QueryOutcome::Failed(message) => println!("{message}"),
        QueryOutcome::Rejected => println!("A fetch is already loading."),
        QueryOutcome::RefreshQueued => println!("A fetch is loading; it will include this entry."),
        QueryOutcome::Stale => println!("Selection changed; result discarded."),
        QueryOutcome::Skipped => println!("Select an employee first."),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::from_env();
    let _guard = logging::init(&config.log_dir, "console.log");
    info!(api_url = %config.api_url, "Console starting");

    let service = AttendanceService::new(Arc::new(HttpAttendanceStore::new(&config.api_url)?));
    let controller = QueryController::new(service.clone());

    println!("Attendance Management ({}) - type `help`", config.api_url);
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}\n{HELP}");
                continue;
            }
        };

        match command {
            Command::Select(id) => controller.select_employee(&id),
            Command::Date(raw) => {
                let date = match raw.as_deref().map(parse_date).transpose() {
                    Ok(date) => date,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                if !controller.set_date_filter(date) {
                    println!("Select an employee before filtering by date.");
                }
            }
            Command::Fetch => print_outcome(&controller.run_query().await),
            Command::Mark {
                employee_id,
                date,
                status,
            } => match service.mark_attendance(&employee_id, &date, &status).await {
                Ok(_) => {
                    println!("Attendance recorded");
                    if let Some(outcome) = controller.notify_write_committed(&employee_id).await {
                        print_outcome(&outcome);
                    }
                }
                Err(e) => println!("{}", e.user_message()),
            },
            Command::Show => {
                let snapshot = controller.snapshot();
                let employee = if snapshot.selection.employee_id.is_empty() {
                    "(none)"
                } else {
                    snapshot.selection.employee_id.as_str()
                };
                let date = snapshot
                    .selection
                    .date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "(any)".to_string());
                println!("employee: {employee}  date: {date}  state: {:?}", snapshot.state);
                if let Some(error) = &snapshot.error {
                    println!("{error}");
                }
                println!("{}", render(&snapshot.aggregate));
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_tracker::model::attendance::{AttendanceEntry, AttendanceStatus};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("select E1"), Ok(Some(Command::Select("E1".into()))));
        assert_eq!(parse_command("date"), Ok(Some(Command::Date(None))));
        assert_eq!(
            parse_command("mark 42 2024-03-01 Present"),
            Ok(Some(Command::Mark {
                employee_id: "42".into(),
                date: "2024-03-01".into(),
                status: "Present".into(),
            }))
        );
        assert!(parse_command("mark 42").is_err());
    }

    #[test]
    fn renders_total_and_rows() {
        let aggregate = AggregateResult::from_records(vec![
            AttendanceEntry {
                employee_id: "42".into(),
                date: parse_date("2024-03-01").expect("date"),
                status: AttendanceStatus::Present,
            },
            AttendanceEntry {
                employee_id: "42".into(),
                date: parse_date("2024-03-02").expect("date"),
                status: AttendanceStatus::Absent,
            },
        ]);
        let text = render(&aggregate);
        assert!(text.starts_with("Total Present Days: 1"));
        assert!(text.contains("2024-03-02 | Absent"));
        assert_eq!(render(&AggregateResult::default()), "No attendance records found.");
    }
}
