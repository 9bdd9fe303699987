//! Print a month's dose calendar for a user
//!
//! Usage: print_calendar <email> [year] [month]
//! Year and month default to the current month.

use chrono::Datelike;

use petmed::config;
use petmed::db::Database;
use petmed::models::User;
use petmed::schedule::MonthScaffold;
use petmed::tools::calendar;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(email) = args.first() else {
        eprintln!("Usage: print_calendar <email> [year] [month]");
        std::process::exit(2);
    };

    let today = petmed::tools::today();
    let year: i32 = match args.get(1) {
        Some(y) => y.parse()?,
        None => today.year(),
    };
    let month: u32 = match args.get(2) {
        Some(m) => m.parse()?,
        None => today.month(),
    };

    let db_path = config::database_path();
    let database = Database::open_migrated(&db_path)?;

    let user = database
        .with_conn(|conn| User::get_by_email(conn, email))?
        .ok_or_else(|| format!("No user registered with e-mail: {}", email))?;

    let scaffold = MonthScaffold::new(year, month)
        .ok_or_else(|| format!("Invalid month {}-{:02}", year, month))?;
    let dose_calendar = calendar::get_dose_calendar(&database, &user, year, month)?;

    print!("{}", calendar::render_dose_calendar(&scaffold, &dose_calendar));
    Ok(())
}
