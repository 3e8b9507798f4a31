use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;
use shelter_visits::capacity::DAILY_CAPACITY;
use shelter_visits::client::VisitClient;
use shelter_visits::models::visit_day::parse_visit_day;
use shelter_visits::models::visiter::VisiterId;
use shelter_visits::planner::{date_options, VisitPlanner};

#[derive(Parser)]
#[command(about = "Plan and manage shelter visits")]
struct Cli {
    /// Base url of the visit service
    #[clap(env, long, default_value = "http://localhost:8080")]
    api_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List current reservations
    List,
    /// Show the bookable days and how full they are
    Days,
    /// Show the booking state of one day
    Status {
        #[arg(value_parser = parse_day)]
        date: Date,
    },
    /// Reserve a visit
    Book {
        #[arg(value_parser = parse_day)]
        date: Date,
        count: u32,
        #[arg(long, default_value_t = 1)]
        user_id: i64,
        #[arg(long, default_value_t = 0)]
        visiting_id: i64,
    },
    /// Cancel a reservation
    Cancel { id: VisiterId },
}

fn parse_day(raw: &str) -> Result<Date, String> {
    parse_visit_day(raw).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let client = VisitClient::new(cli.api_url);
    let mut planner = VisitPlanner::connect(client)
        .await
        .context("Could not load reservations")?;

    match cli.command {
        Command::List => print_reservations(&planner),
        Command::Days => {
            let today = OffsetDateTime::now_utc().date();
            for day in date_options(today) {
                let status = planner.status(day);
                let marker = if planner.existing_booking(day).is_some() { " (booked)" } else { "" };
                println!(
                    "{} {:>3}/{} booked, {:>3} left{}",
                    day, status.booked, DAILY_CAPACITY, status.remaining, marker
                );
            }
        }
        Command::Status { date } => {
            let status = planner.status(date);
            println!("{}: {}/{} booked, {} left", date, status.booked, status.capacity, status.remaining);
            if status.party_sizes.is_empty() {
                println!("This day is full");
            } else {
                println!("Party sizes still available: {:?}", status.party_sizes);
            }
        }
        Command::Book { date, count, user_id, visiting_id } => {
            let visiter = planner.book(date, count, user_id, visiting_id).await?;
            println!("Booked reservation {} for {} visitors on {}", visiter.id, visiter.number_of_visiter, visiter.visit_date);
            print_reservations(&planner);
        }
        Command::Cancel { id } => {
            planner.cancel(id).await?;
            println!("Cancelled reservation {}", id);
            print_reservations(&planner);
        }
    }

    Ok(())
}

fn print_reservations(planner: &VisitPlanner) {
    if planner.visiters().is_empty() {
        println!("No reservations yet");
        return;
    }
    for visiter in planner.visiters() {
        println!("#{:<5} {} {} visitors", visiter.id, visiter.visit_date, visiter.number_of_visiter);
    }
}
