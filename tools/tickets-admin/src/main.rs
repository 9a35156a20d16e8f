//! Operator tooling for the tickets service.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! cargo run -p tickets-admin -- migrate
//!
//! # Mint a 12h staff token for the check-in app
//! cargo run -p tickets-admin -- staff-token --role staff --hours 12
//!
//! # Create the demo event with its three batches
//! cargo run -p tickets-admin -- seed
//!
//! # Expire pending orders older than 30 minutes (run from cron)
//! cargo run -p tickets-admin -- expire-orders --older-than-minutes 30
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use ducktickets_auth_types::token::issue_access_token;
use ducktickets_core::config::{or_default, required};
use ducktickets_domain::staff::StaffRole;
use ducktickets_tickets::infra::db::{DbCatalogRepository, DbOrderRepository};
use ducktickets_tickets::usecase::order::ExpireOrdersUseCase;
use ducktickets_tickets_migration::Migrator;

mod seed;

#[derive(Parser)]
#[command(about = "DuckTickets operator commands")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending database migrations
    Migrate,
    /// Print a signed bearer token for a staff member
    StaffToken {
        #[arg(long, value_enum, default_value = "staff")]
        role: RoleArg,
        /// Token lifetime
        #[arg(long, default_value_t = 12)]
        hours: u64,
        /// Subject id; random when omitted
        #[arg(long)]
        user_id: Option<Uuid>,
    },
    /// Create the DuckConf demo event and its ticket batches
    Seed,
    /// Mark pending orders older than the cutoff as expired
    ExpireOrders {
        #[arg(long, default_value_t = 30)]
        older_than_minutes: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Staff,
    Admin,
}

impl From<RoleArg> for StaffRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Staff => StaffRole::Staff,
            RoleArg::Admin => StaffRole::Admin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    ducktickets_core::tracing::init_tracing();

    match Args::parse().command {
        Command::Migrate => {
            let db = connect().await?;
            Migrator::up(&db, None).await.context("apply migrations")?;
            tracing::info!("migrations applied");
        }
        Command::StaffToken {
            role,
            hours,
            user_id,
        } => {
            let secret: String = required("JWT_SECRET")?;
            let exp = chrono::Utc::now().timestamp().max(0) as u64 + hours * 3600;
            let user_id = user_id.unwrap_or_else(Uuid::new_v4);
            let token = issue_access_token(user_id, role.into(), exp, &secret)
                .context("sign staff token")?;
            println!("{token}");
        }
        Command::Seed => {
            let db = connect().await?;
            let seeded = seed::demo_event(DbCatalogRepository { db }).await?;
            println!("event {}", seeded.event.id);
            for batch in &seeded.batches {
                println!("  batch {} {} @ {}", batch.id, batch.name, batch.price);
            }
        }
        Command::ExpireOrders { older_than_minutes } => {
            anyhow::ensure!(older_than_minutes > 0, "--older-than-minutes must be positive");
            let db = connect().await?;
            let usecase = ExpireOrdersUseCase {
                orders: DbOrderRepository { db },
            };
            let expired = usecase
                .execute(chrono::Duration::minutes(older_than_minutes))
                .await?;
            println!("{expired} order(s) expired");
        }
    }
    Ok(())
}

async fn connect() -> Result<DatabaseConnection> {
    let url: String = required("DATABASE_URL")?;
    let max_connections: u32 = or_default("ADMIN_DB_MAX_CONNECTIONS", 2)?;
    let mut options = sea_orm::ConnectOptions::new(url);
    options.max_connections(max_connections);
    Database::connect(options)
        .await
        .context("connect to database")
}
