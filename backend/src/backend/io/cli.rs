//! Command-line interface
//!
//! ```text
//! carpool [--config carpool.yaml] [--storage csv] trip create --data '{...}'
//! carpool trip status <id> ACTIVE
//! carpool booking cancel <id>
//! ```

use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{Booking, Rating, Record, Route, Trip, TripStatus, User};
use crate::backend::config::{EnvConfig, LayeredConfig, MapConfig, YamlConfig};
use crate::backend::domain::RecordService;
use crate::backend::AppState;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "carpool.yaml";

#[derive(Parser, Debug)]
#[command(name = "carpool")]
#[command(about = "Manage car-pool records stored as XML, CSV, MongoDB or PostgreSQL")]
pub struct Cli {
    /// YAML configuration file (default: ./carpool.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: xml, csv, mongo or postgres
    #[arg(short, long, global = true)]
    pub storage: Option<String>,

    #[command(subcommand)]
    pub entity: EntityCommand,
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// Registered users
    User {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Offered trips
    Trip {
        #[command(subcommand)]
        action: TripAction,
    },
    /// Routes between two points
    Route {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Seat bookings on a trip
    Booking {
        #[command(subcommand)]
        action: BookingAction,
    },
    /// Trip ratings
    Rating {
        #[command(subcommand)]
        action: RecordAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecordAction {
    /// Store a new record given as JSON and print its identifier
    Create {
        #[arg(short, long)]
        data: String,
    },
    /// Print a record as JSON
    Get { id: String },
    /// Replace a record; the JSON must carry its `id`
    Update {
        #[arg(short, long)]
        data: String,
    },
    /// Remove a record if it exists
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TripAction {
    #[command(flatten)]
    Record(RecordAction),
    /// Change the status of a trip
    Status { id: String, status: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BookingAction {
    #[command(flatten)]
    Record(RecordAction),
    /// Cancel a booking
    Cancel { id: String },
}

impl Cli {
    /// Command-line overrides, then `CARPOOL_*` variables, then the config file
    pub fn config_source(&self) -> Result<LayeredConfig> {
        let mut overrides = MapConfig::new();
        if let Some(storage) = &self.storage {
            overrides.set("storage.type", storage.as_str());
        }

        let mut layered = LayeredConfig::new().push(overrides).push(EnvConfig);

        match &self.config {
            Some(path) => {
                layered = layered.push(YamlConfig::load(path)?);
                info!("Loaded configuration from {}", path.display());
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                layered = layered.push(YamlConfig::load(DEFAULT_CONFIG_FILE)?);
                info!("Loaded configuration from {}", DEFAULT_CONFIG_FILE);
            }
            None => debug!("No configuration file, using environment and defaults"),
        }

        Ok(layered)
    }
}

/// Execute one command and return what should be printed
pub async fn run_command(entity: EntityCommand, state: &AppState) -> Result<String> {
    match entity {
        EntityCommand::User { action } => run_record::<User, _>(&state.user_service, action).await,
        EntityCommand::Route { action } => run_record::<Route, _>(&state.route_service, action).await,
        EntityCommand::Rating { action } => run_record::<Rating, _>(&state.rating_service, action).await,
        EntityCommand::Trip { action } => match action {
            TripAction::Record(action) => run_record::<Trip, _>(&state.trip_service, action).await,
            TripAction::Status { id, status } => {
                let status: TripStatus = status.parse()?;
                let trip = state.trip_service.set_status(&id, status).await?;
                to_json(&trip)
            }
        },
        EntityCommand::Booking { action } => match action {
            BookingAction::Record(action) => run_record::<Booking, _>(&state.booking_service, action).await,
            BookingAction::Cancel { id } => {
                let booking = state.booking_service.cancel(&id).await?;
                to_json(&booking)
            }
        },
    }
}

async fn run_record<R, S>(service: &S, action: RecordAction) -> Result<String>
where
    R: Record + Serialize + DeserializeOwned,
    S: RecordService<R>,
{
    match action {
        RecordAction::Create { data } => {
            let record: R = parse_record(&data)?;
            Ok(service.create(&record).await?)
        }
        RecordAction::Get { id } => to_json(&service.get(&id).await?),
        RecordAction::Update { data } => {
            let record: R = parse_record(&data)?;
            if record.id().is_empty() {
                bail!("{} update requires an \"id\" field", R::ENTITY);
            }
            service.update(&record).await?;
            Ok(format!("Updated {} {}", R::ENTITY, record.id()))
        }
        RecordAction::Delete { id } => {
            service.delete(&id).await?;
            Ok(format!("Deleted {} {}", R::ENTITY, id))
        }
    }
}

fn parse_record<R: Record + DeserializeOwned>(data: &str) -> Result<R> {
    serde_json::from_str(data).with_context(|| format!("invalid {} JSON", R::ENTITY))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::factory::{DaoSet, StorageType};
    use crate::backend::storage::file::CsvFormat;
    use crate::backend::config::ConfigSource;
    use crate::backend::storage::test_utils::{sample_trip, TestEnvironment};

    fn state(env: &TestEnvironment) -> AppState {
        AppState::from_daos(DaoSet::files::<CsvFormat>(StorageType::Csv, &env.connection))
    }

    #[test]
    fn test_parses_nested_commands() {
        let cli = Cli::try_parse_from(["carpool", "--storage", "xml", "trip", "status", "t-1", "ACTIVE"]).unwrap();
        assert_eq!(cli.storage.as_deref(), Some("xml"));
        assert!(matches!(
            cli.entity,
            EntityCommand::Trip { action: TripAction::Status { ref id, ref status } } if id == "t-1" && status == "ACTIVE"
        ));

        let cli = Cli::try_parse_from(["carpool", "booking", "get", "b-1"]).unwrap();
        assert!(matches!(
            cli.entity,
            EntityCommand::Booking { action: BookingAction::Record(RecordAction::Get { .. }) }
        ));

        assert!(Cli::try_parse_from(["carpool", "user", "cancel", "u-1"]).is_err());
    }

    #[test]
    fn test_storage_flag_overrides_environment_and_file() {
        let cli = Cli::try_parse_from(["carpool", "--storage", "xml", "user", "get", "u-1"]).unwrap();
        let source = cli.config_source().unwrap();
        assert_eq!(source.entry("storage.type").as_deref(), Some("xml"));
    }

    #[tokio::test]
    async fn test_create_get_and_status_round_trip() {
        let env = TestEnvironment::new().unwrap();
        let state = state(&env);

        let data = serde_json::to_string(&sample_trip("user-1", "route-1")).unwrap();
        let id = run_command(
            EntityCommand::Trip { action: TripAction::Record(RecordAction::Create { data }) },
            &state,
        )
        .await
        .unwrap();

        let output = run_command(
            EntityCommand::Trip { action: TripAction::Status { id: id.clone(), status: "completed".to_string() } },
            &state,
        )
        .await
        .unwrap();
        let trip: Trip = serde_json::from_str(&output).unwrap();
        assert_eq!(trip.id, id);
        assert_eq!(trip.status, TripStatus::Completed);

        let output = run_command(EntityCommand::Trip { action: TripAction::Record(RecordAction::Get { id }) }, &state)
            .await
            .unwrap();
        assert!(output.contains("\"COMPLETED\""));
    }

    #[tokio::test]
    async fn test_errors_surface_to_the_caller() {
        let env = TestEnvironment::new().unwrap();
        let state = state(&env);

        let missing = run_command(EntityCommand::User { action: RecordAction::Get { id: "nobody".to_string() } }, &state).await;
        assert!(missing.unwrap_err().to_string().contains("not found"));

        let bad_json = run_command(
            EntityCommand::Route { action: RecordAction::Create { data: "{".to_string() } },
            &state,
        )
        .await;
        assert!(bad_json.unwrap_err().to_string().contains("invalid route JSON"));

        let data = serde_json::to_string(&sample_trip("u", "r")).unwrap();
        let no_id = run_command(EntityCommand::Trip { action: TripAction::Record(RecordAction::Update { data }) }, &state).await;
        assert!(no_id.is_err());

        let bad_status = run_command(
            EntityCommand::Trip { action: TripAction::Status { id: "t".to_string(), status: "LATE".to_string() } },
            &state,
        )
        .await;
        assert!(bad_status.is_err());
    }
}
