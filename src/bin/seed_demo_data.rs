use chrono::{Duration, Utc};
use clap::Parser;
use port_monitor_service::db::{seed, ParameterRepository, StationRepository};
use tracing::info;

/// Populate the store with a deterministic spread of demo measurements so
/// the dashboard and exports have data to show during development.
#[derive(Parser)]
#[command(name = "seed-demo-data")]
#[command(about = "Seed the monitoring database with demo measurements", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env, default_value = "sqlite:monitoreo.db")]
    database_url: String,

    /// How many trailing days to fill
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Measurements per parameter per day
    #[arg(long, default_value_t = 4)]
    per_day: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let pool = port_monitor_service::db::pool::connect(&cli.database_url).await?;

    let station_repo = StationRepository::new(pool.clone());
    let parameter_repo = ParameterRepository::new(pool.clone());
    seed::seed_initial_data(&station_repo, &parameter_repo).await?;

    let stations = station_repo.find_active().await?;
    let parameters = parameter_repo.find_all_ordered().await?;
    if stations.is_empty() || parameters.is_empty() {
        return Err("No active stations or parameters to attribute demo data to".into());
    }

    let mut inserted = 0usize;
    for day in 0..cli.days {
        for slot in 0..cli.per_day {
            for (idx, parameter) in parameters.iter().enumerate() {
                let station = &stations[(day as usize + idx) % stations.len()];

                // Deterministic wobble around 80% of the permissible limit
                let wobble = ((day * 13 + slot * 7 + idx as u32 * 5) % 11) as f64 / 10.0 - 0.5;
                let valor = parameter.valor_limite_permisible * (0.8 + 0.2 * wobble);

                let fecha = (Utc::now() - Duration::days(i64::from(day))
                    - Duration::hours(i64::from(slot) * 6))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();

                sqlx::query(
                    r#"
                    INSERT INTO mediciones
                        (id_estacion, id_parametro, valor_medido, fecha_medicion,
                         responsable_medicion, condiciones_climaticas, observaciones)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )
                .bind(station.id_estacion)
                .bind(parameter.id_parametro)
                .bind(valor)
                .bind(&fecha)
                .bind("Datos de Demostración")
                .bind("")
                .bind("")
                .execute(&pool)
                .await?;

                inserted += 1;
            }
        }
    }

    info!("Inserted {} demo measurements", inserted);
    println!("✅ Seeded {inserted} demo measurements");
    Ok(())
}
