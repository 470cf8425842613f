use tracing::{info, instrument};

use crate::db::{DbError, ParameterRepository, StationRepository};

/// First-run seed data: the port's two monitoring stations and the four
/// water-matrix parameters. Skipped whenever the tables already hold rows.
#[instrument(skip(stations, parameters))]
pub async fn seed_initial_data(
    stations: &StationRepository,
    parameters: &ParameterRepository,
) -> Result<(), DbError> {
    if stations.count().await? == 0 {
        info!("Seeding initial monitoring stations");
        stations
            .insert(
                "Entrada del Muelle",
                Some(-11.12204),
                Some(-77.6160),
                Some("agua"),
                "activa",
            )
            .await?;
        stations
            .insert(
                "Zona de embarque",
                Some(-11.12132),
                Some(-77.6176),
                Some("agua"),
                "activa",
            )
            .await?;
    }

    if parameters.count().await? == 0 {
        info!("Seeding initial environmental parameters");
        parameters
            .insert("pH", "escala", 8.5, Some("agua"), Some("Potencial de hidrógeno"))
            .await?;
        parameters
            .insert(
                "Oxígeno Disuelto (OD)",
                "mg/L",
                5.0,
                Some("agua"),
                Some("Concentración de oxígeno en agua"),
            )
            .await?;
        parameters
            .insert(
                "Salinidad",
                "ppm",
                35.0,
                Some("agua"),
                Some("Sales disueltas en el agua"),
            )
            .await?;
        parameters
            .insert(
                "Temperatura",
                "°C",
                25.0,
                Some("agua"),
                Some("Temperatura del agua"),
            )
            .await?;
    }

    Ok(())
}
