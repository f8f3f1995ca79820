// src/common/db_utils.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

// SQLSTATE de violação de EXCLUDE constraint (Postgres)
const EXCLUSION_VIOLATION: &str = "23P01";

// Nome da constraint da migration que impede dois agendamentos ativos sobrepostos
pub(crate) const BOOKING_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Converte erros de escrita em `bookings` para o erro de domínio.
/// A EXCLUDE constraint é a última barreira contra agendamento duplo.
pub(crate) fn map_booking_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        let is_overlap = db_err.code().as_deref() == Some(EXCLUSION_VIOLATION)
            || db_err.constraint() == Some(BOOKING_OVERLAP_CONSTRAINT);
        if is_overlap {
            return AppError::SlotUnavailable;
        }
    }
    e.into()
}

// ---
// Helper de concorrência: trava a agenda do prestador
// ---
/// `SELECT ... FOR UPDATE` na linha do prestador. Dois commits concorrentes
/// para o mesmo prestador ficam serializados até o fim da transação.
pub(crate) async fn lock_provider_calendar<'e, E>(
    executor: E,
    provider_id: Uuid,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM providers WHERE id = $1 AND is_active FOR UPDATE")
            .bind(provider_id)
            .fetch_optional(executor)
            .await?;

    // Prestador desativado entre a consulta e o commit
    locked.map(|_| ()).ok_or(AppError::ServiceNotFound)
}
