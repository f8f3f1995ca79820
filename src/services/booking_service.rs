// src/services/booking_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        calendar::{timezone_or_utc, LocalDay},
        db_utils::lock_provider_calendar,
        error::AppError,
        interval::Interval,
    },
    db::{AvailabilityRepository, BookingRepository, CatalogRepository},
    models::{
        booking::{Booking, BookingStatus, CreateBookingRequest},
        catalog::Provider,
    },
    services::slot_generator::{check_candidate, DaySnapshot},
};

#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    availability_repo: AvailabilityRepository,
    booking_repo: BookingRepository,
    catalog_repo: CatalogRepository,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        availability_repo: AvailabilityRepository,
        booking_repo: BookingRepository,
        catalog_repo: CatalogRepository,
    ) -> Self {
        Self {
            pool,
            availability_repo,
            booking_repo,
            catalog_repo,
        }
    }

    // =========================================================================
    //  COMMIT DO AGENDAMENTO
    // =========================================================================

    /// Revalida o horário e grava o agendamento numa única transação.
    /// A linha do prestador fica travada até o commit; a EXCLUDE constraint
    /// de `bookings` cobre qualquer escrita que passe por fora deste caminho.
    pub async fn create_booking(
        &self,
        client_id: Uuid,
        payload: &CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let service = self
            .catalog_repo
            .find_active_service(&mut *tx, payload.service_id)
            .await?;
        let provider_id = service.provider_id;

        lock_provider_calendar(&mut *tx, provider_id).await?;

        // Foto do dia local em que o horário começa, lida DEPOIS da trava
        let settings = self.availability_repo.get_settings(&mut *tx, provider_id).await?;
        let tz = timezone_or_utc(&settings.timezone);
        let day = LocalDay::new(payload.start_time.with_timezone(&tz).date_naive(), tz)?;
        let candidate = Interval::starting_at(payload.start_time, i64::from(service.duration_minutes));

        // O horário pode passar da meia-noite local: busca a união das duas janelas
        let window = day.window();
        let fetch_window = Interval::new(
            window.start.min(candidate.start),
            window.end.max(candidate.end),
        );

        let rules = self
            .availability_repo
            .list_active_rules_for_day(&mut *tx, provider_id, day.day_of_week())
            .await?;
        let exceptions = self
            .availability_repo
            .list_exceptions_overlapping(&mut *tx, provider_id, fetch_window)
            .await?;
        let bookings = self
            .booking_repo
            .list_active_overlapping(&mut *tx, provider_id, fetch_window)
            .await?;

        let snapshot = DaySnapshot {
            day,
            rules,
            exceptions,
            bookings,
            settings,
        };

        if let Err(rejection) = check_candidate(&snapshot, candidate, now) {
            tracing::info!(
                provider_id = %provider_id,
                service_id = %service.id,
                start = %candidate.start,
                ?rejection,
                "Horário recusado na confirmação do agendamento"
            );
            // Drop da transação faz o rollback
            return Err(rejection.into());
        }

        let booking = self
            .booking_repo
            .insert_booking(
                &mut *tx,
                provider_id,
                service.id,
                client_id,
                candidate.start,
                candidate.end,
                BookingStatus::Pending,
                payload.notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            provider_id = %provider_id,
            client_id = %client_id,
            start = %booking.start_datetime,
            "Agendamento criado"
        );
        Ok(booking)
    }

    // =========================================================================
    //  CICLO DE VIDA
    // =========================================================================

    // Cliente dono do agendamento ou o usuário do prestador podem cancelar
    pub async fn cancel_booking(&self, actor_user_id: Uuid, booking_id: Uuid) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = self.booking_repo.find_for_update(&mut *tx, booking_id).await?;

        if booking.client_id != actor_user_id {
            let provider = self
                .catalog_repo
                .find_provider(&mut *tx, booking.provider_id)
                .await?;
            let is_provider = provider.is_some_and(|p| p.user_id == actor_user_id);
            if !is_provider {
                return Err(AppError::Forbidden);
            }
        }

        let next = transition(booking.status, BookingStatus::Cancelled)?;
        let updated = self.booking_repo.update_status(&mut *tx, booking.id, next).await?;
        tx.commit().await?;

        tracing::info!(booking_id = %updated.id, actor = %actor_user_id, "Agendamento cancelado");
        Ok(updated)
    }

    pub async fn confirm_booking(&self, provider: &Provider, booking_id: Uuid) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = self.booking_repo.find_for_update(&mut *tx, booking_id).await?;
        if booking.provider_id != provider.id {
            // Não revela agendamentos de outros prestadores
            return Err(AppError::BookingNotFound);
        }

        let next = transition(booking.status, BookingStatus::Confirmed)?;
        let updated = self.booking_repo.update_status(&mut *tx, booking.id, next).await?;
        tx.commit().await?;

        tracing::info!(booking_id = %updated.id, provider_id = %provider.id, "Agendamento confirmado");
        Ok(updated)
    }
}

// Transições permitidas pelas rotas de ciclo de vida
fn transition(current: BookingStatus, target: BookingStatus) -> Result<BookingStatus, AppError> {
    use BookingStatus::*;

    match (current, target) {
        (Pending, Confirmed) => Ok(Confirmed),
        (Pending | Confirmed, Cancelled) => Ok(Cancelled),
        _ => Err(AppError::InvalidStatusTransition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use tokio::task::JoinSet;

    fn request(service_id: Uuid, start_time: DateTime<Utc>) -> CreateBookingRequest {
        CreateBookingRequest {
            service_id,
            start_time,
            notes: None,
        }
    }

    // Dispara todos os commits em paralelo; devolve (sucessos, conflitos, outros erros)
    async fn commit_concurrently(
        service: &BookingService,
        requests: Vec<CreateBookingRequest>,
    ) -> (usize, usize, Vec<String>) {
        let mut set = JoinSet::new();
        for payload in requests {
            let service = service.clone();
            set.spawn(async move {
                service
                    .create_booking(Uuid::new_v4(), &payload, long_before())
                    .await
            });
        }

        let (mut ok, mut conflicts, mut others) = (0, 0, Vec::new());
        while let Some(joined) = set.join_next().await {
            match joined.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::SlotUnavailable) => conflicts += 1,
                Err(e) => others.push(e.to_string()),
            }
        }
        (ok, conflicts, others)
    }

    #[test]
    fn pending_can_be_confirmed_or_cancelled() {
        assert_eq!(
            transition(BookingStatus::Pending, BookingStatus::Confirmed).unwrap(),
            BookingStatus::Confirmed
        );
        assert_eq!(
            transition(BookingStatus::Pending, BookingStatus::Cancelled).unwrap(),
            BookingStatus::Cancelled
        );
    }

    #[test]
    fn confirmed_can_only_be_cancelled() {
        assert_eq!(
            transition(BookingStatus::Confirmed, BookingStatus::Cancelled).unwrap(),
            BookingStatus::Cancelled
        );
        assert!(matches!(
            transition(BookingStatus::Confirmed, BookingStatus::Confirmed),
            Err(AppError::InvalidStatusTransition)
        ));
    }

    #[test]
    fn terminal_statuses_do_not_move() {
        for status in [BookingStatus::Cancelled, BookingStatus::Completed, BookingStatus::Disputed] {
            assert!(matches!(
                transition(status, BookingStatus::Cancelled),
                Err(AppError::InvalidStatusTransition)
            ));
            assert!(matches!(
                transition(status, BookingStatus::Confirmed),
                Err(AppError::InvalidStatusTransition)
            ));
        }
    }

    // --- CONCORRÊNCIA (Postgres) ---

    #[sqlx::test]
    async fn concurrent_commits_for_the_same_slot_leave_one_winner(pool: PgPool) {
        let provider = create_test_provider(&pool).await;
        let service = create_test_service(&pool, provider.id, 60).await;
        create_test_rule(&pool, provider.id, 1, time(9, 0), time(17, 0), true).await;

        let requests = (0..4).map(|_| request(service.id, monday_at(10, 0))).collect();
        let (ok, conflicts, others) = commit_concurrently(&booking_service(&pool), requests).await;

        assert_eq!((ok, conflicts), (1, 3), "outros erros: {:?}", others);
        assert!(others.is_empty());
    }

    #[sqlx::test]
    async fn concurrent_commits_cannot_exceed_the_daily_cap(pool: PgPool) {
        let provider = create_test_provider(&pool).await;
        let service = create_test_service(&pool, provider.id, 60).await;
        create_test_rule(&pool, provider.id, 1, time(9, 0), time(17, 0), true).await;
        set_daily_cap(&pool, provider.id, 1).await;

        // Horários distintos: só a trava do prestador impede o segundo commit
        let requests = [9, 11, 13, 15]
            .into_iter()
            .map(|h| request(service.id, monday_at(h, 0)))
            .collect();
        let (ok, conflicts, others) = commit_concurrently(&booking_service(&pool), requests).await;

        assert_eq!((ok, conflicts), (1, 3), "outros erros: {:?}", others);

        let view = availability_service()
            .service_slots(&pool, service.id, monday(), long_before())
            .await
            .unwrap();
        assert!(view.slots.is_empty());
    }

    #[sqlx::test]
    async fn cancelled_booking_frees_its_slot(pool: PgPool) {
        let provider = create_test_provider(&pool).await;
        let service = create_test_service(&pool, provider.id, 60).await;
        create_test_rule(&pool, provider.id, 1, time(9, 0), time(17, 0), true).await;
        let bookings = booking_service(&pool);
        let slots = availability_service();
        let client_id = Uuid::new_v4();

        let booking = bookings
            .create_booking(client_id, &request(service.id, monday_at(10, 0)), long_before())
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let taken = slots.service_slots(&pool, service.id, monday(), long_before()).await.unwrap();
        assert!(!taken.slots.contains(&monday_at(10, 0)));

        let cancelled = bookings.cancel_booking(client_id, booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let freed = slots.service_slots(&pool, service.id, monday(), long_before()).await.unwrap();
        assert!(freed.slots.contains(&monday_at(10, 0)));
        assert!(freed.slots.len() > taken.slots.len());

        bookings
            .create_booking(Uuid::new_v4(), &request(service.id, monday_at(10, 0)), long_before())
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn only_the_client_or_the_provider_can_cancel(pool: PgPool) {
        let provider = create_test_provider(&pool).await;
        let service = create_test_service(&pool, provider.id, 60).await;
        create_test_rule(&pool, provider.id, 1, time(9, 0), time(17, 0), true).await;
        let bookings = booking_service(&pool);

        let booking = bookings
            .create_booking(Uuid::new_v4(), &request(service.id, monday_at(10, 0)), long_before())
            .await
            .unwrap();

        let stranger = bookings.cancel_booking(Uuid::new_v4(), booking.id).await;
        assert!(matches!(stranger, Err(AppError::Forbidden)));

        bookings.cancel_booking(provider.user_id, booking.id).await.unwrap();
        let again = bookings.cancel_booking(provider.user_id, booking.id).await;
        assert!(matches!(again, Err(AppError::InvalidStatusTransition)));
    }

    #[sqlx::test]
    async fn exclusion_constraint_maps_to_slot_unavailable(pool: PgPool) {
        let provider = create_test_provider(&pool).await;
        let service = create_test_service(&pool, provider.id, 60).await;
        let (provider_id, service_id) = (provider.id, service.id);
        let repo = BookingRepository::new();
        let insert = |start: DateTime<Utc>, status: BookingStatus| {
            let repo = repo.clone();
            let pool = pool.clone();
            async move {
                repo.insert_booking(
                    &pool,
                    provider_id,
                    service_id,
                    Uuid::new_v4(),
                    start,
                    start + chrono::Duration::minutes(60),
                    status,
                    None,
                )
                .await
            }
        };

        insert(monday_at(10, 0), BookingStatus::Pending).await.unwrap();

        // Gravação que fura o caminho de commit: a constraint barra
        let overlapping = insert(monday_at(10, 30), BookingStatus::Confirmed).await;
        assert!(matches!(overlapping, Err(AppError::SlotUnavailable)));

        // Cancelados não ocupam a agenda; fim == início não é sobreposição
        insert(monday_at(10, 30), BookingStatus::Cancelled).await.unwrap();
        insert(monday_at(11, 0), BookingStatus::Pending).await.unwrap();
    }
}
