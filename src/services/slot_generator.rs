// src/services/slot_generator.rs

use chrono::{DateTime, Duration, Utc};

use crate::{
    common::{calendar::LocalDay, error::AppError, interval::Interval},
    models::{
        availability::{AvailabilityException, AvailabilityRule, ProviderAvailabilitySettings},
        booking::Booking,
    },
};

/// Passo do cursor. Independe da duração do serviço: um serviço de 90 minutos
/// pode começar em qualquer quarto de hora.
pub const SLOT_GRANULARITY_MINUTES: i64 = 15;

// ---
// Entrada: a "foto" de um dia do prestador montada pelo carregador
// ---
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub day: LocalDay,
    pub rules: Vec<AvailabilityRule>,
    pub exceptions: Vec<AvailabilityException>,
    pub bookings: Vec<Booking>,
    pub settings: ProviderAvailabilitySettings,
}

// ---
// Saída: horários aceitos + os dados brutos para exibição
// ---
#[derive(Debug)]
pub struct SlotPlan<'a> {
    /// Inícios aceitos, em ordem crescente.
    pub starts: Vec<DateTime<Utc>>,
    pub bookings: &'a [Booking],
    pub exceptions: &'a [AvailabilityException],
}

/// Por que um horário específico foi recusado no commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    DailyCapReached,
    Conflict,
    BeforeLeadTime,
    OutsideWorkingHours,
}

impl From<SlotRejection> for AppError {
    fn from(rejection: SlotRejection) -> Self {
        match rejection {
            SlotRejection::DailyCapReached | SlotRejection::Conflict => AppError::SlotUnavailable,
            SlotRejection::BeforeLeadTime | SlotRejection::OutsideWorkingHours => {
                AppError::SlotOutsideAvailability
            }
        }
    }
}

impl DaySnapshot {
    fn booked_intervals(&self) -> Vec<Interval> {
        self.bookings
            .iter()
            .filter(|b| b.status.occupies_time())
            .map(Booking::interval)
            .collect()
    }

    // Só o tipo "blocked" remove disponibilidade
    fn blocked_intervals(&self) -> Vec<Interval> {
        self.exceptions
            .iter()
            .filter(|e| e.is_blocking())
            .map(|e| Interval::new(e.start_datetime, e.end_datetime))
            .collect()
    }

    // Limite diário: avaliado uma vez para o dia inteiro, não por horário
    fn daily_cap_reached(&self, booked: &[Interval]) -> bool {
        let Some(cap) = self.settings.max_bookings_per_day else {
            return false;
        };
        let day = self.day.window();
        let taken = booked.iter().filter(|b| b.overlaps(&day)).count();
        taken >= cap.max(0) as usize
    }

    fn earliest_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(i64::from(self.settings.min_lead_time_hours))
    }

    /// Janelas das regras ativas deste dia da semana, montadas na data local.
    fn rule_windows(&self) -> Vec<Interval> {
        let day_of_week = self.day.day_of_week();
        let mut windows: Vec<Interval> = self
            .rules
            .iter()
            .filter(|r| r.is_active && r.day_of_week == day_of_week)
            .filter_map(|r| self.day.rule_window(r.start_time, r.end_time))
            .collect();
        windows.sort_by_key(|w| w.start);
        windows
    }
}

fn conflicts(candidate: &Interval, blocked: &[Interval], booked: &[Interval]) -> bool {
    blocked.iter().chain(booked).any(|b| candidate.overlaps(b))
}

// Regras sobrepostas são erro de configuração do prestador: avisamos, não corrigimos.
fn warn_on_overlapping_windows(snapshot: &DaySnapshot, windows: &[Interval]) {
    let overlapping = windows.windows(2).any(|pair| pair[0].overlaps(&pair[1]));
    if overlapping {
        tracing::warn!(
            provider_id = %snapshot.settings.provider_id,
            date = %snapshot.day.date,
            "Regras de disponibilidade sobrepostas; horários duplicados não serão removidos"
        );
    }
}

// ---
// O algoritmo
// ---
pub fn generate_slots(snapshot: &DaySnapshot, duration_minutes: i64, now: DateTime<Utc>) -> SlotPlan<'_> {
    let mut plan = SlotPlan {
        starts: Vec::new(),
        bookings: &snapshot.bookings,
        exceptions: &snapshot.exceptions,
    };
    if duration_minutes <= 0 {
        return plan;
    }

    // 1. Limite diário tem precedência sobre todo o resto
    let booked = snapshot.booked_intervals();
    if snapshot.daily_cap_reached(&booked) {
        return plan;
    }

    // 2. Antecedência mínima
    let earliest_start = snapshot.earliest_start(now);

    // 3/4. Fontes de bloqueio
    let blocked = snapshot.blocked_intervals();

    let windows = snapshot.rule_windows();
    warn_on_overlapping_windows(snapshot, &windows);

    // 5. Varre cada janela de forma independente
    let step = Duration::minutes(SLOT_GRANULARITY_MINUTES);
    for window in &windows {
        let mut cursor = window.start;
        loop {
            let candidate = Interval::starting_at(cursor, duration_minutes);
            // Sem encaixe parcial: passou do fim da janela, acabou
            if candidate.end > window.end {
                break;
            }
            if cursor >= earliest_start && !conflicts(&candidate, &blocked, &booked) {
                plan.starts.push(cursor);
            }
            cursor += step;
        }
    }

    // 6. Ordem crescente (estável; duplicatas de regras sobrepostas são mantidas)
    plan.starts.sort();
    plan
}

/// Revalida um único horário contra o estado atual (usado no commit do agendamento).
pub fn check_candidate(
    snapshot: &DaySnapshot,
    candidate: Interval,
    now: DateTime<Utc>,
) -> Result<(), SlotRejection> {
    let booked = snapshot.booked_intervals();
    if snapshot.daily_cap_reached(&booked) {
        return Err(SlotRejection::DailyCapReached);
    }
    if conflicts(&candidate, &snapshot.blocked_intervals(), &booked) {
        return Err(SlotRejection::Conflict);
    }
    if candidate.start < snapshot.earliest_start(now) {
        return Err(SlotRejection::BeforeLeadTime);
    }
    if !snapshot.rule_windows().iter().any(|w| w.contains(&candidate)) {
        return Err(SlotRejection::OutsideWorkingHours);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::Tz;
    use uuid::Uuid;

    // Segunda-feira, bem no futuro
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 7, h, m, 0).unwrap()
    }

    fn long_before() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2029, 12, 1, 0, 0, 0).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rule(day_of_week: i16, start: NaiveTime, end: NaiveTime) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            provider_id: Uuid::nil(),
            day_of_week,
            start_time: start,
            end_time: end,
            is_active: true,
            created_at: long_before(),
            updated_at: long_before(),
        }
    }

    fn exception(start: DateTime<Utc>, end: DateTime<Utc>, kind: &str) -> AvailabilityException {
        AvailabilityException {
            id: Uuid::new_v4(),
            provider_id: Uuid::nil(),
            start_datetime: start,
            end_datetime: end,
            exception_type: kind.to_string(),
            reason: None,
            created_at: long_before(),
        }
    }

    fn booking(start: DateTime<Utc>, end: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            provider_id: Uuid::nil(),
            service_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            start_datetime: start,
            end_datetime: end,
            status,
            notes: None,
            created_at: long_before(),
            updated_at: long_before(),
        }
    }

    fn snapshot_on(date: NaiveDate, tz: Tz, rules: Vec<AvailabilityRule>) -> DaySnapshot {
        DaySnapshot {
            day: LocalDay::new(date, tz).unwrap(),
            rules,
            exceptions: Vec::new(),
            bookings: Vec::new(),
            settings: ProviderAvailabilitySettings::defaults(Uuid::nil()),
        }
    }

    fn snapshot(rules: Vec<(NaiveTime, NaiveTime)>) -> DaySnapshot {
        let rules = rules.into_iter().map(|(s, e)| rule(1, s, e)).collect();
        snapshot_on(monday(), Tz::UTC, rules)
    }

    fn nine_to_five() -> DaySnapshot {
        snapshot(vec![(time(9, 0), time(17, 0))])
    }

    fn assert_no_overlap(starts: &[DateTime<Utc>], duration: i64, busy: Interval) {
        for s in starts {
            let slot = Interval::starting_at(*s, duration);
            assert!(!slot.overlaps(&busy), "slot {} overlaps {:?}", s, busy);
        }
    }

    // --- CENÁRIOS ---

    #[test]
    fn window_ending_at_midnight_keeps_the_last_hour() {
        let snap = snapshot(vec![(time(20, 0), NaiveTime::MIN)]);
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts.first(), Some(&at(20, 0)));
        assert_eq!(plan.starts.last(), Some(&at(23, 0)));
        assert_eq!(plan.starts.len(), 13);
        assert!(check_candidate(&snap, Interval::starting_at(at(23, 0), 60), long_before()).is_ok());
    }

    #[test]
    fn open_day_starts_at_rule_start() {
        let snap = nine_to_five();
        let plan = generate_slots(&snap, 60, long_before());
        assert!(!plan.starts.is_empty());
        assert_eq!(plan.starts[0], at(9, 0));
        assert_eq!(*plan.starts.last().unwrap(), at(16, 0));
        // 09:00 ... 16:00 de 15 em 15 minutos
        assert_eq!(plan.starts.len(), 29);
    }

    #[test]
    fn lead_time_longer_than_the_day_empties_it() {
        let mut snap = snapshot(vec![(time(0, 0), time(23, 45))]);
        snap.settings.min_lead_time_hours = 48;
        let plan = generate_slots(&snap, 60, at(8, 0));
        assert!(plan.starts.is_empty());
    }

    #[test]
    fn blocked_exception_removes_overlapping_slots() {
        let mut snap = nine_to_five();
        snap.exceptions.push(exception(at(10, 0), at(12, 0), "blocked"));
        let plan = generate_slots(&snap, 60, long_before());

        assert_no_overlap(&plan.starts, 60, Interval::new(at(10, 0), at(12, 0)));
        assert!(plan.starts.contains(&at(9, 0)));
        assert!(!plan.starts.contains(&at(9, 15)));
        assert!(!plan.starts.contains(&at(11, 45)));
        assert!(plan.starts.contains(&at(12, 0)));
    }

    #[test]
    fn active_booking_removes_slots_but_is_still_reported() {
        let mut snap = nine_to_five();
        snap.bookings.push(booking(at(14, 0), at(15, 0), BookingStatus::Confirmed));
        let plan = generate_slots(&snap, 60, long_before());

        assert_no_overlap(&plan.starts, 60, Interval::new(at(14, 0), at(15, 0)));
        assert!(plan.starts.contains(&at(13, 0)));
        assert!(plan.starts.contains(&at(15, 0)));
        assert_eq!(plan.bookings.len(), 1);
        assert_eq!(plan.bookings[0].start_datetime, at(14, 0));
    }

    #[test]
    fn daily_cap_empties_the_day() {
        let mut snap = nine_to_five();
        snap.settings.max_bookings_per_day = Some(2);
        snap.bookings.push(booking(at(9, 0), at(10, 0), BookingStatus::Confirmed));
        snap.bookings.push(booking(at(11, 0), at(12, 0), BookingStatus::Confirmed));
        let plan = generate_slots(&snap, 60, long_before());
        assert!(plan.starts.is_empty());
        // Os dados de exibição continuam disponíveis
        assert_eq!(plan.bookings.len(), 2);
    }

    #[test]
    fn daily_cap_not_reached_keeps_slots() {
        let mut snap = nine_to_five();
        snap.settings.max_bookings_per_day = Some(2);
        snap.bookings.push(booking(at(9, 0), at(10, 0), BookingStatus::Confirmed));
        snap.bookings.push(booking(at(11, 0), at(12, 0), BookingStatus::Cancelled));
        let plan = generate_slots(&snap, 60, long_before());
        assert!(!plan.starts.is_empty());
    }

    #[test]
    fn slot_must_fit_inside_the_window() {
        let snap = snapshot(vec![(time(16, 0), time(17, 0))]);
        assert_eq!(generate_slots(&snap, 60, long_before()).starts, vec![at(16, 0)]);
        assert!(generate_slots(&snap, 90, long_before()).starts.is_empty());
    }

    // --- PROPRIEDADES ---

    #[test]
    fn half_open_boundaries_are_not_conflicts() {
        let mut snap = snapshot(vec![(time(9, 0), time(12, 0))]);
        snap.exceptions.push(exception(at(10, 0), at(11, 0), "blocked"));
        let plan = generate_slots(&snap, 60, long_before());
        // Termina exatamente quando o bloqueio começa
        assert!(plan.starts.contains(&at(9, 0)));
        // Começa exatamente quando o bloqueio termina
        assert!(plan.starts.contains(&at(11, 0)));
    }

    #[test]
    fn booking_boundaries_are_half_open_too() {
        let mut snap = snapshot(vec![(time(9, 0), time(12, 0))]);
        snap.bookings.push(booking(at(10, 0), at(11, 0), BookingStatus::Pending));
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts, vec![at(9, 0), at(11, 0)]);
    }

    #[test]
    fn disjoint_windows_never_span_the_gap() {
        let snap = snapshot(vec![(time(14, 0), time(17, 0)), (time(9, 0), time(12, 0))]);
        let plan = generate_slots(&snap, 60, long_before());
        let morning = Interval::new(at(9, 0), at(12, 0));
        let afternoon = Interval::new(at(14, 0), at(17, 0));

        assert!(plan.starts.iter().any(|s| morning.contains(&Interval::starting_at(*s, 60))));
        assert!(plan.starts.iter().any(|s| afternoon.contains(&Interval::starting_at(*s, 60))));
        for s in &plan.starts {
            let slot = Interval::starting_at(*s, 60);
            assert!(morning.contains(&slot) || afternoon.contains(&slot), "slot {} spans the gap", s);
        }
        assert!(plan.starts.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(plan.starts.len(), 18);
    }

    #[test]
    fn lead_time_skips_but_keeps_scanning() {
        let mut snap = nine_to_five();
        snap.settings.min_lead_time_hours = 2;
        let plan = generate_slots(&snap, 60, at(9, 40));
        assert_eq!(plan.starts[0], at(11, 45));
        assert!(plan.starts.iter().all(|s| *s >= at(11, 40)));
    }

    #[test]
    fn granularity_is_independent_of_duration() {
        let snap = snapshot(vec![(time(9, 0), time(10, 0))]);
        let plan = generate_slots(&snap, 45, long_before());
        assert_eq!(plan.starts, vec![at(9, 0), at(9, 15)]);
    }

    #[test]
    fn non_blocked_exception_types_are_ignored() {
        let mut snap = nine_to_five();
        snap.exceptions.push(exception(at(10, 0), at(12, 0), "extra_availability"));
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts.len(), 29);
        assert_eq!(plan.exceptions.len(), 1);
    }

    #[test]
    fn cancelled_and_completed_bookings_free_the_slot() {
        let mut snap = nine_to_five();
        snap.bookings.push(booking(at(9, 0), at(10, 0), BookingStatus::Cancelled));
        snap.bookings.push(booking(at(10, 0), at(11, 0), BookingStatus::Completed));
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts.len(), 29);
    }

    #[test]
    fn inactive_rules_and_other_weekdays_are_ignored() {
        let mut inactive = rule(1, time(6, 0), time(8, 0));
        inactive.is_active = false;
        let tuesday = rule(2, time(18, 0), time(20, 0));
        let snap = snapshot_on(
            monday(),
            Tz::UTC,
            vec![inactive, tuesday, rule(1, time(9, 0), time(10, 0))],
        );
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts, vec![at(9, 0)]);
    }

    #[test]
    fn overlapping_rules_are_not_deduplicated() {
        let snap = snapshot(vec![(time(9, 0), time(10, 0)), (time(9, 0), time(10, 0))]);
        let plan = generate_slots(&snap, 60, long_before());
        assert_eq!(plan.starts, vec![at(9, 0), at(9, 0)]);
    }

    #[test]
    fn rule_times_are_local_to_the_provider() {
        let snap = snapshot_on(
            monday(),
            chrono_tz::America::Sao_Paulo,
            vec![rule(1, time(9, 0), time(17, 0))],
        );
        let plan = generate_slots(&snap, 60, long_before());
        // 09:00 em São Paulo (UTC-3) = 12:00 UTC
        assert_eq!(plan.starts[0], at(12, 0));
    }

    #[test]
    fn output_is_deterministic() {
        let mut snap = nine_to_five();
        snap.exceptions.push(exception(at(12, 0), at(13, 0), "blocked"));
        snap.bookings.push(booking(at(15, 0), at(16, 0), BookingStatus::Pending));
        let a = generate_slots(&snap, 30, at(0, 0)).starts;
        let b = generate_slots(&snap, 30, at(0, 0)).starts;
        assert_eq!(a, b);
    }

    #[test]
    fn every_accepted_slot_respects_every_constraint() {
        let mut snap = snapshot(vec![(time(8, 0), time(12, 30)), (time(13, 0), time(19, 0))]);
        snap.settings.min_lead_time_hours = 1;
        snap.exceptions.push(exception(at(10, 10), at(10, 50), "blocked"));
        snap.exceptions.push(exception(at(17, 0), at(18, 0), "blocked"));
        snap.bookings.push(booking(at(13, 30), at(14, 15), BookingStatus::Confirmed));
        snap.bookings.push(booking(at(15, 0), at(15, 30), BookingStatus::Pending));
        let now = at(7, 20);
        let windows = [Interval::new(at(8, 0), at(12, 30)), Interval::new(at(13, 0), at(19, 0))];

        for duration in [15, 30, 45, 60, 90] {
            let plan = generate_slots(&snap, duration, now);
            assert!(!plan.starts.is_empty());
            for s in &plan.starts {
                let slot = Interval::starting_at(*s, duration);
                assert!(*s >= now + Duration::hours(1));
                assert!(windows.iter().any(|w| w.contains(&slot)));
                for e in &snap.exceptions {
                    assert!(!slot.overlaps(&Interval::new(e.start_datetime, e.end_datetime)));
                }
                for b in &snap.bookings {
                    assert!(!slot.overlaps(&b.interval()));
                }
            }
        }
    }

    #[test]
    fn non_positive_duration_yields_nothing() {
        let snap = nine_to_five();
        assert!(generate_slots(&snap, 0, long_before()).starts.is_empty());
    }

    // --- REVALIDAÇÃO NO COMMIT ---

    #[test]
    fn candidate_free_slot_is_accepted() {
        let mut snap = nine_to_five();
        snap.bookings.push(booking(at(9, 0), at(10, 0), BookingStatus::Confirmed));
        assert_eq!(
            check_candidate(&snap, Interval::starting_at(at(10, 0), 60), long_before()),
            Ok(())
        );
    }

    #[test]
    fn candidate_overlapping_booking_is_a_conflict() {
        let mut snap = nine_to_five();
        snap.bookings.push(booking(at(9, 30), at(10, 30), BookingStatus::Pending));
        assert_eq!(
            check_candidate(&snap, Interval::starting_at(at(10, 0), 60), long_before()),
            Err(SlotRejection::Conflict)
        );
    }

    #[test]
    fn candidate_overlapping_block_is_a_conflict() {
        let mut snap = nine_to_five();
        snap.exceptions.push(exception(at(10, 30), at(11, 0), "blocked"));
        assert_eq!(
            check_candidate(&snap, Interval::starting_at(at(10, 0), 60), long_before()),
            Err(SlotRejection::Conflict)
        );
    }

    #[test]
    fn candidate_after_cap_is_rejected() {
        let mut snap = nine_to_five();
        snap.settings.max_bookings_per_day = Some(1);
        snap.bookings.push(booking(at(9, 0), at(10, 0), BookingStatus::Confirmed));
        let rejection = check_candidate(&snap, Interval::starting_at(at(14, 0), 60), long_before());
        assert_eq!(rejection, Err(SlotRejection::DailyCapReached));
        assert!(matches!(AppError::from(SlotRejection::DailyCapReached), AppError::SlotUnavailable));
    }

    #[test]
    fn candidate_inside_lead_time_is_rejected() {
        let mut snap = nine_to_five();
        snap.settings.min_lead_time_hours = 3;
        assert_eq!(
            check_candidate(&snap, Interval::starting_at(at(10, 0), 60), at(8, 0)),
            Err(SlotRejection::BeforeLeadTime)
        );
    }

    #[test]
    fn candidate_outside_working_hours_is_rejected() {
        let snap = nine_to_five();
        assert_eq!(
            check_candidate(&snap, Interval::starting_at(at(16, 30), 60), long_before()),
            Err(SlotRejection::OutsideWorkingHours)
        );
        assert!(matches!(
            AppError::from(SlotRejection::OutsideWorkingHours),
            AppError::SlotOutsideAvailability
        ));
    }
}
