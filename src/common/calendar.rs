// src/common/calendar.rs

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::common::{error::AppError, interval::Interval};

// ---
// Dia local do prestador
// ---
// Todas as regras semanais são horários de parede no fuso do prestador;
// aqui eles viram instantes absolutos (UTC) para o dia consultado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub tz: Tz,
    /// 00:00:00.000 local, em UTC.
    pub start_of_day: DateTime<Utc>,
    /// 23:59:59.999 local, em UTC.
    pub end_of_day: DateTime<Utc>,
}

impl LocalDay {
    pub fn new(date: NaiveDate, tz: Tz) -> Result<Self, AppError> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("meia-noite inválida para {}", date))?;
        let last_ms = date
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| anyhow::anyhow!("fim de dia inválido para {}", date))?;

        let start_of_day = resolve_local(tz, midnight)
            .ok_or_else(|| anyhow::anyhow!("não foi possível resolver {} em {}", midnight, tz))?;
        let end_of_day = resolve_local(tz, last_ms)
            .ok_or_else(|| anyhow::anyhow!("não foi possível resolver {} em {}", last_ms, tz))?;

        Ok(Self { date, tz, start_of_day, end_of_day })
    }

    /// 0 = domingo ... 6 = sábado, calculado sobre a data local.
    pub fn day_of_week(&self) -> i16 {
        self.date.weekday().num_days_from_sunday() as i16
    }

    pub fn window(&self) -> Interval {
        Interval::new(self.start_of_day, self.end_of_day)
    }

    pub fn at(&self, time: NaiveTime) -> Option<DateTime<Utc>> {
        resolve_local(self.tz, self.date.and_time(time))
    }

    /// Janela `[start, end)` de uma regra semanal montada nesta data.
    /// `end_time = 00:00` é a meia-noite que encerra o dia (início do dia seguinte).
    /// `None` quando a janela some (ex.: cai inteira num salto de horário de verão).
    pub fn rule_window(&self, start_time: NaiveTime, end_time: NaiveTime) -> Option<Interval> {
        let start = self.at(start_time)?;
        let end = if end_time == NaiveTime::MIN {
            resolve_local(self.tz, self.date.succ_opt()?.and_time(NaiveTime::MIN))?
        } else {
            self.at(end_time)?
        };
        (start < end).then(|| Interval::new(start, end))
    }
}

// Horário ambíguo (volta do horário de verão) -> o instante mais cedo.
// Horário inexistente (salto) -> o primeiro minuto válido depois do salto.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=180)
            .find_map(|m| tz.from_local_datetime(&(naive + Duration::minutes(m))).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(raw.to_string()))
}

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}

// Fuso salvo no banco que não é mais reconhecido: cai para UTC e avisa
pub fn timezone_or_utc(name: &str) -> Tz {
    parse_timezone(name).unwrap_or_else(|_| {
        tracing::warn!(timezone = %name, "Fuso horário desconhecido na configuração; usando UTC");
        Tz::UTC
    })
}
