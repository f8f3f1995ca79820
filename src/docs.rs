// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Schedule ---
        handlers::availability::get_schedule,
        handlers::availability::get_service_slots,

        // --- Availability ---
        handlers::availability::list_rules,
        handlers::availability::create_rule,
        handlers::availability::update_rule,
        handlers::availability::list_exceptions,
        handlers::availability::create_exception,
        handlers::availability::delete_exception,
        handlers::availability::get_settings,
        handlers::availability::update_settings,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::cancel_booking,
        handlers::bookings::confirm_booking,
    ),
    components(
        schemas(
            // --- Availability ---
            models::availability::AvailabilityRule,
            models::availability::AvailabilityException,
            models::availability::ProviderAvailabilitySettings,
            models::availability::CreateRuleRequest,
            models::availability::UpdateRuleRequest,
            models::availability::CreateExceptionRequest,
            models::availability::UpdateSettingsRequest,

            // --- Schedule ---
            models::schedule::SlotView,
            models::schedule::ScheduleBooking,
            models::schedule::ScheduleException,
            models::schedule::ScheduleResponse,
            models::schedule::ServiceSummary,
            models::schedule::ProviderSummary,
            models::schedule::ServiceSlotsResponse,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::Booking,
            models::booking::CreateBookingRequest,
        )
    ),
    tags(
        (name = "Schedule", description = "Horários disponíveis e agenda do dia"),
        (name = "Availability", description = "Regras semanais, bloqueios e configurações do prestador"),
        (name = "Bookings", description = "Confirmação e ciclo de vida dos agendamentos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
