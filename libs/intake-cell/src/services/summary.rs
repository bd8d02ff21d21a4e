use serde::Serialize;

use booking_cell::{AppointmentDraft, BookingState};
use patient_cell::{PatientDraft, PatientField};
use shared_config::AppConfig;
use shared_utils::format_display;

/// End-of-call summary assembled from the finalized session state. The
/// dialogue layer reads it back to the patient and passes the rendered
/// text downstream.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSummary {
    pub patient: Vec<String>,
    pub insurance: Vec<String>,
    pub medical: Vec<String>,
    pub appointment: Vec<String>,
    pub closing: String,
}

impl IntakeSummary {
    pub fn assemble(
        config: &AppConfig,
        draft: &PatientDraft,
        missing: &[PatientField],
        appointment: &AppointmentDraft,
        booking_state: BookingState,
    ) -> Self {
        Self {
            patient: patient_section(draft, missing),
            insurance: insurance_section(draft),
            medical: medical_section(draft),
            appointment: appointment_section(config, appointment, booking_state),
            closing: closing_line(draft, booking_state),
        }
    }

    /// Render the summary as readable text, skipping empty sections.
    pub fn render(&self) -> String {
        let mut out = vec!["Thank you for calling. Here is a summary of your call:".to_string()];

        for (header, lines) in [
            ("PATIENT INFORMATION", &self.patient),
            ("INSURANCE INFORMATION", &self.insurance),
            ("MEDICAL INFORMATION", &self.medical),
            ("APPOINTMENT INFORMATION", &self.appointment),
        ] {
            if lines.is_empty() {
                continue;
            }
            out.push(String::new());
            out.push(header.to_string());
            for line in lines {
                out.push(format!("- {}", line));
            }
        }

        out.push(String::new());
        out.push(self.closing.clone());
        out.join("\n")
    }
}

fn patient_section(draft: &PatientDraft, missing: &[PatientField]) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Name: {}",
        draft.name.as_deref().unwrap_or("Not provided")
    ));
    lines.push(format!(
        "Date of Birth: {}",
        draft
            .date_of_birth
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "Not provided".to_string())
    ));
    if let Some(phone) = &draft.phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(email) = &draft.email {
        lines.push(format!("Email: {}", email));
    }
    if let Some(address) = &draft.address {
        lines.push(format!("Address: {}", address));
    }
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|f| f.to_string()).collect();
        lines.push(format!("Still needed: {}", names.join(", ")));
    }
    lines
}

fn insurance_section(draft: &PatientDraft) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(provider) = &draft.insurance_provider {
        lines.push(format!("Provider: {}", provider));
    }
    if let Some(id) = &draft.insurance_id {
        lines.push(format!("Insurance ID: {}", id));
    }
    if let Some(has_referral) = draft.has_referral {
        lines.push(format!(
            "Has Referral: {}",
            if has_referral { "Yes" } else { "No" }
        ));
        if has_referral {
            if let Some(physician) = &draft.referred_physician {
                lines.push(format!("Referred By: {}", physician));
            }
        }
    }
    lines
}

fn medical_section(draft: &PatientDraft) -> Vec<String> {
    match &draft.chief_complaint {
        Some(complaint) => vec![format!("Complaint: {}", complaint)],
        None => Vec::new(),
    }
}

fn appointment_section(
    config: &AppConfig,
    appointment: &AppointmentDraft,
    booking_state: BookingState,
) -> Vec<String> {
    if booking_state == BookingState::NotStarted {
        return Vec::new();
    }

    let mut lines = Vec::new();
    match booking_state {
        BookingState::Confirmed => {
            lines.push("Status: Appointment successfully booked".to_string());
            if let Some(scheduled) = appointment.scheduled_time {
                lines.push(format!("Date & Time: {}", format_display(scheduled)));
            }
            if let Some(doctor) = &appointment.doctor_name {
                lines.push(format!("Doctor: {}", doctor));
            }
            if let Some(specialty) = &appointment.specialty_name {
                lines.push(format!("Specialty: {}", specialty));
            }
            lines.push(format!("Location: {}", config.clinic_location));
            lines.push(format!("Duration: {} minutes", config.default_duration_minutes));
        }
        BookingState::PendingMatch => {
            lines.push("Status: Appointment requested but not confirmed".to_string());
            if let Some(specialty) = &appointment.specialty_name {
                lines.push(format!("Preferred Specialty: {}", specialty));
            }
            if let Some(doctor) = &appointment.doctor_name {
                lines.push(format!("Preferred Doctor: {}", doctor));
            }
            if let Some(text) = &appointment.requested_time_text {
                lines.push(format!("Requested Time: {}", text));
            }
            lines.push(
                "Our scheduling team will contact you to confirm your appointment details."
                    .to_string(),
            );
        }
        BookingState::Cancelled => {
            lines.push("Status: Appointment request cancelled".to_string());
        }
        _ => {
            lines.push("Status: Appointment selection in progress, no booking made".to_string());
        }
    }
    lines.push("Please arrive 15 minutes early and bring your insurance card and ID.".to_string());
    lines
}

fn closing_line(draft: &PatientDraft, booking_state: BookingState) -> String {
    match (draft.confirmed, booking_state) {
        (true, BookingState::Confirmed) => {
            "Your registration and appointment are confirmed. We look forward to seeing you."
                .to_string()
        }
        (true, _) => "Your registration is confirmed.".to_string(),
        (false, _) => "Registration was not completed on this call.".to_string(),
    }
}
