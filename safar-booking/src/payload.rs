//! Passenger payloads for the two provider calls.
//!
//! Validate only needs head counts. Book needs every passenger in full, with
//! dates in `DD-MM-YYYY` and contact details on the lead passenger only.

use chrono::NaiveDate;
use safar_core::criteria::PassengerCounts;
use safar_core::passenger::{BookingContact, BookingTraveler, PassengerRecord, PaxType};
use safar_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaxSummary {
    pub adt: u32,
    pub chd: u32,
    pub inf: u32,
}

impl PaxSummary {
    pub fn total(&self) -> u32 {
        self.adt + self.chd + self.inf
    }
}

impl From<PassengerCounts> for PaxSummary {
    fn from(counts: PassengerCounts) -> Self {
        Self { adt: counts.adults, chd: counts.children, inf: counts.infants }
    }
}

/// Counts per passenger type.
pub fn validate_summary(passengers: &[PassengerRecord]) -> PaxSummary {
    passengers.iter().fold(PaxSummary::default(), |mut summary, p| {
        match p.pax_type {
            PaxType::Adt => summary.adt += 1,
            PaxType::Chd => summary.chd += 1,
            PaxType::Inf => summary.inf += 1,
        }
        summary
    })
}

/// Full traveler list for the book call. Fails on the first incomplete record.
pub fn book_travelers(passengers: &[PassengerRecord]) -> CoreResult<Vec<BookingTraveler>> {
    if passengers.is_empty() {
        return Err(CoreError::ValidationError("At least one passenger is required".to_string()));
    }

    passengers
        .iter()
        .enumerate()
        .map(|(index, p)| {
            p.validate(index)?;

            let contact = if index == 0 {
                p.contact.as_ref().map(|c| BookingContact {
                    email: c.email.clone(),
                    phone: c.phone.clone(),
                })
            } else {
                None
            };

            Ok(BookingTraveler {
                pax_type: p.pax_type,
                salutation: p.salutation,
                gender: p.salutation.gender(),
                first_name: p.first_name.trim().to_string(),
                last_name: p.last_name.trim().to_string(),
                date_of_birth: to_provider_date(&p.birth_date)?,
                nationality: p.nationality.clone(),
                document_number: p.document.number.clone(),
                document_issuing_country: p.document.issuing_country.clone(),
                document_expiry: to_provider_date(&p.document.expiry)?,
                contact,
            })
        })
        .collect()
}

const INPUT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Convert a form date to `DD-MM-YYYY`. Strings already in that shape are
/// returned untouched.
pub fn to_provider_date(input: &str) -> CoreResult<String> {
    let value = input.trim();
    if is_provider_date(value) {
        return Ok(value.to_string());
    }

    // Date pickers sometimes hand over a full timestamp.
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| date.format("%d-%m-%Y").to_string())
        .ok_or_else(|| CoreError::ValidationError(format!("Unrecognised date '{}'", input)))
}

fn is_provider_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
