use safar_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaxType {
    Adt,
    Chd,
    Inf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Salutation {
    Mr,
    Master,
    Ms,
    Mrs,
    Miss,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Salutation {
    /// Gender is always derived from the salutation, never entered separately.
    pub fn gender(self) -> Gender {
        match self {
            Salutation::Mr | Salutation::Master => Gender::Male,
            Salutation::Ms | Salutation::Mrs | Salutation::Miss => Gender::Female,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDocument {
    pub number: Masked<String>,
    pub issuing_country: String,
    /// As typed in the agent form, converted on the way out.
    pub expiry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

/// A passenger as captured by the booking form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerRecord {
    pub pax_type: PaxType,
    pub salutation: Salutation,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub nationality: String,
    pub document: TravelDocument,
    /// Only read for the lead (first) passenger.
    #[serde(default)]
    pub contact: Option<ContactDetails>,
}

impl PassengerRecord {
    /// Check required fields. `index` is the passenger's position; position 0
    /// is the lead passenger and must carry contact details.
    pub fn validate(&self, index: usize) -> CoreResult<()> {
        let incomplete = |reason: &str| CoreError::IncompletePassenger {
            index,
            reason: reason.to_string(),
        };

        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(incomplete("first and last name are required"));
        }
        if self.birth_date.trim().is_empty() {
            return Err(incomplete("birth date is required"));
        }
        if self.document.number.is_blank() {
            return Err(incomplete("document number is required"));
        }
        if self.document.expiry.trim().is_empty() {
            return Err(incomplete("document expiry is required"));
        }

        if index == 0 {
            match &self.contact {
                Some(contact) if !contact.email.is_blank() && !contact.phone.is_blank() => {}
                _ => return Err(incomplete("lead passenger needs contact email and phone")),
            }
        }
        Ok(())
    }
}

// ============================================================================
// Book payload traveler
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingContact {
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingTraveler {
    pub pax_type: PaxType,
    pub salutation: Salutation,
    pub gender: Gender,
    pub first_name: String,
    pub last_name: String,
    /// DD-MM-YYYY
    pub date_of_birth: String,
    pub nationality: String,
    pub document_number: Masked<String>,
    pub document_issuing_country: String,
    /// DD-MM-YYYY
    pub document_expiry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<BookingContact>,
}
