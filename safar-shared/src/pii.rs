use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for passenger data (document numbers, emails, phone numbers) that
/// must never show up in log output.
///
/// `Debug` and `Display` print a fixed mask. Serialization is transparent
/// because the provider needs the real value on the wire.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the real value. Call sites should be limited to payload assembly.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_leaks() {
        let doc = Masked::from("AB1234567");
        assert_eq!(format!("{:?}", doc), "********");
        assert_eq!(doc.to_string(), "********");
        assert_eq!(doc.expose(), "AB1234567");
    }

    #[test]
    fn test_serde_is_transparent() {
        let email: Masked<String> = serde_json::from_str("\"lead@example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"lead@example.com\"");
        assert!(!email.is_blank());
        assert!(Masked::from("  ").is_blank());
    }
}
