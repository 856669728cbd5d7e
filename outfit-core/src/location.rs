use std::fmt;

use crate::error::AdviceError;

/// A `"<region>_<locality>"` request parameter, split and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub region: String,
    pub locality: String,
}

impl LocationQuery {
    /// Free-text address sent to the geocoder.
    pub fn address(&self) -> String {
        format!("{}{}", self.region, self.locality)
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.region, self.locality)
    }
}

impl TryFrom<&str> for LocationQuery {
    type Error = AdviceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut parts = value.split('_');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(region), Some(locality), None) if !region.is_empty() && !locality.is_empty() => {
                Ok(Self {
                    region: region.to_string(),
                    locality: locality.to_string(),
                })
            }
            _ => Err(AdviceError::Validation(format!(
                "expected '<region>_<locality>', got '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_region_and_locality() {
        let q = LocationQuery::try_from("Osaka_Sakai").expect("valid location");
        assert_eq!(q.region, "Osaka");
        assert_eq!(q.locality, "Sakai");
        assert_eq!(q.address(), "OsakaSakai");
        assert_eq!(q.to_string(), "Osaka_Sakai");
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = LocationQuery::try_from("Osaka").unwrap_err();
        assert!(matches!(err, AdviceError::Validation(_)));
    }

    #[test]
    fn extra_separator_is_rejected() {
        let err = LocationQuery::try_from("Osaka_Sakai_Ward").unwrap_err();
        assert!(matches!(err, AdviceError::Validation(_)));
    }

    #[test]
    fn empty_parts_are_rejected() {
        for input in ["_Sakai", "Osaka_", "_", ""] {
            let err = LocationQuery::try_from(input).unwrap_err();
            assert!(matches!(err, AdviceError::Validation(_)), "{input:?}");
        }
    }
}
