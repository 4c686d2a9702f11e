// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

macro_rules! id_newtype {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                let raw: i64 = input
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError(format!("invalid {} id: {input}", $label)))?;
                if raw <= 0 {
                    return Err(ValidationError(format!(
                        "{} id must be positive, got {raw}",
                        $label
                    )));
                }
                Ok(Self(raw))
            }

            #[must_use]
            pub fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId, "user");
id_newtype!(PlanId, "plan");
id_newtype!(TipId, "tip");
id_newtype!(NotificationId, "notification");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_parse_rejects_non_positive_and_garbage() {
        assert!(UserId::parse("17").is_ok());
        assert!(UserId::parse("0").is_err());
        assert!(UserId::parse("-4").is_err());
        assert!(TipId::parse("abc").is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = PlanId(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    }
}
