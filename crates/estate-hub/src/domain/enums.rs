use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Raised when a stored or submitted label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn ordered() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim().to_ascii_uppercase();
                match normalized.as_str() {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let label = String::deserialize(deserializer)?;
                label.parse().map_err(de::Error::custom)
            }
        }
    };
}

labelled_enum! {
    /// What a user does on the marketplace.
    UserType, "user type" {
        Agent => "AGENT",
        Owner => "OWNER",
        Buyer => "BUYER",
        Customer => "CUSTOMER",
        Admin => "ADMIN",
    }
}

labelled_enum! {
    /// Canonical authorization role.
    Role, "role" {
        User => "USER",
        Agent => "AGENT",
        Admin => "ADMIN",
    }
}

labelled_enum! {
    /// Subscription plans in rank order; upgrades must move strictly right.
    PlanType, "plan type" {
        Free => "FREE",
        Basic => "BASIC",
        Premium => "PREMIUM",
        Enterprise => "ENTERPRISE",
    }
}

labelled_enum! {
    PropertyType, "property type" {
        House => "HOUSE",
        Apartment => "APARTMENT",
        Condo => "CONDO",
        Townhouse => "TOWNHOUSE",
        Land => "LAND",
        Commercial => "COMMERCIAL",
    }
}

labelled_enum! {
    ListingType, "listing type" {
        ForSale => "FOR_SALE",
        ForRent => "FOR_RENT",
    }
}

labelled_enum! {
    /// Lifecycle of a scheduled viewing. See `viewings::state` for the legal moves.
    ViewingStatus, "viewing status" {
        Pending => "PENDING",
        Confirmed => "CONFIRMED",
        Rejected => "REJECTED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl PlanType {
    pub const fn rank(self) -> u8 {
        match self {
            PlanType::Free => 0,
            PlanType::Basic => 1,
            PlanType::Premium => 2,
            PlanType::Enterprise => 3,
        }
    }
}

impl ViewingStatus {
    /// Active viewings occupy the property's single slot for their date.
    pub const fn is_active(self) -> bool {
        matches!(self, ViewingStatus::Pending | ViewingStatus::Confirmed)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ViewingStatus::Rejected | ViewingStatus::Completed | ViewingStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("for_rent".parse::<ListingType>(), Ok(ListingType::ForRent));
        assert_eq!(" Premium ".parse::<PlanType>(), Ok(PlanType::Premium));
        let err = "villa".parse::<PropertyType>().expect_err("unknown type");
        assert_eq!(err.kind, "property type");
    }

    #[test]
    fn serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ListingType::ForSale).expect("serialize");
        assert_eq!(json, "\"FOR_SALE\"");
        let status: ViewingStatus = serde_json::from_str("\"CANCELLED\"").expect("deserialize");
        assert_eq!(status, ViewingStatus::Cancelled);
    }

    #[test]
    fn deserializes_through_the_lenient_parser() {
        let kind: PropertyType = serde_json::from_str("\"house\"").expect("lowercase label");
        assert_eq!(kind, PropertyType::House);
        let err = serde_json::from_str::<PlanType>("\"gold\"").expect_err("unknown plan");
        assert!(err.to_string().contains("unknown plan type 'gold'"));
    }

    #[test]
    fn plan_rank_follows_declaration_order() {
        let ranks: Vec<u8> = PlanType::ordered().iter().map(|plan| plan.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }
}
