//! Service catalog model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Age bracket a service is aimed at.
///
/// Stored and passed around in callbacks by its variant name
/// (`ZERO_SIX`, ...); shown to users through [`AgeCategory::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "age_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeCategory {
    ZeroSix,
    SixOneYear,
    OlderOneYear,
}

impl AgeCategory {
    pub const ALL: [AgeCategory; 3] = [
        AgeCategory::ZeroSix,
        AgeCategory::SixOneYear,
        AgeCategory::OlderOneYear,
    ];

    /// Variant name, used as callback data and in the database
    pub fn name(self) -> &'static str {
        match self {
            AgeCategory::ZeroSix => "ZERO_SIX",
            AgeCategory::SixOneYear => "SIX_ONE_YEAR",
            AgeCategory::OlderOneYear => "OLDER_ONE_YEAR",
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            AgeCategory::ZeroSix => "от 0 до 6 месяцев",
            AgeCategory::SixOneYear => "от 6 месяцев до года",
            AgeCategory::OlderOneYear => "старше года",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i32,
    pub age_category: AgeCategory,
    pub name: String,
    pub description: String,
    pub is_link: bool,
    pub link: Option<String>,
}

/// Field set shared by service creation and full updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub age_category: AgeCategory,
    pub name: String,
    pub description: String,
    pub is_link: bool,
    pub link: Option<String>,
}

impl From<Service> for ServiceDraft {
    fn from(service: Service) -> Self {
        Self {
            age_category: service.age_category,
            name: service.name,
            description: service.description,
            is_link: service.is_link,
            link: service.link,
        }
    }
}
