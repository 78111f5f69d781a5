//! CRM data contracts.
//!
//! Each entity is split into three shapes:
//! - `*Draft`: the create/update request body as the client sends it. Every
//!   field is optional so that a missing required field is reported as a
//!   field error by [`crate::validation`] instead of a decode failure.
//! - `*Data`: the normalized, validated payload (defaults applied).
//! - `Record<*Data>`: what storage hands back, with the server-assigned id
//!   and timestamps flattened next to the data.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::validation;

/// A stored document: server-assigned identity plus the entity payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

pub type Lead = Record<LeadData>;
pub type Property = Record<PropertyData>;
pub type Agent = Record<AgentData>;
pub type Message = Record<MessageData>;
pub type Activity = Record<ActivityData>;
pub type User = Record<UserData>;

/// Ties a payload type to its collection, request shape and validator.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Sled tree name and REST path segment (`/api/<COLLECTION>`).
    const COLLECTION: &'static str;
    /// Human-readable name used in errors and notices.
    const LABEL: &'static str;

    type Draft: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static;

    fn validate(draft: &Self::Draft) -> Result<Self, ValidationError>;

    /// Lowercase text matched by the `search` list filter.
    fn search_text(&self) -> String;

    fn status_label(&self) -> Option<&'static str> {
        None
    }

    /// Cache key of the list query for this entity.
    fn list_key() -> String {
        format!("/api/{}", Self::COLLECTION)
    }
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Accepted values, for error messages.
            pub fn allowed() -> String {
                [$($text),+].join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Sales pipeline position of a lead.
    LeadStatus {
        New => "new",
        Contacted => "contacted",
        Qualified => "qualified",
        Viewing => "viewing",
        Offer => "offer",
        Closed => "closed",
        Lost => "lost",
    }
);

string_enum!(PropertyType {
    House => "house",
    Apartment => "apartment",
    Condo => "condo",
    Townhouse => "townhouse",
    Land => "land",
    Commercial => "commercial",
    Estate => "estate",
    Cabin => "cabin",
    Villa => "villa",
    Loft => "loft",
    Penthouse => "penthouse",
    SingleFamilyHome => "single family home",
});

string_enum!(PropertyStatus {
    Available => "available",
    Pending => "pending",
    Sold => "sold",
    Rented => "rented",
    Active => "active",
    Inactive => "inactive",
});

string_enum!(
    /// Delivery state of a message.
    MessageStatus {
        Pending => "pending",
        Sent => "sent",
        Delivered => "delivered",
        Read => "read",
        Failed => "failed",
    }
);

string_enum!(ActivityType {
    Call => "call",
    Message => "message",
    Email => "email",
    Viewing => "viewing",
    Note => "note",
    Task => "task",
    TextMessage => "text_message",
    InPersonTour => "in_person_tour",
});

string_enum!(UserRole {
    Agent => "agent",
    Admin => "admin",
    User => "user",
});

impl Default for LeadStatus {
    fn default() -> Self {
        Self::New
    }
}

impl Default for PropertyType {
    fn default() -> Self {
        Self::House
    }
}

impl Default for PropertyStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl Default for MessageStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Agent
    }
}

pub const DEFAULT_LEAD_SOURCE: &str = "website";

// --- Lead ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub source: String,
    pub status: LeadStatus,
    pub budget: Option<f64>,
    pub preferred_location: Option<String>,
    pub preferred_type: Option<String>,
    pub notes: Option<String>,
    pub assigned_agent_id: Option<String>,
    pub property_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub score: Option<u32>,
}

impl LeadData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub budget: Option<f64>,
    pub preferred_location: Option<String>,
    pub preferred_type: Option<String>,
    pub notes: Option<String>,
    pub assigned_agent_id: Option<String>,
    pub property_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub score: Option<i64>,
}

impl Entity for LeadData {
    const COLLECTION: &'static str = "leads";
    const LABEL: &'static str = "Lead";
    type Draft = LeadDraft;

    fn validate(draft: &LeadDraft) -> Result<Self, ValidationError> {
        validation::validate_lead(draft)
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.full_name(),
            self.email,
            self.phone,
            self.company.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

// --- Property ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub price: f64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<u32>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub agent_id: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i64>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub agent_id: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
}

impl Entity for PropertyData {
    const COLLECTION: &'static str = "properties";
    const LABEL: &'static str = "Property";
    type Draft = PropertyDraft;

    fn validate(draft: &PropertyDraft) -> Result<Self, ValidationError> {
        validation::validate_property(draft)
    }

    fn search_text(&self) -> String {
        [
            Some(self.title.as_str()),
            self.address.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

// --- Agent ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentData {
    pub user_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub bio: Option<String>,
    pub total_deals: Option<u32>,
    pub total_revenue: Option<f64>,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub user_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub bio: Option<String>,
    pub total_deals: Option<i64>,
    pub total_revenue: Option<f64>,
    pub is_active: Option<bool>,
}

impl Entity for AgentData {
    const COLLECTION: &'static str = "agents";
    const LABEL: &'static str = "Agent";
    type Draft = AgentDraft;

    fn validate(draft: &AgentDraft) -> Result<Self, ValidationError> {
        validation::validate_agent(draft)
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.full_name,
            self.email,
            self.specialization.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(if self.is_active { "active" } else { "inactive" })
    }
}

// --- Message ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub conversation_id: Option<String>,
    pub sender_id: Option<String>,
    pub recipient_id: Option<String>,
    pub content: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub status: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Entity for MessageData {
    const COLLECTION: &'static str = "messages";
    const LABEL: &'static str = "Message";
    type Draft = MessageDraft;

    fn validate(draft: &MessageDraft) -> Result<Self, ValidationError> {
        validation::validate_message(draft)
    }

    fn search_text(&self) -> String {
        self.content.to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

// --- Activity ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub lead_id: Option<String>,
    pub agent_id: Option<String>,
    pub property_id: Option<String>,
    pub description: Option<String>,
    pub result: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub lead_id: Option<String>,
    pub agent_id: Option<String>,
    pub property_id: Option<String>,
    pub description: Option<String>,
    pub result: Option<String>,
    pub notes: Option<String>,
}

impl Entity for ActivityData {
    const COLLECTION: &'static str = "activities";
    const LABEL: &'static str = "Activity";
    type Draft = ActivityDraft;

    fn validate(draft: &ActivityDraft) -> Result<Self, ValidationError> {
        validation::validate_activity(draft)
    }

    fn search_text(&self) -> String {
        [
            self.description.as_deref(),
            self.result.as_deref(),
            self.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.activity_type.as_str())
    }
}

/// An activity with the records it points at, for timeline display.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithRelations {
    #[serde(flatten)]
    pub activity: Activity,
    pub lead: Option<Lead>,
    pub agent: Option<Agent>,
    pub property: Option<Property>,
}

// --- User ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub username: String,
    /// bcrypt hash of the password.
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl Entity for UserData {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "User";
    type Draft = UserDraft;

    fn validate(draft: &UserDraft) -> Result<Self, ValidationError> {
        validation::validate_user(draft)
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.username, self.full_name, self.email).to_lowercase()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.role.as_str())
    }
}

/// A user as returned over the API (no password hash).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.data.username.clone(),
            full_name: user.data.full_name.clone(),
            email: user.data.email.clone(),
            phone: user.data.phone.clone(),
            avatar: user.data.avatar.clone(),
            role: user.data.role,
            is_active: user.data.is_active,
            created_at: user.created_at,
        }
    }
}

/// JWT claims issued at login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub sub: String, // username
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_strings() {
        assert_eq!(
            serde_json::to_value(PropertyType::SingleFamilyHome).unwrap(),
            "single family home"
        );
        assert_eq!(ActivityType::parse("in_person_tour"), Some(ActivityType::InPersonTour));
        assert_eq!(LeadStatus::parse("New"), None);
        assert_eq!(MessageStatus::ALL.len(), 5);
    }

    #[test]
    fn record_flattens_payload_in_camel_case() {
        let now = Utc::now();
        let activity = Record {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            data: ActivityData {
                activity_type: ActivityType::Call,
                lead_id: Some("lead-1".into()),
                agent_id: None,
                property_id: None,
                description: Some("Intro call".into()),
                result: None,
                notes: None,
            },
        };

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "call");
        assert_eq!(json["leadId"], "lead-1");
        assert!(json.get("createdAt").is_some());

        let back: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(back, activity);
    }

    #[test]
    fn list_key_matches_rest_path() {
        assert_eq!(LeadData::list_key(), "/api/leads");
        assert_eq!(PropertyData::list_key(), "/api/properties");
    }
}
