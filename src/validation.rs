//! Pure validators turning request drafts into normalized entity data.
//!
//! Every validator walks all fields and reports every violation at once, so
//! a form can highlight all bad inputs in one round. Strings are trimmed and
//! empty optional strings are dropped; enum fields fall back to their
//! documented defaults when absent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Constraint, CrmError, CrmResult, ValidationError};
use crate::models::{
    ActivityData, ActivityDraft, ActivityType, AgentData, AgentDraft, Entity, LeadData, LeadDraft,
    LeadStatus, MessageData, MessageDraft, MessageStatus, PropertyData, PropertyDraft,
    PropertyStatus, PropertyType, UserData, UserDraft, UserRole, DEFAULT_LEAD_SOURCE,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$")
        .expect("valid regex")
});

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Fields a partial update may never touch.
const IMMUTABLE_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate_lead(draft: &LeadDraft) -> Result<LeadData, ValidationError> {
    let mut errors = ValidationError::default();

    let lead = LeadData {
        first_name: required(&mut errors, "firstName", &draft.first_name),
        last_name: required(&mut errors, "lastName", &draft.last_name),
        email: email(&mut errors, "email", &draft.email),
        phone: required(&mut errors, "phone", &draft.phone),
        company: optional(&draft.company),
        source: optional(&draft.source).unwrap_or_else(|| DEFAULT_LEAD_SOURCE.to_string()),
        status: enum_value(&mut errors, "status", &draft.status, LeadStatus::parse, LeadStatus::allowed)
            .unwrap_or_default(),
        budget: non_negative(&mut errors, "budget", draft.budget),
        preferred_location: optional(&draft.preferred_location),
        preferred_type: optional(&draft.preferred_type),
        notes: optional(&draft.notes),
        assigned_agent_id: optional(&draft.assigned_agent_id),
        property_id: optional(&draft.property_id),
        tags: string_list(&draft.tags),
        score: count(&mut errors, "score", draft.score),
    };

    finish(lead, errors)
}

pub fn validate_property(draft: &PropertyDraft) -> Result<PropertyData, ValidationError> {
    let mut errors = ValidationError::default();

    let price = match draft.price {
        None => {
            errors.push("price", Constraint::Required, "Price is required");
            0.0
        }
        Some(price) => non_negative(&mut errors, "price", Some(price)).unwrap_or(0.0),
    };

    let property = PropertyData {
        title: required(&mut errors, "title", &draft.title),
        description: optional(&draft.description),
        address: optional(&draft.address),
        city: optional(&draft.city),
        state: optional(&draft.state),
        zip_code: optional(&draft.zip_code),
        price,
        bedrooms: count(&mut errors, "bedrooms", draft.bedrooms),
        bathrooms: non_negative(&mut errors, "bathrooms", draft.bathrooms),
        square_feet: count(&mut errors, "squareFeet", draft.square_feet),
        lot_size: non_negative(&mut errors, "lotSize", draft.lot_size),
        year_built: draft.year_built,
        property_type: enum_value(
            &mut errors,
            "propertyType",
            &draft.property_type,
            PropertyType::parse,
            PropertyType::allowed,
        )
        .unwrap_or_default(),
        status: enum_value(&mut errors, "status", &draft.status, PropertyStatus::parse, PropertyStatus::allowed)
            .unwrap_or_default(),
        features: string_list(&draft.features),
        images: string_list(&draft.images),
        agent_id: optional(&draft.agent_id),
        owner_email: optional_email(&mut errors, "ownerEmail", &draft.owner_email),
        owner_phone: optional(&draft.owner_phone),
    };

    finish(property, errors)
}

pub fn validate_agent(draft: &AgentDraft) -> Result<AgentData, ValidationError> {
    let mut errors = ValidationError::default();

    let agent = AgentData {
        user_id: optional(&draft.user_id),
        full_name: required(&mut errors, "fullName", &draft.full_name),
        email: email(&mut errors, "email", &draft.email),
        phone: required(&mut errors, "phone", &draft.phone),
        avatar: optional(&draft.avatar),
        specialization: optional(&draft.specialization),
        license_number: optional(&draft.license_number),
        bio: optional(&draft.bio),
        total_deals: count(&mut errors, "totalDeals", draft.total_deals),
        total_revenue: non_negative(&mut errors, "totalRevenue", draft.total_revenue),
        is_active: draft.is_active.unwrap_or(true),
    };

    finish(agent, errors)
}

pub fn validate_message(draft: &MessageDraft) -> Result<MessageData, ValidationError> {
    let mut errors = ValidationError::default();

    let message = MessageData {
        conversation_id: required(&mut errors, "conversationId", &draft.conversation_id),
        sender_id: required(&mut errors, "senderId", &draft.sender_id),
        recipient_id: required(&mut errors, "recipientId", &draft.recipient_id),
        content: required(&mut errors, "content", &draft.content),
        attachments: string_list(&draft.attachments),
        status: enum_value(&mut errors, "status", &draft.status, MessageStatus::parse, MessageStatus::allowed)
            .unwrap_or_default(),
        sent_at: draft.sent_at,
    };

    finish(message, errors)
}

pub fn validate_activity(draft: &ActivityDraft) -> Result<ActivityData, ValidationError> {
    let mut errors = ValidationError::default();

    let activity_type = enum_value(
        &mut errors,
        "type",
        &draft.activity_type,
        ActivityType::parse,
        ActivityType::allowed,
    );
    if draft.activity_type.as_deref().map_or(true, |t| t.trim().is_empty()) {
        errors.push("type", Constraint::Required, "Activity type is required");
    }

    let activity = ActivityData {
        activity_type: activity_type.unwrap_or(ActivityType::Note),
        lead_id: optional(&draft.lead_id),
        agent_id: optional(&draft.agent_id),
        property_id: optional(&draft.property_id),
        description: optional(&draft.description),
        result: optional(&draft.result),
        notes: optional(&draft.notes),
    };

    finish(activity, errors)
}

/// Used for users created outside the maintenance scripts; `password` is
/// checked as plain text, hashing happens afterwards.
pub fn validate_user(draft: &UserDraft) -> Result<UserData, ValidationError> {
    let mut errors = ValidationError::default();

    let user = UserData {
        username: min_length(&mut errors, "username", &draft.username, MIN_USERNAME_LEN),
        password: min_length(&mut errors, "password", &draft.password, MIN_PASSWORD_LEN),
        full_name: required(&mut errors, "fullName", &draft.full_name),
        email: email(&mut errors, "email", &draft.email),
        phone: optional(&draft.phone),
        avatar: optional(&draft.avatar),
        role: enum_value(&mut errors, "role", &draft.role, UserRole::parse, UserRole::allowed)
            .unwrap_or_default(),
        is_active: draft.is_active.unwrap_or(true),
    };

    finish(user, errors)
}

/// Decodes a JSON body into an entity draft. Type mismatches (a string where
/// a number belongs) are reported as a bad request.
pub fn decode_draft<T: Entity>(body: Value) -> CrmResult<T::Draft> {
    serde_json::from_value(body).map_err(|e| CrmError::BadRequest(e.to_string()))
}

/// Merges a partial JSON update over `current` and re-validates the result,
/// so updates obey the same rules as inserts.
pub fn apply_patch<T: Entity>(current: &T, patch: &Value) -> CrmResult<T> {
    let Value::Object(changes) = patch else {
        return Err(CrmError::BadRequest("update body must be a JSON object".into()));
    };

    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in changes {
            if IMMUTABLE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
    }

    let draft = decode_draft::<T>(merged)?;
    Ok(T::validate(&draft)?)
}

fn finish<T>(value: T, errors: ValidationError) -> Result<T, ValidationError> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(errors: &mut ValidationError, field: &str, value: &Option<String>) -> String {
    match optional(value) {
        Some(v) => v,
        None => {
            errors.push(field, Constraint::Required, format!("{field} is required"));
            String::new()
        }
    }
}

fn min_length(errors: &mut ValidationError, field: &str, value: &Option<String>, min: usize) -> String {
    let value = required(errors, field, value);
    if !value.is_empty() && value.chars().count() < min {
        errors.push(
            field,
            Constraint::MinLength,
            format!("{field} must be at least {min} characters"),
        );
    }
    value
}

fn email(errors: &mut ValidationError, field: &str, value: &Option<String>) -> String {
    let value = required(errors, field, value);
    if !value.is_empty() && !is_valid_email(&value) {
        errors.push(field, Constraint::Email, "Invalid email address");
    }
    value
}

fn optional_email(errors: &mut ValidationError, field: &str, value: &Option<String>) -> Option<String> {
    let value = optional(value)?;
    if !is_valid_email(&value) {
        errors.push(field, Constraint::Email, "Invalid email address");
    }
    Some(value)
}

fn non_negative(errors: &mut ValidationError, field: &str, value: Option<f64>) -> Option<f64> {
    let value = value?;
    if !value.is_finite() || value < 0.0 {
        errors.push(field, Constraint::NonNegative, format!("{field} must be 0 or more"));
    }
    Some(value)
}

fn count(errors: &mut ValidationError, field: &str, value: Option<i64>) -> Option<u32> {
    let value = value?;
    match u32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push(field, Constraint::NonNegative, format!("{field} must be 0 or more"));
            None
        }
    }
}

fn enum_value<E>(
    errors: &mut ValidationError,
    field: &str,
    value: &Option<String>,
    parse: fn(&str) -> Option<E>,
    allowed: fn() -> String,
) -> Option<E> {
    let raw = optional(value)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        errors.push(
            field,
            Constraint::Enum,
            format!("{field} must be one of: {}", allowed()),
        );
    }
    parsed
}

fn string_list(values: &Option<Vec<String>>) -> Vec<String> {
    values
        .iter()
        .flatten()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead_draft() -> LeadDraft {
        LeadDraft {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            email: Some("jane@example.com".into()),
            phone: Some("555-0101".into()),
            ..Default::default()
        }
    }

    #[test]
    fn lead_defaults_status_and_source() {
        let lead = validate_lead(&lead_draft()).expect("valid lead");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.source, "website");
        assert!(lead.tags.is_empty());
    }

    #[test]
    fn lead_reports_every_bad_field() {
        let draft = LeadDraft {
            first_name: Some("   ".into()),
            email: Some("not-an-email".into()),
            status: Some("won".into()),
            budget: Some(-5.0),
            ..lead_draft()
        };

        let err = validate_lead(&draft).unwrap_err();
        assert_eq!(err.constraint_for("firstName"), Some(Constraint::Required));
        assert_eq!(err.constraint_for("email"), Some(Constraint::Email));
        assert_eq!(err.constraint_for("status"), Some(Constraint::Enum));
        assert_eq!(err.constraint_for("budget"), Some(Constraint::NonNegative));
        assert_eq!(err.errors.len(), 4);
    }

    #[test]
    fn lead_missing_email_is_required_error() {
        let draft = LeadDraft { email: None, ..lead_draft() };
        let err = validate_lead(&draft).unwrap_err();
        assert_eq!(err.constraint_for("email"), Some(Constraint::Required));
    }

    #[test]
    fn property_negative_price_fails_on_price() {
        let draft = PropertyDraft {
            title: Some("Lake house".into()),
            price: Some(-1.0),
            ..Default::default()
        };
        let err = validate_property(&draft).unwrap_err();
        assert!(err.has_field("price"));
        assert_eq!(err.constraint_for("price"), Some(Constraint::NonNegative));
    }

    #[test]
    fn property_defaults_type_and_status() {
        let draft = PropertyDraft {
            title: Some("Loft downtown".into()),
            price: Some(0.0),
            property_type: Some("single family home".into()),
            ..Default::default()
        };
        let property = validate_property(&draft).expect("valid property");
        assert_eq!(property.property_type, PropertyType::SingleFamilyHome);
        assert_eq!(property.status, PropertyStatus::Available);

        let property = validate_property(&PropertyDraft {
            property_type: None,
            ..draft
        })
        .unwrap();
        assert_eq!(property.property_type, PropertyType::House);
    }

    #[test]
    fn agent_defaults_active() {
        let draft = AgentDraft {
            full_name: Some("Jane Doe".into()),
            email: Some("jane@realty.com".into()),
            phone: Some("555".into()),
            total_deals: Some(-1),
            ..Default::default()
        };
        let err = validate_agent(&draft).unwrap_err();
        assert!(err.has_field("totalDeals"));

        let agent = validate_agent(&AgentDraft { total_deals: Some(3), ..draft }).unwrap();
        assert!(agent.is_active);
        assert_eq!(agent.total_deals, Some(3));
    }

    #[test]
    fn activity_requires_known_type() {
        let err = validate_activity(&ActivityDraft::default()).unwrap_err();
        assert_eq!(err.constraint_for("type"), Some(Constraint::Required));

        let err = validate_activity(&ActivityDraft {
            activity_type: Some("fax".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.constraint_for("type"), Some(Constraint::Enum));
    }

    #[test]
    fn message_defaults_pending() {
        let draft = MessageDraft {
            conversation_id: Some("c1".into()),
            sender_id: Some("u1".into()),
            recipient_id: Some("u2".into()),
            content: Some("Hi there".into()),
            ..Default::default()
        };
        assert_eq!(validate_message(&draft).unwrap().status, MessageStatus::Pending);
    }

    #[test]
    fn user_password_min_length() {
        let draft = UserDraft {
            username: Some("jd".into()),
            password: Some("123".into()),
            full_name: Some("Jane Doe".into()),
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        let err = validate_user(&draft).unwrap_err();
        assert_eq!(err.constraint_for("username"), Some(Constraint::MinLength));
        assert_eq!(err.constraint_for("password"), Some(Constraint::MinLength));
    }

    #[test]
    fn patch_revalidates_merged_record() {
        let lead = validate_lead(&lead_draft()).unwrap();

        let updated = apply_patch(&lead, &json!({ "status": "qualified", "budget": 250000 })).unwrap();
        assert_eq!(updated.status, LeadStatus::Qualified);
        assert_eq!(updated.budget, Some(250000.0));
        assert_eq!(updated.email, lead.email);

        let err = apply_patch(&lead, &json!({ "email": "" })).unwrap_err();
        assert!(matches!(err, CrmError::Validation(v) if v.has_field("email")));

        let err = apply_patch(&lead, &json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, CrmError::BadRequest(_)));
    }
}
