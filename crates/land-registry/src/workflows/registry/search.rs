use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::RegistryStore;
use super::domain::{Location, Property, PropertyId, VerificationStatus};

/// Owner details as shown to the public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedOwner {
    pub name: String,
    pub nic: String,
}

/// What anyone may see about a registered property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicRecord {
    pub id: PropertyId,
    pub title: String,
    pub plot_number: String,
    pub survey_number: String,
    pub status: VerificationStatus,
    pub status_label: &'static str,
    pub registered_on: NaiveDate,
    pub verified_on: Option<NaiveDate>,
    pub token_id: String,
    pub owner: MaskedOwner,
    pub location: Location,
    pub land_area: String,
    pub property_type: &'static str,
}

impl From<&Property> for PublicRecord {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            title: property.title.clone(),
            plot_number: property.plot_number.clone(),
            survey_number: property.survey_number.clone(),
            status: property.status,
            status_label: property.status.label(),
            registered_on: property.registered_on,
            verified_on: property.verified_on,
            token_id: property.token_id.clone(),
            owner: MaskedOwner {
                name: mask_name(&property.owner.name),
                nic: mask_nic(&property.owner.nic),
            },
            location: property.location.clone(),
            land_area: property.land_area.to_string(),
            property_type: property.property_type.label(),
        }
    }
}

/// `John Doe` becomes `John D***`; a single name keeps only its initial.
pub fn mask_name(name: &str) -> String {
    let mut parts = name.split_whitespace();
    let Some(first) = parts.next() else {
        return String::new();
    };
    match parts.last().and_then(|last| last.chars().next()) {
        Some(initial) => format!("{first} {initial}***"),
        None => first
            .chars()
            .next()
            .map(|initial| format!("{initial}***"))
            .unwrap_or_default(),
    }
}

/// Keeps the first four and last three characters: `1990*****678`.
pub fn mask_nic(nic: &str) -> String {
    let chars: Vec<char> = nic.trim().chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 7))
}

/// Looks a property up by plot number, survey number, token id or numeric id.
pub fn search<S>(store: &S, query: &str) -> Option<PublicRecord>
where
    S: RegistryStore + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let numeric = query.parse::<u32>().ok().map(PropertyId);

    store
        .properties()
        .iter()
        .find(|property| {
            Some(property.id) == numeric
                || property.plot_number.eq_ignore_ascii_case(query)
                || property.survey_number.eq_ignore_ascii_case(query)
                || property.token_id.eq_ignore_ascii_case(query)
        })
        .map(PublicRecord::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::registry::catalog::RegistryCatalog;

    #[test]
    fn masks_match_the_public_portal() {
        assert_eq!(mask_name("John Doe"), "John D***");
        assert_eq!(mask_name("Nimal Kumara Perera"), "Nimal P***");
        assert_eq!(mask_name("Madonna"), "M***");
        assert_eq!(mask_name("   "), "");
        assert_eq!(mask_nic("199012345678"), "1990*****678");
        assert_eq!(mask_nic("851234567V"), "8512***67V");
        assert_eq!(mask_nic("1234"), "****");
    }

    #[test]
    fn finds_by_any_public_identifier() {
        let catalog = RegistryCatalog::seeded().expect("seed data");
        for query in ["col-07-2024-001", " SUR-2024-789 ", "0x1234...5678", "1"] {
            let record = search(&catalog, query).expect("property 1 matches");
            assert_eq!(record.id, PropertyId(1));
            assert_eq!(record.owner.name, "John D***");
            assert_eq!(record.owner.nic, "1990*****678");
        }
    }

    #[test]
    fn blank_and_unknown_queries_find_nothing() {
        let catalog = RegistryCatalog::seeded().expect("seed data");
        assert!(search(&catalog, "   ").is_none());
        assert!(search(&catalog, "XYZ-0000").is_none());
    }
}
