//! Semantic checks for tags.
//!
//! Structural checks happen during decode and encode. The checks here are
//! advisory: their findings are data, and a tag with errors still encodes.
//!
//! - [`validate`]: required fields that are missing (errors) and
//!   recommended fields that are missing (warnings).
//! - [`opt_check`]: present fields over their maximum length or with a
//!   malformed color (errors), and explicit UUIDs equal to the value that
//!   would be derived anyway (warnings).

use std::fmt;

use crate::model::{
    brand_uuid, material_uuid, package_uuid, FieldDescriptor, FieldValue, MainRegion, Region,
    RegionKind, Tag,
};

/// A finding about one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub region: RegionKind,
    pub key: u32,
    pub name: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(region: RegionKind, descriptor: &FieldDescriptor, message: impl Into<String>) -> Self {
        Self {
            region,
            key: descriptor.key,
            name: descriptor.name,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field {} ({}/{}) {}",
            self.name, self.region, self.key, self.message
        )
    }
}

/// Errors and warnings from a check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are neither errors nor warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Appends another report's findings.
    pub fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Checks every region for missing required and recommended fields.
pub fn validate(tag: &Tag) -> ValidationReport {
    let mut report = ValidationReport::new();
    validate_region(tag.meta(), &mut report);
    validate_region(tag.main(), &mut report);
    if let Some(aux) = tag.aux() {
        validate_region(aux, &mut report);
    }
    report
}

fn validate_region<R: Region>(region: &R, report: &mut ValidationReport) {
    for descriptor in R::FIELDS {
        if region.has_field(descriptor.key) {
            continue;
        }
        if descriptor.constraints.required {
            report
                .errors
                .push(ValidationIssue::new(R::KIND, descriptor, "is required"));
        }
        if descriptor.constraints.recommended {
            report
                .warnings
                .push(ValidationIssue::new(R::KIND, descriptor, "is recommended"));
        }
    }
}

// =============================================================================
// OPT CHECK
// =============================================================================

/// Checks present fields for length and color errors and flags explicit
/// UUIDs that could be derived instead.
pub fn opt_check(tag: &Tag) -> ValidationReport {
    let mut report = ValidationReport::new();
    opt_check_region(tag.meta(), &mut report);
    opt_check_region(tag.main(), &mut report);
    redundant_uuids(tag.main(), &mut report);
    if let Some(aux) = tag.aux() {
        opt_check_region(aux, &mut report);
    }
    report
}

fn opt_check_region<R: Region>(region: &R, report: &mut ValidationReport) {
    for (descriptor, value) in region.present_fields() {
        if let (Some(max), Some(len)) = (descriptor.constraints.max_length, value.length()) {
            if len > max {
                report.errors.push(ValidationIssue::new(
                    R::KIND,
                    descriptor,
                    format!(
                        "has length {} which exceeds maximum length of {} for this field",
                        len, max
                    ),
                ));
            }
        }
        if let FieldValue::Color(color) = &value {
            if !color.is_well_formed() {
                report.errors.push(ValidationIssue::new(
                    R::KIND,
                    descriptor,
                    format!(
                        "has length {} which is not valid for color fields (must be 3 or 4)",
                        color.as_bytes().len()
                    ),
                ));
            }
        }
    }
}

fn redundant_uuids(main: &MainRegion, report: &mut ValidationReport) {
    const REDUNDANT: &str =
        "is identical to the auto-generated version, and thus can be omitted to save space";
    let mut warn = |name: &str| {
        if let Some(descriptor) = MainRegion::descriptor_by_name(name) {
            report
                .warnings
                .push(ValidationIssue::new(RegionKind::Main, descriptor, REDUNDANT));
        }
    };

    if let (Some(name), Some(uuid)) = (&main.brand_name, main.brand_uuid) {
        if brand_uuid(name) == uuid {
            warn("brand_uuid");
        }
    }

    let brand = main
        .brand_uuid
        .or_else(|| main.brand_name.as_deref().map(brand_uuid));
    let Some(brand) = brand else {
        return;
    };
    if let (Some(name), Some(uuid)) = (&main.material_name, main.material_uuid) {
        if material_uuid(name, &brand) == uuid {
            warn("material_uuid");
        }
    }
    if let (Some(gtin), Some(uuid)) = (main.gtin, main.package_uuid) {
        if package_uuid(gtin, &brand) == uuid {
            warn("package_uuid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, MaterialClass, TagFlag};

    fn complete_tag() -> Tag {
        let mut tag = Tag::new();
        let main = tag.main_mut();
        main.material_class = Some(MaterialClass::FFF);
        main.brand_name = Some("Prusament".into());
        main.material_name = Some("PLA Prusa Galaxy Black".into());
        tag
    }

    #[test]
    fn test_required_and_recommended() {
        let report = validate(&Tag::new());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].to_string(),
            "field material_class (main/8) is required"
        );
        assert!(report
            .warnings
            .iter()
            .any(|w| w.name == "gtin" && w.message == "is recommended"));

        let report = validate(&complete_tag());
        assert!(!report.has_errors());
        assert!(report.warnings.iter().all(|w| w.name != "brand_name"));
    }

    #[test]
    fn test_aux_region_is_checked_only_when_present() {
        let mut tag = complete_tag();
        tag.aux_region_mut().workgroup = Some("123456789".into());
        let report = opt_check(&tag);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].region, RegionKind::Aux);

        tag.remove_aux_region();
        assert!(opt_check(&tag).errors.is_empty());
    }

    #[test]
    fn test_max_length() {
        let mut tag = complete_tag();
        tag.main_mut().country_of_origin = Some("CZE".into());
        tag.main_mut().tags = Some(vec![TagFlag::GLITTER; 17]);
        let report = opt_check(&tag);
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "field tags (main/28) has length 17 which exceeds maximum length of 16 for this field",
                "field country_of_origin (main/55) has length 3 which exceeds maximum length of 2 for this field",
            ]
        );
    }

    #[test]
    fn test_color_length() {
        let mut tag = complete_tag();
        tag.main_mut().primary_color = Some(Color::rgba(1, 2, 3, 4));
        tag.main_mut().secondary_color_0 = Some(Color::from_bytes(vec![1, 2]));
        let report = opt_check(&tag);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "secondary_color_0");
        assert!(report.errors[0].message.contains("has length 2"));
    }

    #[test]
    fn test_redundant_uuids() {
        let mut tag = complete_tag();
        assert!(opt_check(&tag).is_clean());

        let brand = brand_uuid("Prusament");
        let main = tag.main_mut();
        main.brand_uuid = Some(brand);
        main.material_uuid = Some(material_uuid("PLA Prusa Galaxy Black", &brand));
        main.gtin = Some(8594173675001);
        main.package_uuid = Some(package_uuid(8594173675001, &brand));
        let report = opt_check(&tag);
        let names: Vec<&str> = report.warnings.iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["brand_uuid", "material_uuid", "package_uuid"]);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_material_uuid_against_derived_brand() {
        let mut tag = complete_tag();
        let brand = brand_uuid("Prusament");
        tag.main_mut().material_uuid = Some(material_uuid("PLA Prusa Galaxy Black", &brand));
        let report = opt_check(&tag);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].name, "material_uuid");

        // A different explicit brand makes the material UUID meaningful.
        tag.main_mut().brand_uuid = Some(uuid::Uuid::nil());
        assert!(opt_check(&tag).warnings.is_empty());
    }
}
