//! The meta, main and aux region schemas.

use uuid::Uuid;

use crate::error::FieldError;
use crate::model::enums::{MaterialCertification, MaterialClass, MaterialType, TagFlag, WriteProtection};
use crate::model::field::{Color, Timestamp};
use crate::model::region::{Region, region_schema};
use crate::model::value::Value;

region_schema! {
    /// Layout region: where the main and aux regions start.
    ///
    /// Always at payload offset 0. The planner fills in offsets; callers
    /// rarely need to set these by hand.
    pub struct MetaRegion: Meta {
        0 => main_region_offset: u64,
        1 => main_region_size: u64,
        2 => aux_region_offset: u64,
        3 => aux_region_size: u64,
    }
}

region_schema! {
    /// Static material, brand and package data.
    pub struct MainRegion: Main {
        0 => instance_uuid: Uuid,
        1 => package_uuid: Uuid,
        2 => material_uuid: Uuid,
        3 => brand_uuid: Uuid,
        4 => gtin: u64 [recommended],
        5 => brand_specific_instance_id: String [max_length = 16],
        6 => brand_specific_package_id: String [max_length = 16],
        7 => brand_specific_material_id: String [max_length = 16],
        8 => material_class: MaterialClass [required],
        9 => material_type: MaterialType [recommended],
        10 => material_name: String [recommended, max_length = 31],
        11 => brand_name: String [recommended, max_length = 31],
        13 => write_protection: WriteProtection,
        14 => manufactured_date: Timestamp [recommended],
        15 => expiration_date: Timestamp,
        16 => nominal_netto_full_weight: f64 [recommended],
        17 => actual_netto_full_weight: f64 [recommended],
        18 => empty_container_weight: f64 [recommended],
        19 => primary_color: Color [recommended],
        20 => secondary_color_0: Color,
        21 => secondary_color_1: Color,
        22 => secondary_color_2: Color,
        23 => secondary_color_3: Color,
        24 => secondary_color_4: Color,
        27 => transmission_distance: f64,
        28 => tags: Vec<TagFlag> [recommended, max_length = 16],
        29 => density: f64 [recommended],
        30 => filament_diameter: f64,
        31 => shore_hardness_a: i64,
        32 => shore_hardness_d: i64,
        33 => min_nozzle_diameter: f64,
        34 => min_print_temperature: i64 [recommended],
        35 => max_print_temperature: i64 [recommended],
        36 => preheat_temperature: i64 [recommended],
        37 => min_bed_temperature: i64 [recommended],
        38 => max_bed_temperature: i64 [recommended],
        39 => min_chamber_temperature: i64,
        40 => max_chamber_temperature: i64,
        41 => chamber_temperature: i64,
        42 => container_width: i64,
        43 => container_outer_diameter: i64,
        44 => container_inner_diameter: i64,
        45 => container_hole_diameter: i64,
        46 => viscosity_18c: f64,
        47 => viscosity_25c: f64,
        48 => viscosity_40c: f64,
        49 => viscosity_60c: f64,
        50 => container_volumetric_capacity: f64,
        51 => cure_wavelength: i64,
        52 => material_abbreviation: String [max_length = 7],
        53 => nominal_full_length: f64,
        54 => actual_full_length: f64,
        55 => country_of_origin: String [max_length = 2],
        56 => certifications: Vec<MaterialCertification> [max_length = 8],
        57 => drying_temperature: i64,
        58 => drying_time: i64,
    }
}

region_schema! {
    /// Mutable usage data, rewritten independently of the main region.
    pub struct AuxRegion: Aux {
        0 => consumed_weight: f64,
        1 => workgroup: String [max_length = 8],
        2 => general_purpose_range_user: String [max_length = 8],
        3 => last_stir_time: Timestamp,
    }
}

impl AuxRegion {
    /// Sets a vendor-specific field.
    ///
    /// Vendor fields live with the unknowns and are never promoted to named
    /// fields, so the key must not collide with one.
    pub fn set_vendor_field(&mut self, key: i64, value: impl Into<Value>) -> Result<(), FieldError> {
        self.set_unknown(key, value.into())
    }

    pub fn vendor_field(&self, key: i64) -> Option<&Value> {
        self.unknown(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::EnumKind;
    use crate::model::field::{FieldKind, FieldValue};

    #[test]
    fn test_descriptor_tables() {
        assert_eq!(MetaRegion::FIELDS.len(), 4);
        assert_eq!(AuxRegion::FIELDS.len(), 4);

        let class = MainRegion::descriptor(8).unwrap();
        assert_eq!(class.name, "material_class");
        assert!(class.constraints.required);
        assert_eq!(class.kind, FieldKind::Enum(EnumKind::MaterialClass));

        let tags = MainRegion::descriptor_by_name("tags").unwrap();
        assert_eq!(tags.key, 28);
        assert_eq!(tags.constraints.max_length, Some(16));
        assert!(tags.constraints.recommended);

        assert!(MainRegion::descriptor(12).is_none());
    }

    fn assert_strictly_ascending<R: Region>() {
        for pair in R::FIELDS.windows(2) {
            assert!(
                pair[0].key < pair[1].key,
                "{} region: key {} ({}) listed before key {} ({})",
                R::KIND,
                pair[0].key,
                pair[0].name,
                pair[1].key,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_fields_in_key_order() {
        assert_strictly_ascending::<MetaRegion>();
        assert_strictly_ascending::<MainRegion>();
        assert_strictly_ascending::<AuxRegion>();
    }

    #[test]
    fn test_present_fields_in_key_order() {
        let mut main = MainRegion::default();
        main.certifications = Some(vec![MaterialCertification::UL_2818]);
        main.country_of_origin = Some("CZ".into());
        main.material_abbreviation = Some("PLA".into());
        main.material_name = Some("PLA Galaxy Black".into());
        let keys: Vec<u32> = main.present_fields().iter().map(|(d, _)| d.key).collect();
        assert_eq!(keys, vec![10, 52, 55, 56]);
    }

    #[test]
    fn test_field_access_by_key() {
        let mut main = MainRegion::default();
        main.material_name = Some("PLA Galaxy Black".to_string());
        assert_eq!(
            main.field(10),
            Some(FieldValue::Text("PLA Galaxy Black".to_string()))
        );
        assert!(main.has_field(10));

        main.set_field(34, FieldValue::Signed(205)).unwrap();
        assert_eq!(main.min_print_temperature, Some(205));

        assert!(main.set_field(34, FieldValue::Text("hot".into())).is_err());
        assert!(matches!(
            main.set_field(12, FieldValue::Unsigned(1)),
            Err(FieldError::NoSuchKey { key: 12, .. })
        ));

        assert!(main.clear_field(10));
        assert!(!main.clear_field(10));
    }

    #[test]
    fn test_field_by_name() {
        let mut main = MainRegion::default();
        main.set_field_from_str("primary_color", "#3d3e3d").unwrap();
        main.set_field_from_str("tags", "glitter, recycled").unwrap();
        main.set_field_from_str("material_class", "FFF").unwrap();

        assert_eq!(main.primary_color, Some(Color::rgb(0x3d, 0x3e, 0x3d)));
        assert_eq!(main.tags, Some(vec![TagFlag::GLITTER, TagFlag::RECYCLED]));
        assert_eq!(
            main.field_by_name("material_class").unwrap().unwrap().to_string(),
            "FFF"
        );
        assert!(matches!(
            main.field_by_name("colour"),
            Err(FieldError::NoSuchField { .. })
        ));
        assert!(matches!(
            main.set_field_from_str("primary_color", "blue"),
            Err(FieldError::InvalidColor { .. })
        ));
    }

    #[test]
    fn test_unknowns_cannot_shadow_fields() {
        let mut aux = AuxRegion::default();
        assert!(matches!(
            aux.set_vendor_field(1, "x"),
            Err(FieldError::KnownKey { key: 1, .. })
        ));
        aux.set_vendor_field(655300, vec![1u8, 2, 3]).unwrap();
        assert_eq!(aux.vendor_field(655300), Some(&Value::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_is_empty() {
        let mut meta = MetaRegion::default();
        assert!(meta.is_empty());
        meta.aux_region_offset = Some(226);
        assert!(!meta.is_empty());
    }
}
