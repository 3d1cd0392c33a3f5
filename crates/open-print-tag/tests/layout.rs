//! Fixed layout and accounting vectors for a 304-byte tag.
#![allow(clippy::unwrap_used)]

use open_print_tag::{
    Color, FloatPrecision, MaterialClass, MaterialType, RegionKind, RegionOptions, Tag, TagFlag,
    Timestamp,
};
use uuid::uuid;

fn galaxy_black() -> Tag {
    let mut tag = Tag::new().with_size(304).with_aux_region_size(32);
    let main = tag.main_mut();
    main.instance_uuid = Some(uuid!("473bb8cd-e129-45b8-9fcf-da1c3add9c47"));
    main.brand_specific_material_id = Some("1".into());
    main.material_class = Some(MaterialClass::FFF);
    main.material_type = Some(MaterialType::PLA);
    main.material_name = Some("PLA Galaxy Black".into());
    main.brand_name = Some("Prusament".into());
    main.manufactured_date = Some(Timestamp::from_unix(1739371290));
    main.nominal_netto_full_weight = Some(1000.0);
    main.actual_netto_full_weight = Some(1012.0);
    main.empty_container_weight = Some(100.0);
    main.primary_color = Some("#3d3e3d".parse::<Color>().unwrap());
    main.transmission_distance = Some(0.2);
    main.tags = Some(vec![TagFlag::GLITTER]);
    main.min_print_temperature = Some(205);
    main.max_print_temperature = Some(220);
    main.preheat_temperature = Some(170);
    main.min_bed_temperature = Some(40);
    main.max_bed_temperature = Some(60);
    main.max_chamber_temperature = Some(40);
    main.chamber_temperature = Some(20);
    main.container_width = Some(75);
    main.options = RegionOptions::MAIN.with_float_precision(FloatPrecision::P16);
    tag
}

#[test]
fn region_offsets() {
    let mut tag = galaxy_black();
    let image = tag.encode().unwrap();
    assert_eq!(image.len(), 304);

    let stats = tag.stats().unwrap();
    assert_eq!(stats.meta.payload_offset, 0);
    assert_eq!(stats.meta.absolute_offset, 42);
    assert_eq!(stats.meta.size, 4);
    assert_eq!(stats.meta.used_size, 4);

    assert_eq!(stats.main.payload_offset, 4);
    assert_eq!(stats.main.absolute_offset, 46);
    assert_eq!(stats.main.size, 222);
    assert_eq!(stats.main.used_size, 119);

    let aux = stats.aux.unwrap();
    assert_eq!(aux.payload_offset, 226);
    assert_eq!(aux.absolute_offset, 268);
    assert_eq!(aux.size, 35);
    assert_eq!(aux.used_size, 1);
}

#[test]
fn root_accounting() {
    let mut tag = galaxy_black();
    tag.encode().unwrap();
    let root = tag.stats().unwrap().root;
    assert_eq!(root.data_size, 304);
    assert_eq!(root.payload_size, 261);
    assert_eq!(root.overhead, 43);
    assert_eq!(root.payload_used_size, 124);
    assert_eq!(root.total_used_size, 167);
}

#[test]
fn image_bytes_at_region_boundaries() {
    let mut tag = galaxy_black();
    let image = tag.encode().unwrap();

    // capability container, extended TLV header, tag record header
    assert_eq!(&image[..8], &[0xE1, 0x40, 0x26, 0x01, 0x03, 0xFF, 0x01, 0x27]);
    assert_eq!(&image[8..14], &[0xC2, 0x1C, 0x00, 0x00, 0x01, 0x05]);
    assert_eq!(&image[14..42], b"application/vnd.openprinttag");

    // meta records the aux offset, main is an indefinite map
    assert_eq!(&image[42..46], &[0xA1, 0x02, 0x18, 0xE2]);
    assert_eq!(image[46], 0xBF);
    assert_eq!(image[46 + 118], 0xFF);
    assert!(image[46 + 119..268].iter().all(|&b| b == 0));
    assert_eq!(image[268], 0xA0);
    assert_eq!(image[303], 0xFE);
}

#[test]
fn decoded_tag_matches() {
    let mut tag = galaxy_black();
    let image = tag.encode().unwrap();
    let decoded = Tag::decode(&image).unwrap();

    let main = decoded.main();
    assert_eq!(main.material_name.as_deref(), Some("PLA Galaxy Black"));
    assert_eq!(main.manufactured_date, Some(Timestamp::from_unix(1739371290)));
    assert_eq!(main.actual_netto_full_weight, Some(1012.0));
    assert_eq!(main.tags, Some(vec![TagFlag::GLITTER]));
    let distance = main.transmission_distance.unwrap();
    assert!((distance - 0.2).abs() / 0.2 < 0.001);

    assert_eq!(decoded.size(), 304);
    assert_eq!(decoded.aux_region_size(), 32);
    // options are not on the wire
    assert_eq!(main.options, RegionOptions::MAIN);
    assert_eq!(decoded.meta().aux_region_offset, Some(226));
    assert!(decoded.stats().is_none());
    assert_eq!(
        decoded.aux().map(|aux| aux.options),
        Some(RegionOptions::default_for(RegionKind::Aux))
    );
}
