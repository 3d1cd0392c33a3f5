//! Deterministic UUIDs for brands, materials, packages and tag instances.
//!
//! All of them are RFC 4122 version 5 (SHA-1, name-based) UUIDs under fixed
//! namespaces, so a UUID field that equals its derived value carries no
//! information and can be left off the tag.

use uuid::{Uuid, uuid};

use crate::error::FieldError;

/// Namespace of brand UUIDs.
pub const BRAND_NAMESPACE: Uuid = uuid!("5269dfb7-1559-440a-85be-aba5f3eff2d2");

/// Namespace of material UUIDs.
pub const MATERIAL_NAMESPACE: Uuid = uuid!("616fc86d-7d99-4953-96c7-46d2836b9be9");

/// Namespace of package UUIDs.
pub const PACKAGE_NAMESPACE: Uuid = uuid!("6f7d485e-db8d-4979-904e-a231cd6602b2");

/// Namespace of package instance UUIDs.
pub const INSTANCE_NAMESPACE: Uuid = uuid!("31062f81-b5bd-4f86-a5f8-46367e841508");

/// First byte of every valid NFC-V tag UID.
const NFC_V_UID_PREFIX: u8 = 0x0E;

/// Derives a brand UUID from the brand name.
///
/// ```text
/// brand_uuid = uuid_v5(BRAND_NAMESPACE, brand_name)
/// ```
pub fn brand_uuid(brand_name: &str) -> Uuid {
    Uuid::new_v5(&BRAND_NAMESPACE, brand_name.as_bytes())
}

/// Derives a material UUID from the material name and its brand's UUID.
///
/// ```text
/// material_uuid = uuid_v5(MATERIAL_NAMESPACE, brand_uuid || material_name)
/// ```
pub fn material_uuid(material_name: &str, brand: &Uuid) -> Uuid {
    Uuid::new_v5(&MATERIAL_NAMESPACE, &prefixed(brand, material_name.as_bytes()))
}

/// Derives a package UUID from the GTIN and its brand's UUID.
///
/// ```text
/// package_uuid = uuid_v5(PACKAGE_NAMESPACE, brand_uuid || decimal(gtin))
/// ```
pub fn package_uuid(gtin: u64, brand: &Uuid) -> Uuid {
    Uuid::new_v5(&PACKAGE_NAMESPACE, &prefixed(brand, gtin.to_string().as_bytes()))
}

/// Derives a package instance UUID from the NFC tag's UID.
///
/// The UID must be 8 bytes and start with `0x0E`.
pub fn instance_uuid(nfc_tag_uid: &[u8]) -> Result<Uuid, FieldError> {
    if nfc_tag_uid.len() != 8 {
        return Err(FieldError::InvalidTagUid {
            reason: "should be 8 bytes long",
        });
    }
    if nfc_tag_uid[0] != NFC_V_UID_PREFIX {
        return Err(FieldError::InvalidTagUid {
            reason: "should start with 0x0E",
        });
    }
    Ok(Uuid::new_v5(&INSTANCE_NAMESPACE, nfc_tag_uid))
}

fn prefixed(brand: &Uuid, name: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(16 + name.len());
    input.extend_from_slice(brand.as_bytes());
    input.extend_from_slice(name);
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_uuid() {
        assert_eq!(
            brand_uuid("Prusament"),
            uuid!("ae5ff34e-298e-50c9-8f77-92a97fb30b09")
        );
        assert_eq!(brand_uuid("Prusament").get_version_num(), 5);
    }

    #[test]
    fn test_material_and_package_uuid() {
        let brand = brand_uuid("Prusament");
        assert_eq!(
            material_uuid("PLA Prusa Galaxy Black", &brand),
            uuid!("1aaca54a-431f-5601-adf5-85dd018f487f")
        );
        assert_eq!(
            package_uuid(8594173675001, &brand),
            uuid!("6e0aece2-1daf-5f2a-ba20-697968ec7d14")
        );
    }

    #[test]
    fn test_instance_uuid() {
        let uid = [0x0E, 1, 2, 3, 4, 5, 6, 7];
        assert_eq!(
            instance_uuid(&uid).unwrap(),
            uuid!("c41b1ab0-d1c3-5739-8674-a401f631b4a3")
        );
        assert!(matches!(
            instance_uuid(&uid[..7]),
            Err(FieldError::InvalidTagUid { .. })
        ));
        assert!(matches!(
            instance_uuid(&[0xE0, 1, 2, 3, 4, 5, 6, 7]),
            Err(FieldError::InvalidTagUid { .. })
        ));
    }
}
