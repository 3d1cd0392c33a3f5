//! Field-wise merging of one tag into another.
//!
//! Only named fields of the main and aux regions take part. Unknowns, the
//! meta region and region options stay as they are on the target, except
//! for the aux placement a newly created aux region adopts from the source.

use crate::model::{Region, Tag};

/// Copies every field set on `source` into `target`.
///
/// With `overwrite` a source field replaces the target's value; without it
/// only fields unset on the target are filled. The aux region is merged only
/// when `source` has one. If `target` has none, an empty one is created
/// first, and the source's recorded aux offset and allotment are adopted
/// where the target has none of its own.
pub fn merge(target: &mut Tag, source: &Tag, overwrite: bool) {
    merge_region(&mut target.main, &source.main, overwrite);

    let Some(source_aux) = &source.aux else {
        return;
    };
    if target.aux.is_none() {
        if target.meta.aux_region_offset.is_none() {
            target.meta.aux_region_offset = source.meta.aux_region_offset;
        }
        if target.aux_region_size == 0 {
            target.aux_region_size = source.aux_region_size;
        }
    }
    let target_aux = target.aux.get_or_insert_with(Default::default);
    merge_region(target_aux, source_aux, overwrite);
}

fn merge_region<R: Region>(target: &mut R, source: &R, overwrite: bool) {
    for descriptor in R::FIELDS {
        let key = descriptor.key;
        if source.has_field(key) && (overwrite || !target.has_field(key)) {
            target.copy_field(source, key);
        }
    }
}

impl Tag {
    /// Merges `source` into this tag. See [`merge`].
    pub fn merge(&mut self, source: &Tag, overwrite: bool) {
        merge(self, source, overwrite);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaterialClass, Value};

    fn pair() -> (Tag, Tag) {
        let mut target = Tag::new();
        target.main_mut().material_name = Some("target name".into());
        target.main_mut().brand_name = Some("target brand".into());

        let mut source = Tag::new();
        source.main_mut().material_name = Some("source name".into());
        source.main_mut().material_class = Some(MaterialClass::SLA);
        (target, source)
    }

    #[test]
    fn test_merge_without_overwrite() {
        let (mut target, source) = pair();
        target.merge(&source, false);
        let main = target.main();
        assert_eq!(main.material_name.as_deref(), Some("target name"));
        assert_eq!(main.brand_name.as_deref(), Some("target brand"));
        assert_eq!(main.material_class, Some(MaterialClass::SLA));
    }

    #[test]
    fn test_merge_with_overwrite() {
        let (mut target, source) = pair();
        target.merge(&source, true);
        let main = target.main();
        assert_eq!(main.material_name.as_deref(), Some("source name"));
        assert_eq!(main.brand_name.as_deref(), Some("target brand"));
        assert_eq!(main.material_class, Some(MaterialClass::SLA));
    }

    #[test]
    fn test_unset_source_fields_do_not_clear() {
        let (mut target, _) = pair();
        target.merge(&Tag::new(), true);
        assert_eq!(target.main().material_name.as_deref(), Some("target name"));
        assert!(target.aux().is_none());
    }

    #[test]
    fn test_aux_region_created_with_placement() {
        let (mut target, mut source) = pair();
        source = source.with_aux_region_size(32);
        source.meta_mut().aux_region_offset = Some(226);
        source.aux_region_mut().consumed_weight = Some(50.0);

        target.merge(&source, false);
        assert_eq!(target.aux().unwrap().consumed_weight, Some(50.0));
        assert_eq!(target.meta().aux_region_offset, Some(226));
        assert_eq!(target.aux_region_size(), 32);
    }

    #[test]
    fn test_existing_aux_keeps_placement() {
        let (target, mut source) = pair();
        let mut target = target.with_aux_region_size(40);
        target.meta_mut().aux_region_offset = Some(200);
        target.aux_region_mut().workgroup = Some("lab".into());

        source = source.with_aux_region_size(32);
        source.meta_mut().aux_region_offset = Some(226);
        source.aux_region_mut().workgroup = Some("shop".into());

        target.merge(&source, false);
        assert_eq!(target.meta().aux_region_offset, Some(200));
        assert_eq!(target.aux_region_size(), 40);
        assert_eq!(target.aux().unwrap().workgroup.as_deref(), Some("lab"));
    }

    #[test]
    fn test_unknowns_are_not_merged() {
        let (mut target, mut source) = pair();
        source.main_mut().set_unknown(99, Value::Unsigned(1)).unwrap();
        target.merge(&source, true);
        assert!(target.main().unknowns().is_empty());
    }
}
