use regtypes::jvm::class_graph::{ClassData, ClassGraph, ClassGraphArenas, ClassStatus};
use regtypes::jvm::verifier::{CacheSettings, RegType, RegTypeArenas, RegTypeCache};
use regtypes::jvm::{BinaryName, ClassAccessFlags, Name};

const PRIMITIVE_DESCRIPTORS: &str = "ZBSCIJFD";

/// Assortment of types covering every family that can show up in a register
fn sample_types<'r, 'g>(
    cache: &RegTypeCache<'r, 'g>,
    class_graph: &ClassGraph<'g>,
) -> Vec<&'r RegType<'r, 'g>> {
    let boot = class_graph.boot_loader();
    let mut types = vec![
        cache.zero(),
        cache.from_cat1_const(1, true),
        cache.from_cat1_const(-1, true),
        cache.from_cat1_const(300, true),
        cache.from_cat1_const(300, false),
        cache.from_cat1_const(-40000, false),
        cache.from_cat1_const(70000, true),
        cache.from_cat2_const_lo(7, true),
        cache.from_cat2_const_hi(0, true),
        cache.boolean(),
        cache.byte(),
        cache.short(),
        cache.char(),
        cache.integer(),
        cache.float(),
        cache.long_lo(),
        cache.long_hi(),
        cache.double_lo(),
        cache.double_hi(),
        cache.null(),
        cache.java_lang_object(false),
        cache.java_lang_string(),
        cache.java_lang_throwable(false),
        cache.java_lang_throwable(true),
    ];
    for descriptor in [
        "Ljava/lang/Number;",
        "Ljava/lang/Integer;",
        "Ljava/lang/RuntimeException;",
        "Ljava/lang/Comparable;",
        "[I",
        "[J",
        "[Ljava/lang/String;",
        "[Ljava/lang/Object;",
        "[[Ljava/lang/Integer;",
        "Lcom/example/Missing;",
        "Lcom/example/Absent;",
        "[Lcom/example/Missing;",
    ] {
        types.push(cache.from_descriptor(boot, descriptor, false));
    }

    let string = cache.java_lang_string();
    let missing = cache.from_descriptor(boot, "Lcom/example/Missing;", false);
    let absent = cache.from_descriptor(boot, "Lcom/example/Absent;", false);
    let missing_array = cache.from_descriptor(boot, "[Lcom/example/Missing;", false);
    let strings = cache.from_descriptor(boot, "[Ljava/lang/String;", false);
    types.extend([
        missing.merge(absent, cache),
        string.merge(missing, cache),
        missing_array.merge(strings, cache),
        cache.from_descriptor(boot, "[Lcom/example/Absent;", false),
        cache.from_unresolved_super_class(missing),
        cache.uninitialized(string, 4),
        cache.uninitialized(missing, 8),
        cache.uninitialized_this_argument(string),
    ]);
    types
}

#[test]
fn descriptors_are_deduplicated() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    for descriptor in [
        "Ljava/lang/String;",
        "Ljava/lang/Number;",
        "[I",
        "[[Ljava/lang/Object;",
        "Lcom/example/Missing;",
        "[Lcom/example/Missing;",
    ] {
        let first = cache.from_descriptor(boot, descriptor, false);
        let entries = cache.num_entries();
        let second = cache.from_descriptor(boot, descriptor, false);
        assert!(first.equals(second), "{} resolved twice", descriptor);
        assert_eq!(cache.num_entries(), entries);
    }

    for descriptor in ["Ljava/lang/Throwable;", "Ljava/lang/String;", "[J"] {
        let first = cache.from_descriptor(boot, descriptor, true);
        let second = cache.from_descriptor(boot, descriptor, true);
        assert!(first.equals(second), "{} resolved twice", descriptor);
    }
}

#[test]
fn primitives_ignore_precision_and_loader() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let child = class_graph.add_loader("child", boot);
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let entries = cache.num_entries();
    for descriptor in PRIMITIVE_DESCRIPTORS.chars() {
        let descriptor = descriptor.to_string();
        let imprecise_boot = cache.from_descriptor(boot, &descriptor, false);
        let precise_child = cache.from_descriptor(child, &descriptor, true);
        assert!(imprecise_boot.equals(precise_child), "{}", descriptor);
        assert!(imprecise_boot.primitive_type().is_some(), "{}", descriptor);
    }
    assert_eq!(cache.num_entries(), entries, "primitives are bootstrap entries");
    assert!(cache.from_descriptor(boot, "V", false).is_conflict());
}

#[test]
fn classes_resolve_through_loaders() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let child = class_graph.add_loader("child", boot);
    let shape = class_graph.add_class(ClassData::new(
        child,
        BinaryName::from_string(String::from("me/Shape")).unwrap(),
        class_graph.java().lang.object,
        ClassAccessFlags::class(),
    ));
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let resolved = cache.from_descriptor(child, "Lme/Shape;", false);
    assert!(resolved.is_reference());
    assert_eq!(resolved.class(), Some(shape));
    assert_eq!(shape.status(), ClassStatus::Resolved);

    let string = cache.from_descriptor(child, "Ljava/lang/String;", false);
    assert!(string.equals(cache.java_lang_string()), "delegated to the boot loader");

    let mut classes = vec![];
    cache.visit_classes(|klass| classes.push(klass));
    assert!(classes.contains(&shape));
}

#[test]
fn merge_is_commutative() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());
    let types = sample_types(&cache, &class_graph);

    for &a in &types {
        for &b in &types {
            if a.equals(b) {
                continue;
            }
            let ab = a.merge(b, &cache);
            let ba = b.merge(a, &cache);
            assert!(ab.equals(ba), "{} | {} gave {} and {}", a, b, ab, ba);
        }
    }
}

#[test]
fn merge_with_self_is_identity() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    for reg_type in sample_types(&cache, &class_graph) {
        assert!(reg_type.safe_merge(reg_type, &cache).equals(reg_type), "{}", reg_type);
    }
    let conflict = cache.conflict();
    assert!(conflict.safe_merge(conflict, &cache).is_conflict());
}

#[test]
fn conflict_absorbs_references() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());
    let conflict = cache.conflict();

    for descriptor in [
        "Ljava/lang/Object;",
        "Ljava/lang/String;",
        "Ljava/lang/Number;",
        "Ljava/lang/Throwable;",
    ] {
        let reg_type = cache.from_descriptor(boot, descriptor, false);
        assert!(reg_type.merge(conflict, &cache).is_conflict(), "{}", descriptor);
        assert!(conflict.merge(reg_type, &cache).is_conflict(), "{}", descriptor);
    }
}

#[test]
fn merging_with_super_classes_stays_assignable() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());
    let object = cache.java_lang_object(false);

    for descriptor in [
        "Ljava/lang/Integer;",
        "Ljava/lang/RuntimeException;",
        "[Ljava/lang/String;",
        "Lcom/example/Missing;",
    ] {
        let reg_type = cache.from_descriptor(boot, descriptor, false);
        let mut super_class = reg_type.super_class(&cache);
        while !super_class.is_zero() && !super_class.is_conflict() {
            let merged = reg_type.safe_merge(super_class, &cache);
            assert!(!merged.is_conflict(), "{} | {}", reg_type, super_class);
            assert!(object.is_assignable_from(merged), "{} | {}", reg_type, super_class);
            if super_class.is_unresolved_super_class() {
                // Placeholders only ever lead to more placeholders
                break;
            }
            assert!(merged.is_assignable_from(reg_type), "{} | {}", reg_type, super_class);
            super_class = super_class.super_class(&cache);
        }
    }
}

#[test]
fn uninitialized_round_trip() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let exception = cache.from_descriptor(boot, "Ljava/lang/RuntimeException;", false);
    assert!(exception.is_reference());

    // Objects from `new` are exactly of the allocated class
    let allocated = cache.uninitialized(exception, 4);
    assert!(allocated.is_uninitialized_reference());
    assert_eq!(allocated.allocation_pc(), Some(4));
    let initialized = cache.from_uninitialized(allocated);
    assert!(initialized.is_precise_reference());
    assert_eq!(initialized.class(), exception.class());
    assert!(initialized.equals(cache.from_descriptor(
        boot,
        "Ljava/lang/RuntimeException;",
        true
    )));

    // `this` might be a subclass
    let this = cache.uninitialized_this_argument(exception);
    assert!(this.is_uninitialized_this_reference());
    assert!(cache.from_uninitialized(this).equals(exception));

    let missing = cache.from_descriptor(boot, "Lcom/example/Missing;", false);
    let allocated_missing = cache.uninitialized(missing, 9);
    assert!(allocated_missing.is_unresolved_and_uninitialized_reference());
    assert!(cache.from_uninitialized(allocated_missing).equals(missing));
}

#[test]
fn small_constants_never_allocate() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let entries = cache.num_entries();
    for value in -1..=4 {
        let first = cache.from_cat1_const(value, true);
        let second = cache.from_cat1_const(value, true);
        assert!(first.equals(second));
        assert_eq!(first.constant_value(), Some(value));
        assert_eq!(first.id() as i32, value + 1);
    }
    assert_eq!(cache.num_entries(), entries);

    let zero = cache.from_cat1_const(0, true);
    assert!(zero.equals(cache.from_cat1_const(0, true)));
    assert!(zero.is_zero() && zero.is_zero_or_null());
}

#[test]
fn unresolved_merges_union_their_sets() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let a = cache.from_descriptor(boot, "Lcom/example/A;", false);
    let b = cache.from_descriptor(boot, "Lcom/example/B;", false);
    let c = cache.from_descriptor(boot, "Lcom/example/C;", false);

    let ab = a.merge(b, &cache);
    let bc = b.merge(c, &cache);
    assert!(ab.is_unresolved_merged_reference() && bc.is_unresolved_merged_reference());
    assert!(ab.resolved_part().unwrap().equals(bc.resolved_part().unwrap()));

    let abc = ab.merge(bc, &cache);
    assert!(abc.resolved_part().unwrap().is_zero());
    let ids: Vec<usize> = abc.unresolved_types().unwrap().indexes().collect();
    let mut expected = vec![a.id() as usize, b.id() as usize, c.id() as usize];
    expected.sort_unstable();
    assert_eq!(ids, expected);
    assert!(abc.equals(a.merge(bc, &cache)), "same parts give the same type");

    // A resolved part is carried along
    let string = cache.java_lang_string();
    let with_string = string.merge(a, &cache).merge(b, &cache);
    assert!(with_string.resolved_part().unwrap().equals(string));
    assert!(with_string.equals(ab.merge(string, &cache)));
    assert!(!with_string.is_array_types());

    // Unresolved arrays don't mix with anything but arrays of references
    let missing_array = cache.from_descriptor(boot, "[Lcom/example/A;", false);
    let strings = cache.from_descriptor(boot, "[Ljava/lang/String;", false);
    let ints = cache.from_descriptor(boot, "[I", false);
    let arrays = missing_array.merge(strings, &cache);
    assert!(arrays.is_unresolved_merged_reference() && arrays.is_array_types());
    assert!(missing_array.merge(ints, &cache).is_java_lang_object());
    assert!(missing_array.merge(a, &cache).is_java_lang_object());
    assert!(missing_array.merge(string, &cache).is_java_lang_object());

    // Without a resolved array of references there's nothing to keep the arrays together
    let other_missing_array = cache.from_descriptor(boot, "[Lcom/example/B;", false);
    let entries = cache.num_entries();
    assert!(missing_array.merge(other_missing_array, &cache).is_java_lang_object());
    assert!(other_missing_array.merge(missing_array, &cache).is_java_lang_object());
    assert_eq!(cache.num_entries(), entries);
    assert!(arrays.merge(other_missing_array, &cache).is_array_types());
    assert!(arrays.merge(ab, &cache).is_java_lang_object());
}

#[test]
fn missing_class_scenario() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let boot = class_graph.boot_loader();
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let missing = cache.from_descriptor(boot, "Lcom/example/Missing;", false);
    assert!(missing.is_unresolved_reference());
    assert_eq!(missing.descriptor(), "Lcom/example/Missing;");
    assert!(missing.equals(cache.from_descriptor(boot, "Lcom/example/Missing;", false)));
    assert_eq!(missing.to_string(), "Unresolved Reference: com.example.Missing");
}

#[test]
fn wide_pairs_must_match() {
    let class_arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&class_arenas);
    let arenas = RegTypeArenas::new();
    let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

    let long_lo = cache.long_lo();
    let double_lo = cache.double_lo();
    assert!(!long_lo.check_wide_pair(cache.double_hi()));
    assert!(!double_lo.check_wide_pair(cache.long_hi()));
    assert!(long_lo.check_wide_pair(cache.long_hi()));
    assert!(double_lo.check_wide_pair(cache.double_hi()));

    let merged = long_lo.merge(double_lo, &cache);
    assert!(merged.is_conflict());
    assert!(!merged.check_wide_pair(cache.long_hi()));
}
