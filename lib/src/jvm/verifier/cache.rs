use super::{ClassResolver, ClassRoot, RegType, RegTypeKind};
use crate::jvm::class_graph::{ClassId, ClassLoaderId};
use crate::jvm::{is_valid_descriptor, BaseType};
use crate::util::BitVector;
use elsa::FrozenVec;
use std::fmt;
use typed_arena::Arena;

pub const MIN_SMALL_CONSTANT: i32 = -1;
pub const MAX_SMALL_CONSTANT: i32 = 4;

pub const BOOLEAN_CACHE_ID: u16 = (MAX_SMALL_CONSTANT - MIN_SMALL_CONSTANT + 1) as u16;
pub const BYTE_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 1;
pub const SHORT_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 2;
pub const CHAR_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 3;
pub const INT_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 4;
pub const LONG_LO_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 5;
pub const LONG_HI_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 6;
pub const FLOAT_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 7;
pub const DOUBLE_LO_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 8;
pub const DOUBLE_HI_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 9;
pub const UNDEFINED_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 10;
pub const CONFLICT_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 11;
pub const NULL_CACHE_ID: u16 = BOOLEAN_CACHE_ID + 12;

/// Number of entries every cache starts out with
pub const NUM_PRIMITIVES_AND_SMALL_CONSTANTS: usize = NULL_CACHE_ID as usize + 1;

/// Settings for how a cache resolves classes
#[derive(Copy, Clone, Debug)]
pub struct CacheSettings {
    /// Can resolving a descriptor trigger loading and linking of classes?
    ///
    /// When disabled, only classes that are already loaded _and_ resolved are used, and
    /// everything else becomes an unresolved reference.
    pub can_load_classes: bool,

    /// Is the thread using the cache allowed to block? Loading classes requires this.
    pub can_suspend: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            can_load_classes: true,
            can_suspend: true,
        }
    }
}

/// Storage for register types and the descriptors they reference
pub struct RegTypeArenas<'r, 'g> {
    types: Arena<RegType<'r, 'g>>,
    strings: Arena<u8>,
}

impl<'r, 'g> RegTypeArenas<'r, 'g> {
    pub fn new() -> Self {
        RegTypeArenas {
            types: Arena::new(),
            strings: Arena::new(),
        }
    }
}

impl<'r, 'g> Default for RegTypeArenas<'r, 'g> {
    fn default() -> Self {
        RegTypeArenas::new()
    }
}

/// Class (or descriptor, when unresolved) that an uninitialized type is keyed on
#[derive(Copy, Clone)]
enum Allocated<'a, 'g> {
    Class(ClassId<'g>),
    Unresolved(&'a str),
}

/// What makes an existing cache entry interchangeable with one about to be created
///
/// Every constructor of the cache first looks for an entry matching its key, so that the cache
/// never contains two entries with the same meaning.
#[derive(Copy, Clone)]
enum EntryKey<'a, 'r, 'g> {
    /// Reference (resolved or not) with this descriptor
    Descriptor { descriptor: &'a str, precise: bool },

    /// Resolved reference to this class
    Class { klass: ClassId<'g>, precise: bool },

    /// Imprecise reference to exactly this class
    ImpreciseClass(ClassId<'g>),

    /// Precise reference to exactly this class
    PreciseClass(ClassId<'g>),

    UnresolvedDescriptor(&'a str),
    Constant { value: i32, precise: bool },
    ConstantLo { value: i32, precise: bool },
    ConstantHi { value: i32, precise: bool },
    Uninitialized { allocation_pc: u32, allocated: Allocated<'a, 'g> },
    UninitializedThis(Allocated<'a, 'g>),
    UnresolvedSuperClass { child_id: u16 },
    UnresolvedMerged {
        resolved_part: &'r RegType<'r, 'g>,
        unresolved_types: &'a BitVector,
    },
}

/// Does a reference entry for a class satisfy a request with the given precision?
///
/// An imprecise request can still be answered by a precise entry, when the class can't be
/// assigned from anything other than itself. The converse does not hold.
fn matching_precision_for_class(entry: &RegType<'_, '_>, klass: ClassId<'_>, precise: bool) -> bool {
    entry.is_precise_reference() == precise
        || (!precise && klass.cannot_be_assigned_from_other_types())
}

impl<'a, 'r, 'g> EntryKey<'a, 'r, 'g> {
    fn matches(&self, entry: &RegType<'r, 'g>) -> bool {
        match *self {
            EntryKey::Descriptor {
                descriptor,
                precise,
            } => {
                if entry.is_unresolved_reference() {
                    // There are no precise unresolved references
                    entry.descriptor() == descriptor
                } else if entry.is_reference() || entry.is_precise_reference() {
                    entry.descriptor() == descriptor
                        && entry.class().map_or(false, |klass| {
                            matching_precision_for_class(entry, klass, precise)
                        })
                } else {
                    false
                }
            }
            EntryKey::Class { klass, precise } => {
                (entry.is_reference() || entry.is_precise_reference())
                    && entry.class() == Some(klass)
                    && matching_precision_for_class(entry, klass, precise)
            }
            EntryKey::ImpreciseClass(klass) => {
                entry.is_reference() && entry.class() == Some(klass)
            }
            EntryKey::PreciseClass(klass) => {
                entry.is_precise_reference() && entry.class() == Some(klass)
            }
            EntryKey::UnresolvedDescriptor(descriptor) => {
                entry.is_unresolved_reference() && entry.descriptor() == descriptor
            }
            EntryKey::Constant { value, precise } => {
                matches!(*entry.kind(), RegTypeKind::Constant { value: v, precise: p } if v == value && p == precise)
            }
            EntryKey::ConstantLo { value, precise } => {
                matches!(*entry.kind(), RegTypeKind::ConstantLo { value: v, precise: p } if v == value && p == precise)
            }
            EntryKey::ConstantHi { value, precise } => {
                matches!(*entry.kind(), RegTypeKind::ConstantHi { value: v, precise: p } if v == value && p == precise)
            }
            EntryKey::Uninitialized {
                allocation_pc,
                allocated: Allocated::Class(klass),
            } => match *entry.kind() {
                RegTypeKind::UninitializedReference { allocation_pc: pc } => {
                    pc == allocation_pc && entry.class() == Some(klass)
                }
                _ => false,
            },
            EntryKey::Uninitialized {
                allocation_pc,
                allocated: Allocated::Unresolved(descriptor),
            } => match *entry.kind() {
                RegTypeKind::UnresolvedUninitializedReference { allocation_pc: pc } => {
                    pc == allocation_pc && entry.descriptor() == descriptor
                }
                _ => false,
            },
            EntryKey::UninitializedThis(Allocated::Class(klass)) => {
                entry.is_uninitialized_this_reference() && entry.class() == Some(klass)
            }
            EntryKey::UninitializedThis(Allocated::Unresolved(descriptor)) => {
                entry.is_unresolved_and_uninitialized_this_reference()
                    && entry.descriptor() == descriptor
            }
            EntryKey::UnresolvedSuperClass { child_id } => entry
                .unresolved_super_class_child()
                .map_or(false, |child| child.id() == child_id),
            EntryKey::UnresolvedMerged {
                resolved_part,
                unresolved_types,
            } => match entry.kind() {
                RegTypeKind::UnresolvedMerged {
                    resolved_part: other_resolved_part,
                    unresolved_types: other_unresolved_types,
                    ..
                } => {
                    other_resolved_part.equals(resolved_part)
                        && other_unresolved_types.same_bits_set(unresolved_types)
                }
                _ => false,
            },
        }
    }
}

/// Creates, deduplicates, and owns the register types of one verification pass
///
/// The cache starts out with a fixed set of entries (small precise constants, primitive types,
/// `Undefined`, `Conflict`, and `null`) at well-known ids, then only ever grows: entries are
/// never removed or modified, and their ids never change. Creating a type always starts by
/// looking for an existing entry with the same meaning, so two types from the same cache are
/// equal exactly when their ids are.
///
/// Class handles are owned by the [`ClassResolver`] (which must therefore outlive the cache),
/// and descriptors are copied into the cache's own string arena.
pub struct RegTypeCache<'r, 'g> {
    arenas: &'r RegTypeArenas<'r, 'g>,
    resolver: &'r dyn ClassResolver<'g>,
    settings: CacheSettings,

    /// All entries, indexed by cache id
    entries: FrozenVec<&'r RegType<'r, 'g>>,

    /// Entries that have a (non-primitive) class
    klass_entries: FrozenVec<&'r RegType<'r, 'g>>,
}

impl<'r, 'g> RegTypeCache<'r, 'g> {
    pub fn new(
        arenas: &'r RegTypeArenas<'r, 'g>,
        resolver: &'r dyn ClassResolver<'g>,
        settings: CacheSettings,
    ) -> RegTypeCache<'r, 'g> {
        debug_assert!(
            settings.can_suspend || !settings.can_load_classes,
            "Cannot load classes if suspension is disabled"
        );
        let cache = RegTypeCache {
            arenas,
            resolver,
            settings,
            entries: FrozenVec::new(),
            klass_entries: FrozenVec::new(),
        };
        cache.fill_primitive_and_small_constant_types();
        cache
    }

    fn fill_primitive_and_small_constant_types(&self) {
        for value in MIN_SMALL_CONSTANT..=MAX_SMALL_CONSTANT {
            self.add_entry(RegTypeKind::Constant { value, precise: true }, "", None);
        }

        let primitives = [
            (RegTypeKind::Boolean, BaseType::Boolean),
            (RegTypeKind::Byte, BaseType::Byte),
            (RegTypeKind::Short, BaseType::Short),
            (RegTypeKind::Char, BaseType::Char),
            (RegTypeKind::Integer, BaseType::Int),
            (RegTypeKind::LongLo, BaseType::Long),
            (RegTypeKind::LongHi, BaseType::Long),
            (RegTypeKind::Float, BaseType::Float),
            (RegTypeKind::DoubleLo, BaseType::Double),
            (RegTypeKind::DoubleHi, BaseType::Double),
        ];
        for (kind, base_type) in primitives {
            let klass = self.resolver.class_root(ClassRoot::Primitive(base_type));
            self.add_entry(kind, klass.0.descriptor.as_str(), Some(klass));
        }

        self.add_entry(RegTypeKind::Undefined, "", None);
        self.add_entry(RegTypeKind::Conflict, "", None);
        self.add_entry(RegTypeKind::Null, "", None);
        debug_assert_eq!(self.entries.len(), NUM_PRIMITIVES_AND_SMALL_CONSTANTS);
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    pub fn resolver(&self) -> &'r dyn ClassResolver<'g> {
        self.resolver
    }

    pub fn can_load_classes(&self) -> bool {
        self.settings.can_load_classes
    }

    /// Number of entries in the cache (and the id the next entry will get)
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn get_from_id(&self, id: u16) -> &'r RegType<'r, 'g> {
        self.entries
            .get_copy(id as usize)
            .expect("register type id from a different cache")
    }

    /// Entries in the order they were added (so also in order of cache id)
    pub fn entries(&self) -> impl Iterator<Item = &'r RegType<'r, 'g>> + '_ {
        (0..self.entries.len()).filter_map(move |idx| self.entries.get_copy(idx))
    }

    /// Call `visitor` on every class referenced by an entry of the cache
    pub fn visit_classes(&self, mut visitor: impl FnMut(ClassId<'g>)) {
        for idx in 0..self.klass_entries.len() {
            if let Some(klass) = self.klass_entries.get_copy(idx).and_then(RegType::class) {
                visitor(klass);
            }
        }
    }

    /// Copy a string into memory owned by the cache
    pub fn add_string(&self, string: &str) -> &'r str {
        self.arenas.strings.alloc_str(string)
    }

    fn add_entry(
        &self,
        kind: RegTypeKind<'r, 'g>,
        descriptor: &'r str,
        klass: Option<ClassId<'g>>,
    ) -> &'r RegType<'r, 'g> {
        let cache_id = self.entries.len();
        assert!(
            cache_id <= u16::MAX as usize,
            "Too many register types in one cache"
        );
        let entry: &'r RegType<'r, 'g> =
            self.arenas
                .types
                .alloc(RegType::new(kind, descriptor, klass, cache_id as u16));
        log::trace!("Added register type {:?}", entry);

        self.entries.push(entry);
        if let Some(klass) = klass {
            if !klass.is_primitive() {
                self.klass_entries.push(entry);
            }
        }
        entry
    }

    /// Look for an existing entry with the same meaning as `key`
    ///
    /// The fixed entries are never considered, since they have dedicated accessors.
    fn find_entry(&self, key: EntryKey<'_, 'r, 'g>) -> Option<&'r RegType<'r, 'g>> {
        (NUM_PRIMITIVES_AND_SMALL_CONSTANTS..self.entries.len())
            .filter_map(|idx| self.entries.get_copy(idx))
            .find(|entry| key.matches(entry))
    }

    pub fn boolean(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(BOOLEAN_CACHE_ID)
    }

    pub fn byte(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(BYTE_CACHE_ID)
    }

    pub fn short(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(SHORT_CACHE_ID)
    }

    pub fn char(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(CHAR_CACHE_ID)
    }

    pub fn integer(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(INT_CACHE_ID)
    }

    pub fn float(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(FLOAT_CACHE_ID)
    }

    pub fn long_lo(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(LONG_LO_CACHE_ID)
    }

    pub fn long_hi(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(LONG_HI_CACHE_ID)
    }

    pub fn double_lo(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(DOUBLE_LO_CACHE_ID)
    }

    pub fn double_hi(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(DOUBLE_HI_CACHE_ID)
    }

    pub fn undefined(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(UNDEFINED_CACHE_ID)
    }

    pub fn conflict(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(CONFLICT_CACHE_ID)
    }

    pub fn null(&self) -> &'r RegType<'r, 'g> {
        self.get_from_id(NULL_CACHE_ID)
    }

    /// The precise constant `0`
    pub fn zero(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(0, true)
    }

    /// Imprecise constant standing for any `byte`
    pub fn byte_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(i8::MIN.into(), false)
    }

    /// Imprecise constant standing for any `char`
    pub fn char_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(u16::MAX.into(), false)
    }

    /// Imprecise constant standing for any `short`
    pub fn short_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(i16::MIN.into(), false)
    }

    /// Imprecise constant standing for any `int`
    pub fn int_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(i32::MAX, false)
    }

    /// Imprecise constant standing for any non-negative `byte`
    pub fn pos_byte_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(i8::MAX.into(), false)
    }

    /// Imprecise constant standing for any non-negative `short`
    pub fn pos_short_constant(&self) -> &'r RegType<'r, 'g> {
        self.from_cat1_const(i16::MAX.into(), false)
    }

    pub fn java_lang_object(&self, precise: bool) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::Object), precise)
    }

    /// `java.lang.String`, which is final and so always precise
    pub fn java_lang_string(&self) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::String), true)
    }

    pub fn java_lang_class(&self) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::Class), true)
    }

    pub fn java_lang_throwable(&self, precise: bool) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::Throwable), precise)
    }

    pub fn java_lang_invoke_method_handle(&self) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::MethodHandle), true)
    }

    pub fn java_lang_invoke_method_type(&self) -> &'r RegType<'r, 'g> {
        self.from_class(self.resolver.class_root(ClassRoot::MethodType), true)
    }

    pub fn reg_type_from_primitive_type(&self, base_type: BaseType) -> &'r RegType<'r, 'g> {
        match base_type {
            BaseType::Boolean => self.boolean(),
            BaseType::Byte => self.byte(),
            BaseType::Short => self.short(),
            BaseType::Char => self.char(),
            BaseType::Int => self.integer(),
            BaseType::Long => self.long_lo(),
            BaseType::Float => self.float(),
            BaseType::Double => self.double_lo(),
        }
    }

    /// Type of a value with the given field descriptor
    ///
    /// Primitive descriptors ignore `precise` (and the loader). Void and malformed descriptors
    /// produce `Conflict`.
    pub fn from_descriptor(
        &self,
        loader: ClassLoaderId<'g>,
        descriptor: &str,
        precise: bool,
    ) -> &'r RegType<'r, 'g> {
        let mut chars = descriptor.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => match BaseType::from_descriptor_char(c) {
                Some(base_type) => self.reg_type_from_primitive_type(base_type),
                None => self.conflict(),
            },
            (Some('L'), Some(_)) | (Some('['), Some(_)) => self.from(loader, descriptor, precise),
            _ => self.conflict(),
        }
    }

    /// Reference type for a class or array descriptor
    ///
    /// If the class can't be resolved, the result is an unresolved reference (or `Conflict` if
    /// the descriptor itself is malformed).
    pub fn from(
        &self,
        loader: ClassLoaderId<'g>,
        descriptor: &str,
        precise: bool,
    ) -> &'r RegType<'r, 'g> {
        if let Some(entry) = self.find_entry(EntryKey::Descriptor {
            descriptor,
            precise,
        }) {
            return entry;
        }

        if let Some(klass) = self.resolve_class(descriptor, loader) {
            debug_assert!(!precise || klass.is_instantiable());
            let descriptor = self.add_string(descriptor);
            let kind = if klass.cannot_be_assigned_from_other_types() || precise {
                debug_assert!(!klass.is_abstract() || klass.is_array_class());
                debug_assert!(!klass.is_interface());
                RegTypeKind::PreciseReference
            } else {
                RegTypeKind::Reference
            };
            self.add_entry(kind, descriptor, Some(klass))
        } else if is_valid_descriptor(descriptor) {
            let descriptor = self.add_string(descriptor);
            self.add_entry(RegTypeKind::UnresolvedReference, descriptor, None)
        } else {
            self.conflict()
        }
    }

    fn resolve_class(&self, descriptor: &str, loader: ClassLoaderId<'g>) -> Option<ClassId<'g>> {
        if self.settings.can_load_classes {
            match self.resolver.find_class(descriptor, loader) {
                Ok(klass) => Some(klass),
                Err(err) => {
                    log::debug!("Treating {} as unresolved: {}", descriptor, err);
                    None
                }
            }
        } else {
            // Classes that are loaded but not resolved aren't safe to use
            self.resolver
                .lookup_class(descriptor, loader)
                .filter(|klass| klass.is_resolved())
        }
    }

    /// Fresh unresolved reference, which is never equal to any other type
    pub fn make_unresolved_reference(&self) -> &'r RegType<'r, 'g> {
        // Not a valid descriptor, so no lookup will ever find this
        self.add_entry(RegTypeKind::UnresolvedReference, "a", None)
    }

    /// Find an existing type for the class with a compatible precision
    pub fn find_class(&self, klass: ClassId<'g>, precise: bool) -> Option<&'r RegType<'r, 'g>> {
        // All primitive classes are final, so precision doesn't matter
        if let Some(base_type) = klass.primitive_type {
            return Some(self.reg_type_from_primitive_type(base_type));
        }
        let key = EntryKey::Class { klass, precise };
        (0..self.klass_entries.len())
            .filter_map(|idx| self.klass_entries.get_copy(idx))
            .find(|entry| key.matches(entry))
    }

    /// Add a new type for the class (which must not already have one)
    pub fn insert_class(&self, klass: ClassId<'g>, precise: bool) -> &'r RegType<'r, 'g> {
        debug_assert!(self.find_class(klass, precise).is_none());
        let kind = if precise {
            RegTypeKind::PreciseReference
        } else {
            RegTypeKind::Reference
        };
        self.add_entry(kind, klass.0.descriptor.as_str(), Some(klass))
    }

    pub fn from_class(&self, klass: ClassId<'g>, precise: bool) -> &'r RegType<'r, 'g> {
        match self.find_class(klass, precise) {
            Some(entry) => entry,
            None => self.insert_class(klass, precise),
        }
    }

    /// Constant `int` (or `float`) value
    ///
    /// Only precise constants populate the small constant range, so those never allocate.
    pub fn from_cat1_const(&self, value: i32, precise: bool) -> &'r RegType<'r, 'g> {
        debug_assert!(value != 0 || precise, "zero is always precise");
        if precise && (MIN_SMALL_CONSTANT..=MAX_SMALL_CONSTANT).contains(&value) {
            self.get_from_id((value - MIN_SMALL_CONSTANT) as u16)
        } else {
            self.from_cat1_non_small_constant(value, precise)
        }
    }

    pub fn from_cat1_non_small_constant(&self, value: i32, precise: bool) -> &'r RegType<'r, 'g> {
        match self.find_entry(EntryKey::Constant { value, precise }) {
            Some(entry) => entry,
            None => self.add_entry(RegTypeKind::Constant { value, precise }, "", None),
        }
    }

    /// Low half of a constant `long` (or `double`)
    pub fn from_cat2_const_lo(&self, value: i32, precise: bool) -> &'r RegType<'r, 'g> {
        match self.find_entry(EntryKey::ConstantLo { value, precise }) {
            Some(entry) => entry,
            None => self.add_entry(RegTypeKind::ConstantLo { value, precise }, "", None),
        }
    }

    /// High half of a constant `long` (or `double`)
    pub fn from_cat2_const_hi(&self, value: i32, precise: bool) -> &'r RegType<'r, 'g> {
        match self.find_entry(EntryKey::ConstantHi { value, precise }) {
            Some(entry) => entry,
            None => self.add_entry(RegTypeKind::ConstantHi { value, precise }, "", None),
        }
    }

    /// Value freshly allocated by the `new` at `allocation_pc`, not yet initialized
    ///
    /// Allocations at different program counters always get different types, even for the same
    /// class, since they get initialized independently.
    pub fn uninitialized(
        &self,
        reg_type: &RegType<'r, 'g>,
        allocation_pc: u32,
    ) -> &'r RegType<'r, 'g> {
        let allocated = match self.allocated(reg_type) {
            Some(allocated) => allocated,
            None => return self.conflict(),
        };
        let key = EntryKey::Uninitialized {
            allocation_pc,
            allocated,
        };
        if let Some(entry) = self.find_entry(key) {
            return entry;
        }
        match allocated {
            Allocated::Class(klass) => self.add_entry(
                RegTypeKind::UninitializedReference { allocation_pc },
                reg_type.descriptor(),
                Some(klass),
            ),
            Allocated::Unresolved(descriptor) => self.add_entry(
                RegTypeKind::UnresolvedUninitializedReference { allocation_pc },
                descriptor,
                None,
            ),
        }
    }

    /// Type of `this` at the start of a constructor
    pub fn uninitialized_this_argument(&self, reg_type: &RegType<'r, 'g>) -> &'r RegType<'r, 'g> {
        let allocated = match self.allocated(reg_type) {
            Some(allocated) => allocated,
            None => return self.conflict(),
        };
        if let Some(entry) = self.find_entry(EntryKey::UninitializedThis(allocated)) {
            return entry;
        }
        match allocated {
            Allocated::Class(klass) => self.add_entry(
                RegTypeKind::UninitializedThisReference,
                reg_type.descriptor(),
                Some(klass),
            ),
            Allocated::Unresolved(descriptor) => self.add_entry(
                RegTypeKind::UnresolvedUninitializedThisReference,
                descriptor,
                None,
            ),
        }
    }

    /// What an uninitialized type for `reg_type` is keyed on (`None` if there can't be one)
    fn allocated(&self, reg_type: &RegType<'r, 'g>) -> Option<Allocated<'r, 'g>> {
        if reg_type.is_unresolved_types() {
            if reg_type.is_unresolved_merged_reference() || reg_type.is_unresolved_super_class() {
                log::warn!("Cannot allocate an instance of {}", reg_type);
                None
            } else {
                Some(Allocated::Unresolved(reg_type.descriptor()))
            }
        } else {
            match reg_type.class() {
                Some(klass) if !klass.is_primitive() => Some(Allocated::Class(klass)),
                _ => {
                    log::warn!("Cannot allocate an instance of {}", reg_type);
                    None
                }
            }
        }
    }

    /// Type of a value once its constructor has run
    ///
    /// Objects from `new` are exactly of the allocated class, so they become precise references
    /// (even when the class is abstract: instantiation errors are reported elsewhere). A `this`
    /// argument may belong to a subclass, so it only becomes precise if its class is final.
    pub fn from_uninitialized(&self, uninit_type: &RegType<'r, 'g>) -> &'r RegType<'r, 'g> {
        if uninit_type.is_unresolved_types() {
            let descriptor = uninit_type.descriptor();
            match self.find_entry(EntryKey::UnresolvedDescriptor(descriptor)) {
                Some(entry) => entry,
                None => self.add_entry(RegTypeKind::UnresolvedReference, descriptor, None),
            }
        } else {
            let klass = match uninit_type.class() {
                Some(klass) if !klass.is_primitive() => klass,
                _ => return self.conflict(),
            };
            let (key, kind) =
                if uninit_type.is_uninitialized_this_reference() && !klass.is_final() {
                    (EntryKey::ImpreciseClass(klass), RegTypeKind::Reference)
                } else {
                    (EntryKey::PreciseClass(klass), RegTypeKind::PreciseReference)
                };
            match self.find_entry(key) {
                Some(entry) => entry,
                None => self.add_entry(kind, uninit_type.descriptor(), Some(klass)),
            }
        }
    }

    /// Placeholder for the superclass of an unresolved type
    pub fn from_unresolved_super_class(&self, child: &'r RegType<'r, 'g>) -> &'r RegType<'r, 'g> {
        let key = EntryKey::UnresolvedSuperClass {
            child_id: child.id(),
        };
        match self.find_entry(key) {
            Some(entry) => entry,
            None => self.add_entry(RegTypeKind::UnresolvedSuperClass { child }, "", None),
        }
    }

    /// Merge of two reference types, at least one of which is unresolved
    ///
    /// The resolved parts of both sides get merged normally, and the unresolved parts get
    /// accumulated into a set of cache ids. Unresolved arrays only stay merged alongside a
    /// resolved array of references: any other mix falls back to `java.lang.Object`.
    pub fn from_unresolved_merge(
        &self,
        left: &'r RegType<'r, 'g>,
        right: &'r RegType<'r, 'g>,
    ) -> &'r RegType<'r, 'g> {
        let mut unresolved_types = BitVector::with_capacity(64);
        let (left_resolved, left_unresolved_is_array) =
            self.split_unresolved(left, &mut unresolved_types);
        let (right_resolved, right_unresolved_is_array) =
            self.split_unresolved(right, &mut unresolved_types);

        // An unresolved part can't make up for a conflict in the resolved parts
        let resolved_parts_merged = left_resolved.safe_merge(right_resolved, self);
        if resolved_parts_merged.is_conflict() {
            return self.conflict();
        }
        // `Object` needs no unresolved part. A failed class join yields a fresh unresolved
        // reference that is never deduplicated, so it can't serve as a resolved part.
        if resolved_parts_merged.is_java_lang_object()
            || resolved_parts_merged.is_unresolved_reference()
        {
            return resolved_parts_merged;
        }

        let resolved_merged_is_array = resolved_parts_merged.is_array_types();
        if left_unresolved_is_array || right_unresolved_is_array || resolved_merged_is_array {
            // Primitive arrays only share `java.lang.Object` with other types
            if resolved_merged_is_array && !resolved_parts_merged.is_object_array_types() {
                return self.java_lang_object(false);
            }

            // Arrays and non-arrays (including a missing resolved part) only share `Object`
            let left_has_non_array = !left_unresolved_is_array && !left_resolved.equals(left);
            let right_has_non_array = !right_unresolved_is_array && !right_resolved.equals(right);
            if left_has_non_array || right_has_non_array || !resolved_merged_is_array {
                return self.java_lang_object(false);
            }
        }

        let key = EntryKey::UnresolvedMerged {
            resolved_part: resolved_parts_merged,
            unresolved_types: &unresolved_types,
        };
        if let Some(entry) = self.find_entry(key) {
            return entry;
        }

        // Both parts agree on being arrays (or there would have been a fallback to `Object`)
        let is_array = resolved_merged_is_array
            && unresolved_types
                .highest_bit_set()
                .map_or(false, |id| self.get_from_id(id as u16).is_array_types());
        self.add_entry(
            RegTypeKind::UnresolvedMerged {
                resolved_part: resolved_parts_merged,
                unresolved_types,
                is_array,
            },
            "",
            None,
        )
    }

    /// Split a type into its resolved part (returned) and its unresolved part (added to
    /// `unresolved_types`), also returning whether the unresolved part is an array
    fn split_unresolved(
        &self,
        reg_type: &'r RegType<'r, 'g>,
        unresolved_types: &mut BitVector,
    ) -> (&'r RegType<'r, 'g>, bool) {
        match reg_type.kind() {
            RegTypeKind::UnresolvedMerged {
                resolved_part,
                unresolved_types: merged_types,
                is_array,
            } => {
                unresolved_types.union(merged_types);
                (*resolved_part, *is_array)
            }
            _ if reg_type.is_unresolved_types() => {
                unresolved_types.set_bit(reg_type.id() as usize);
                (self.zero(), reg_type.is_array_types())
            }
            _ => (reg_type, false),
        }
    }

    /// Type of the elements of an array type (`Conflict` for non-arrays)
    pub fn get_component_type(
        &self,
        array: &RegType<'r, 'g>,
        loader: ClassLoaderId<'g>,
    ) -> &'r RegType<'r, 'g> {
        if !array.is_array_types() || array.is_unresolved_merged_reference() {
            self.conflict()
        } else if array.is_unresolved_types() {
            self.from_descriptor(loader, &array.descriptor()[1..], false)
        } else {
            let component = match array.class().and_then(|klass| klass.0.component_type) {
                Some(component) => component,
                None => return self.conflict(),
            };
            if component.is_erroneous() {
                // Primitive classes are never erroneous, so this is a reference
                self.from_descriptor(loader, &component.0.descriptor, false)
            } else {
                self.from_class(component, component.cannot_be_assigned_from_other_types())
            }
        }
    }
}

impl<'r, 'g> fmt::Display for RegTypeCache<'r, 'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries() {
            writeln!(f, "{}: {}", entry.id(), entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::{ClassData, ClassGraph, ClassGraphArenas, ClassStatus};
    use crate::jvm::{BinaryName, ClassAccessFlags, Name};

    #[test]
    fn bootstrap() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        assert_eq!(cache.num_entries(), NUM_PRIMITIVES_AND_SMALL_CONSTANTS);
        assert_eq!(NUM_PRIMITIVES_AND_SMALL_CONSTANTS, 19);
        for value in MIN_SMALL_CONSTANT..=MAX_SMALL_CONSTANT {
            let constant = cache.get_from_id((value - MIN_SMALL_CONSTANT) as u16);
            assert_eq!(constant.constant_value(), Some(value));
            assert!(constant.is_precise_constant());
        }
        assert!(cache.boolean().is_boolean() && cache.boolean().id() == 6);
        assert!(cache.integer().is_integer() && cache.integer().id() == 10);
        assert!(cache.long_hi().is_long_hi() && cache.long_hi().id() == 12);
        assert!(cache.float().is_float() && cache.float().id() == 13);
        assert!(cache.null().is_null() && cache.null().id() == 18);
        assert_eq!(cache.char().class(), Some(class_graph.java().primitives.char));
        assert_eq!(cache.long_hi().class(), Some(class_graph.java().primitives.long));
        assert_eq!(cache.conflict().class(), None);

        let mut visited = 0;
        cache.visit_classes(|_| visited += 1);
        assert_eq!(visited, 0, "primitive classes aren't class entries");
    }

    #[test]
    fn descriptors() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let app = class_graph.add_loader("app", boot);
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        for (descriptor, expected) in [
            ("Z", cache.boolean()),
            ("B", cache.byte()),
            ("S", cache.short()),
            ("C", cache.char()),
            ("I", cache.integer()),
            ("J", cache.long_lo()),
            ("F", cache.float()),
            ("D", cache.double_lo()),
        ] {
            assert!(cache.from_descriptor(boot, descriptor, true).equals(expected));
            assert!(cache.from_descriptor(app, descriptor, false).equals(expected));
        }
        assert!(cache.from_descriptor(boot, "V", false).is_conflict());
        assert!(cache.from_descriptor(boot, "Q", false).is_conflict());
        assert!(cache.from_descriptor(boot, "", false).is_conflict());
        assert!(cache.from_descriptor(boot, "II", false).is_conflict());

        let entries = cache.num_entries();
        assert!(cache.from_descriptor(boot, "Ljava/lang/String", false).is_conflict());
        assert!(cache.from_descriptor(boot, "[V", false).is_conflict());
        assert_eq!(cache.num_entries(), entries, "malformed descriptors aren't cached");

        let number = cache.from_descriptor(boot, "Ljava/lang/Number;", false);
        assert!(number.is_reference());
        assert!(number.equals(cache.from_descriptor(app, "Ljava/lang/Number;", false)));
        let precise_number = cache.from_descriptor(boot, "Ljava/lang/Integer;", true);
        assert!(precise_number.is_precise_reference());
    }

    #[test]
    fn precision_relaxation() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        // Imprecise requests accept a precise entry for a class that can't be subclassed
        let string = cache.java_lang_string();
        assert!(string.equals(cache.from_descriptor(boot, "Ljava/lang/String;", false)));
        assert!(string.equals(cache.from_class(class_graph.java().lang.string, false)));

        // Precise requests never accept an imprecise entry
        let object = cache.java_lang_object(false);
        let precise_object = cache.java_lang_object(true);
        assert!(!object.equals(precise_object));
        assert!(precise_object.is_precise_reference());
        assert!(precise_object.equals(cache.from_descriptor(boot, "Ljava/lang/Object;", true)));
        assert!(object.equals(cache.from_descriptor(boot, "Ljava/lang/Object;", false)));

        let mut visited = vec![];
        cache.visit_classes(|klass| visited.push(klass));
        assert_eq!(
            visited,
            vec![
                class_graph.java().lang.string,
                class_graph.java().lang.object,
                class_graph.java().lang.object
            ]
        );
    }

    #[test]
    fn load_free_resolution() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let loaded = class_graph.add_class(ClassData::new(
            boot,
            BinaryName::from_string(String::from("me/Loaded")).unwrap(),
            class_graph.java().lang.object,
            ClassAccessFlags::class(),
        ));

        let arenas = RegTypeArenas::new();
        let settings = CacheSettings {
            can_load_classes: false,
            can_suspend: false,
        };
        let cache = RegTypeCache::new(&arenas, &class_graph, settings);

        let unresolved = cache.from_descriptor(boot, "Lme/Loaded;", false);
        assert!(unresolved.is_unresolved_reference(), "loaded but not resolved");
        assert_eq!(loaded.status(), ClassStatus::Loaded, "no linking happened");

        assert!(cache.from_descriptor(boot, "Ljava/lang/Number;", false).is_reference());
        assert!(
            cache.from_descriptor(boot, "[I", false).is_unresolved_reference(),
            "array classes aren't created"
        );
    }

    #[test]
    fn constants() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        let entries = cache.num_entries();
        for value in MIN_SMALL_CONSTANT..=MAX_SMALL_CONSTANT {
            cache.from_cat1_const(value, true);
        }
        assert_eq!(cache.num_entries(), entries, "small constants are preallocated");

        let imprecise_one = cache.from_cat1_const(1, false);
        assert!(imprecise_one.is_imprecise_constant());
        assert!(!imprecise_one.equals(cache.from_cat1_const(1, true)));
        assert!(imprecise_one.equals(cache.from_cat1_const(1, false)));

        let big = cache.from_cat1_const(1000, true);
        assert!(big.equals(cache.from_cat1_const(1000, true)));
        assert!(!big.equals(cache.from_cat1_const(1000, false)));

        let lo = cache.from_cat2_const_lo(1000, true);
        let hi = cache.from_cat2_const_hi(1000, true);
        assert!(!lo.equals(hi) && !lo.equals(big));
        assert!(lo.equals(cache.from_cat2_const_lo(1000, true)));
        assert!(hi.equals(cache.from_cat2_const_hi(1000, true)));
        assert!(!hi.equals(cache.from_cat2_const_hi(1000, false)));

        assert_eq!(cache.byte_constant().constant_value(), Some(-128));
        assert_eq!(cache.char_constant().constant_value(), Some(65535));
        assert_eq!(cache.short_constant().constant_value(), Some(-32768));
        assert_eq!(cache.int_constant().constant_value(), Some(i32::MAX));
        assert_eq!(cache.pos_byte_constant().constant_value(), Some(127));
        assert_eq!(cache.pos_short_constant().constant_value(), Some(32767));
        assert!(cache.pos_short_constant().is_imprecise_constant());
    }

    #[test]
    fn uninitialized_types() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        let number = cache.from_descriptor(boot, "Ljava/lang/Number;", false);
        let first = cache.uninitialized(number, 4);
        let second = cache.uninitialized(number, 10);
        assert!(first.is_uninitialized_reference());
        assert!(!first.equals(second), "different allocation sites");
        assert!(first.equals(cache.uninitialized(number, 4)));
        assert_eq!(second.allocation_pc(), Some(10));

        let this = cache.uninitialized_this_argument(number);
        assert!(this.is_uninitialized_this_reference());
        assert!(this.equals(cache.uninitialized_this_argument(number)));
        assert!(cache.from_uninitialized(this).equals(number), "non-final this");
        let initialized = cache.from_uninitialized(first);
        assert!(initialized.is_precise_reference());
        assert_eq!(initialized.class(), number.class());
        assert!(initialized.equals(cache.from_uninitialized(second)));

        let missing = cache.from_descriptor(boot, "Lme/Missing;", false);
        let uninit_missing = cache.uninitialized(missing, 4);
        assert!(uninit_missing.is_unresolved_and_uninitialized_reference());
        assert!(uninit_missing.equals(cache.uninitialized(missing, 4)));
        assert!(cache.from_uninitialized(uninit_missing).equals(missing));
        let this_missing = cache.uninitialized_this_argument(missing);
        assert!(this_missing.is_unresolved_and_uninitialized_this_reference());
        assert!(cache.from_uninitialized(this_missing).equals(missing));

        assert!(cache.uninitialized(cache.integer(), 4).is_conflict());
        assert!(cache.from_uninitialized(cache.integer()).is_conflict());
    }

    #[test]
    fn component_types() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let broken = class_graph.add_class(ClassData::new(
            boot,
            BinaryName::from_string(String::from("me/Broken")).unwrap(),
            class_graph.java().lang.object,
            ClassAccessFlags::class(),
        ));
        let broken_array = class_graph.array_class(broken);
        broken.set_status(ClassStatus::Erroneous);

        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        let int_matrix = cache.from_descriptor(boot, "[[I", false);
        let int_array = cache.get_component_type(int_matrix, boot);
        assert!(int_array.is_precise_reference());
        assert_eq!(int_array.descriptor(), "[I");
        assert!(cache.get_component_type(int_array, boot).equals(cache.integer()));

        let number_array = cache.from_descriptor(boot, "[Ljava/lang/Number;", false);
        assert!(cache
            .get_component_type(number_array, boot)
            .equals(cache.from_descriptor(boot, "Ljava/lang/Number;", false)));

        let missing_array = cache.from_descriptor(boot, "[Lme/Missing;", false);
        let missing = cache.get_component_type(missing_array, boot);
        assert!(missing.is_unresolved_reference());
        assert_eq!(missing.descriptor(), "Lme/Missing;");

        let broken_array = cache.from_class(broken_array, false);
        assert!(cache
            .get_component_type(broken_array, boot)
            .is_unresolved_reference());

        assert!(cache.get_component_type(cache.integer(), boot).is_conflict());
        assert!(cache.get_component_type(cache.null(), boot).is_conflict());
    }

    #[test]
    fn unresolved_references() {
        let class_arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&class_arenas);
        let boot = class_graph.boot_loader();
        let arenas = RegTypeArenas::new();
        let cache = RegTypeCache::new(&arenas, &class_graph, CacheSettings::default());

        let fresh = cache.make_unresolved_reference();
        assert!(fresh.is_unresolved_reference());
        assert!(!fresh.equals(cache.make_unresolved_reference()));
        assert!(cache.from_descriptor(boot, "a", false).is_conflict());

        let dump = cache.to_string();
        assert!(dump.starts_with("0: Precise Constant: -1\n1: Precise Zero/null\n"));
        assert!(dump.contains("18: null\n"));
    }
}
