use super::RegTypeCache;
use crate::jvm::class_graph::ClassId;
use crate::jvm::{pretty_descriptor, BaseType};
use crate::util::BitVector;
use std::fmt;

/// Variant of a register type, along with any data specific to that variant
#[derive(Debug)]
pub enum RegTypeKind<'r, 'g> {
    /// Register that was never written on some incoming path
    ///
    /// Merging anything with this yields [`RegTypeKind::Conflict`].
    Undefined,

    /// Bottom of the lattice: the register holds values that can't be used together
    Conflict,

    Boolean,
    Byte,
    Short,
    Char,
    Integer,
    Float,

    /// Halves of a 64-bit value, each occupying its own register
    LongLo,
    LongHi,
    DoubleLo,
    DoubleHi,

    /// 32-bit constant
    ///
    /// An imprecise constant only stands for a range of values: anything that fits in the same
    /// integral types as `value`.
    Constant { value: i32, precise: bool },

    /// Low half of a 64-bit constant
    ConstantLo { value: i32, precise: bool },

    /// High half of a 64-bit constant
    ConstantHi { value: i32, precise: bool },

    /// The `null` literal
    Null,

    /// Some instance of the class, possibly of a subclass
    Reference,

    /// Exactly an instance of the class
    PreciseReference,

    /// Result of `new`, before the constructor has been called
    UninitializedReference { allocation_pc: u32 },

    /// `this` in a constructor, before the super constructor has been called
    UninitializedThisReference,

    UnresolvedUninitializedReference { allocation_pc: u32 },
    UnresolvedUninitializedThisReference,

    /// Reference to a class that could not be resolved, only known by its descriptor
    UnresolvedReference,

    /// Whatever the superclass of an unresolved type turns out to be
    UnresolvedSuperClass { child: &'r RegType<'r, 'g> },

    /// Join of unresolved types (by cache id) and a resolved part (zero if there is none)
    UnresolvedMerged {
        resolved_part: &'r RegType<'r, 'g>,
        unresolved_types: BitVector,
        is_array: bool,
    },
}

/// Type of the value held in a register, as tracked by the verifier
///
/// Register types are created and owned by a [`RegTypeCache`]. Within one cache, two types are
/// the same if and only if they have the same cache id (see [`RegType::equals`]), so handles can
/// be compared cheaply.
pub struct RegType<'r, 'g> {
    kind: RegTypeKind<'r, 'g>,

    /// Descriptor of the type, empty for constants and synthetic types
    descriptor: &'r str,

    klass: Option<ClassId<'g>>,
    cache_id: u16,
}

/// How values flow into a register of a given type
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AssignmentType {
    Boolean,
    Byte,
    Short,
    Char,
    Integer,
    Float,
    LongLo,
    DoubleLo,
    Conflict,
    Reference,
    NotAssignable,
}

impl<'r, 'g> RegType<'r, 'g> {
    pub(super) fn new(
        kind: RegTypeKind<'r, 'g>,
        descriptor: &'r str,
        klass: Option<ClassId<'g>>,
        cache_id: u16,
    ) -> RegType<'r, 'g> {
        let reg_type = RegType {
            kind,
            descriptor,
            klass,
            cache_id,
        };
        debug_assert!(
            reg_type.check_invariants(),
            "Malformed register type {:?}",
            reg_type
        );
        reg_type
    }

    fn check_invariants(&self) -> bool {
        if self.klass.is_some() != self.has_class_kind() {
            return false;
        }
        match &self.kind {
            RegTypeKind::Constant { .. }
            | RegTypeKind::ConstantLo { .. }
            | RegTypeKind::ConstantHi { .. }
            | RegTypeKind::UnresolvedSuperClass { .. } => self.descriptor.is_empty(),
            RegTypeKind::UnresolvedReference
            | RegTypeKind::UnresolvedUninitializedReference { .. }
            | RegTypeKind::UnresolvedUninitializedThisReference => !self.descriptor.is_empty(),
            RegTypeKind::UnresolvedMerged {
                resolved_part,
                unresolved_types,
                ..
            } => {
                self.descriptor.is_empty()
                    && !unresolved_types.is_empty()
                    && (resolved_part.is_zero()
                        || (resolved_part.is_reference_types()
                            && !resolved_part.is_unresolved_types()
                            && !resolved_part.is_uninitialized_types()))
            }
            _ => true,
        }
    }

    fn has_class_kind(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::Boolean
                | RegTypeKind::Byte
                | RegTypeKind::Short
                | RegTypeKind::Char
                | RegTypeKind::Integer
                | RegTypeKind::Float
                | RegTypeKind::LongLo
                | RegTypeKind::LongHi
                | RegTypeKind::DoubleLo
                | RegTypeKind::DoubleHi
                | RegTypeKind::Reference
                | RegTypeKind::PreciseReference
                | RegTypeKind::UninitializedReference { .. }
                | RegTypeKind::UninitializedThisReference
        )
    }

    pub fn kind(&self) -> &RegTypeKind<'r, 'g> {
        &self.kind
    }

    /// Identity of the type within its cache
    pub fn id(&self) -> u16 {
        self.cache_id
    }

    /// Are these the same type? Only meaningful for types from the same cache.
    pub fn equals(&self, other: &RegType<'r, 'g>) -> bool {
        self.cache_id == other.cache_id
    }

    pub fn descriptor(&self) -> &'r str {
        debug_assert!(
            self.has_class() || (self.is_unresolved_types() && !self.descriptor.is_empty()),
            "No descriptor for {}",
            self
        );
        self.descriptor
    }

    pub fn has_class(&self) -> bool {
        self.klass.is_some()
    }

    pub fn class(&self) -> Option<ClassId<'g>> {
        self.klass
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, RegTypeKind::Undefined)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, RegTypeKind::Conflict)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, RegTypeKind::Boolean)
    }

    pub fn is_byte(&self) -> bool {
        matches!(self.kind, RegTypeKind::Byte)
    }

    pub fn is_short(&self) -> bool {
        matches!(self.kind, RegTypeKind::Short)
    }

    pub fn is_char(&self) -> bool {
        matches!(self.kind, RegTypeKind::Char)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, RegTypeKind::Integer)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, RegTypeKind::Float)
    }

    pub fn is_long_lo(&self) -> bool {
        matches!(self.kind, RegTypeKind::LongLo)
    }

    pub fn is_long_hi(&self) -> bool {
        matches!(self.kind, RegTypeKind::LongHi)
    }

    pub fn is_double_lo(&self) -> bool {
        matches!(self.kind, RegTypeKind::DoubleLo)
    }

    pub fn is_double_hi(&self) -> bool {
        matches!(self.kind, RegTypeKind::DoubleHi)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, RegTypeKind::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::Reference)
    }

    pub fn is_precise_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::PreciseReference)
    }

    pub fn is_uninitialized_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::UninitializedReference { .. })
    }

    pub fn is_uninitialized_this_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::UninitializedThisReference)
    }

    pub fn is_unresolved_and_uninitialized_reference(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::UnresolvedUninitializedReference { .. }
        )
    }

    pub fn is_unresolved_and_uninitialized_this_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::UnresolvedUninitializedThisReference)
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::UnresolvedReference)
    }

    pub fn is_unresolved_super_class(&self) -> bool {
        matches!(self.kind, RegTypeKind::UnresolvedSuperClass { .. })
    }

    pub fn is_unresolved_merged_reference(&self) -> bool {
        matches!(self.kind, RegTypeKind::UnresolvedMerged { .. })
    }

    pub fn is_precise_constant(&self) -> bool {
        matches!(self.kind, RegTypeKind::Constant { precise: true, .. })
    }

    pub fn is_imprecise_constant(&self) -> bool {
        matches!(self.kind, RegTypeKind::Constant { precise: false, .. })
    }

    pub fn is_precise_constant_lo(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantLo { precise: true, .. })
    }

    pub fn is_imprecise_constant_lo(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantLo { precise: false, .. })
    }

    pub fn is_precise_constant_hi(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantHi { precise: true, .. })
    }

    pub fn is_imprecise_constant_hi(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantHi { precise: false, .. })
    }

    /// Is this a 32-bit constant (precise or not)?
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, RegTypeKind::Constant { .. })
    }

    pub fn is_constant_lo(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantLo { .. })
    }

    pub fn is_constant_hi(&self) -> bool {
        matches!(self.kind, RegTypeKind::ConstantHi { .. })
    }

    pub fn is_long_constant(&self) -> bool {
        self.is_constant_lo()
    }

    pub fn is_long_constant_high(&self) -> bool {
        self.is_constant_hi()
    }

    /// Is this a precise constant of any width?
    pub fn is_precise(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::Constant { precise: true, .. }
                | RegTypeKind::ConstantLo { precise: true, .. }
                | RegTypeKind::ConstantHi { precise: true, .. }
        )
    }

    /// Constants of any width, along with `null`
    pub fn is_constant_types(&self) -> bool {
        self.is_constant() || self.is_constant_lo() || self.is_constant_hi() || self.is_null()
    }

    /// Value of a 32-bit constant
    pub fn constant_value(&self) -> Option<i32> {
        match self.kind {
            RegTypeKind::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn constant_value_lo(&self) -> Option<i32> {
        match self.kind {
            RegTypeKind::ConstantLo { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn constant_value_hi(&self) -> Option<i32> {
        match self.kind {
            RegTypeKind::ConstantHi { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The precise constant `0`, which doubles as the `null` reference
    pub fn is_zero(&self) -> bool {
        matches!(self.kind, RegTypeKind::Constant { value: 0, precise: true })
    }

    pub fn is_one(&self) -> bool {
        matches!(self.kind, RegTypeKind::Constant { value: 1, precise: true })
    }

    pub fn is_zero_or_null(&self) -> bool {
        self.is_zero() || self.is_null()
    }

    fn constant_in(&self, min: i32, max: i32) -> bool {
        self.constant_value()
            .map_or(false, |value| min <= value && value <= max)
    }

    pub fn is_constant_boolean(&self) -> bool {
        self.constant_in(0, 1)
    }

    pub fn is_constant_byte(&self) -> bool {
        self.constant_in(i8::MIN.into(), i8::MAX.into())
    }

    pub fn is_constant_short(&self) -> bool {
        self.constant_in(i16::MIN.into(), i16::MAX.into())
    }

    pub fn is_constant_char(&self) -> bool {
        self.constant_in(0, u16::MAX.into())
    }

    pub fn is_uninitialized_types(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::UninitializedReference { .. }
                | RegTypeKind::UninitializedThisReference
                | RegTypeKind::UnresolvedUninitializedReference { .. }
                | RegTypeKind::UnresolvedUninitializedThisReference
        )
    }

    pub fn is_unresolved_types(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::UnresolvedReference
                | RegTypeKind::UnresolvedSuperClass { .. }
                | RegTypeKind::UnresolvedMerged { .. }
                | RegTypeKind::UnresolvedUninitializedReference { .. }
                | RegTypeKind::UnresolvedUninitializedThisReference
        )
    }

    /// References that are certainly not `null`
    pub fn is_non_zero_reference_types(&self) -> bool {
        matches!(
            self.kind,
            RegTypeKind::Reference
                | RegTypeKind::PreciseReference
                | RegTypeKind::UnresolvedReference
                | RegTypeKind::UnresolvedSuperClass { .. }
                | RegTypeKind::UnresolvedMerged { .. }
        ) || self.is_uninitialized_types()
    }

    pub fn is_reference_types(&self) -> bool {
        self.is_non_zero_reference_types() || self.is_zero() || self.is_null()
    }

    pub fn is_low_half(&self) -> bool {
        self.is_long_lo() || self.is_double_lo() || self.is_constant_lo()
    }

    pub fn is_high_half(&self) -> bool {
        self.is_long_hi() || self.is_double_hi() || self.is_constant_hi()
    }

    pub fn is_long_or_double_types(&self) -> bool {
        self.is_low_half()
    }

    /// Is this a low half, and `high` its matching high half?
    pub fn check_wide_pair(&self, high: &RegType<'r, 'g>) -> bool {
        match self.kind {
            RegTypeKind::ConstantLo { .. } => high.is_constant_hi(),
            RegTypeKind::DoubleLo => high.is_double_hi(),
            RegTypeKind::LongLo => high.is_long_hi(),
            _ => false,
        }
    }

    pub fn is_category1_types(&self) -> bool {
        self.is_char()
            || self.is_integer()
            || self.is_float()
            || self.is_constant()
            || self.is_byte()
            || self.is_short()
            || self.is_boolean()
    }

    pub fn is_category2_types(&self) -> bool {
        self.is_low_half()
    }

    pub fn is_boolean_types(&self) -> bool {
        self.is_boolean() || self.is_constant_boolean()
    }

    pub fn is_byte_types(&self) -> bool {
        self.is_constant_byte() || self.is_byte() || self.is_boolean()
    }

    pub fn is_short_types(&self) -> bool {
        self.is_short() || self.is_byte() || self.is_boolean() || self.is_constant_short()
    }

    pub fn is_char_types(&self) -> bool {
        self.is_char() || self.is_boolean_types() || self.is_constant_char()
    }

    pub fn is_integral_types(&self) -> bool {
        self.is_integer()
            || self.is_constant()
            || self.is_byte()
            || self.is_short()
            || self.is_char()
            || self.is_boolean()
    }

    /// Can this be used to index an array?
    pub fn is_array_index_types(&self) -> bool {
        self.is_integral_types()
    }

    pub fn is_float_types(&self) -> bool {
        self.is_float() || self.is_constant()
    }

    pub fn is_long_types(&self) -> bool {
        self.is_long_lo() || self.is_long_constant()
    }

    pub fn is_long_high_types(&self) -> bool {
        self.is_long_hi() || self.is_long_constant_high()
    }

    pub fn is_double_types(&self) -> bool {
        self.is_double_lo() || self.is_long_constant()
    }

    pub fn is_double_high_types(&self) -> bool {
        self.is_double_hi() || self.is_long_constant_high()
    }

    /// Is this exactly an imprecise `java.lang.Object`?
    pub fn is_java_lang_object(&self) -> bool {
        self.is_reference() && self.klass.map_or(false, |klass| klass.is_object_class())
    }

    pub fn is_array_types(&self) -> bool {
        match &self.kind {
            RegTypeKind::UnresolvedMerged { is_array, .. } => *is_array,
            _ if self.is_unresolved_types() => self.descriptor.starts_with('['),
            _ => self.klass.map_or(false, |klass| klass.is_array_class()),
        }
    }

    /// Arrays whose elements are references
    pub fn is_object_array_types(&self) -> bool {
        match &self.kind {
            RegTypeKind::UnresolvedMerged { is_array, .. } => *is_array,

            // Primitive arrays always resolve
            _ if self.is_unresolved_types() => self.descriptor.starts_with('['),

            _ => self
                .klass
                .and_then(|klass| klass.component_type)
                .map_or(false, |component| !component.is_primitive()),
        }
    }

    /// Is this `java.lang.Object[]`?
    pub fn is_java_lang_object_array(&self) -> bool {
        self.klass
            .and_then(|klass| klass.component_type)
            .map_or(false, |component| component.is_object_class())
    }

    /// Could `new` create a value of this type?
    pub fn is_instantiable_types(&self) -> bool {
        self.is_unresolved_types()
            || (self.is_non_zero_reference_types()
                && self.klass.map_or(false, |klass| klass.is_instantiable()))
    }

    /// Primitive type of the values, or `None` for references and types with no values
    pub fn primitive_type(&self) -> Option<BaseType> {
        if self.is_non_zero_reference_types() {
            None
        } else if self.is_boolean_types() {
            Some(BaseType::Boolean)
        } else if self.is_byte_types() {
            Some(BaseType::Byte)
        } else if self.is_short_types() {
            Some(BaseType::Short)
        } else if self.is_char_types() {
            Some(BaseType::Char)
        } else if self.is_float() {
            Some(BaseType::Float)
        } else if self.is_integral_types() {
            Some(BaseType::Int)
        } else if self.is_double_lo() {
            Some(BaseType::Double)
        } else if self.is_long_types() {
            Some(BaseType::Long)
        } else {
            None
        }
    }

    pub fn assignment_type(&self) -> AssignmentType {
        match self.kind {
            RegTypeKind::Boolean => AssignmentType::Boolean,
            RegTypeKind::Byte => AssignmentType::Byte,
            RegTypeKind::Short => AssignmentType::Short,
            RegTypeKind::Char => AssignmentType::Char,
            RegTypeKind::Integer => AssignmentType::Integer,
            RegTypeKind::Float => AssignmentType::Float,
            RegTypeKind::LongLo => AssignmentType::LongLo,
            RegTypeKind::DoubleLo => AssignmentType::DoubleLo,
            RegTypeKind::Conflict => AssignmentType::Conflict,

            RegTypeKind::Null
            | RegTypeKind::Reference
            | RegTypeKind::PreciseReference
            | RegTypeKind::UninitializedReference { .. }
            | RegTypeKind::UninitializedThisReference
            | RegTypeKind::UnresolvedUninitializedReference { .. }
            | RegTypeKind::UnresolvedUninitializedThisReference
            | RegTypeKind::UnresolvedReference
            | RegTypeKind::UnresolvedSuperClass { .. }
            | RegTypeKind::UnresolvedMerged { .. } => AssignmentType::Reference,

            RegTypeKind::Undefined
            | RegTypeKind::LongHi
            | RegTypeKind::DoubleHi
            | RegTypeKind::Constant { .. }
            | RegTypeKind::ConstantLo { .. }
            | RegTypeKind::ConstantHi { .. } => AssignmentType::NotAssignable,
        }
    }

    /// Program counter of the allocation, for uninitialized references created by `new`
    pub fn allocation_pc(&self) -> Option<u32> {
        match self.kind {
            RegTypeKind::UninitializedReference { allocation_pc }
            | RegTypeKind::UnresolvedUninitializedReference { allocation_pc } => {
                Some(allocation_pc)
            }
            RegTypeKind::UninitializedThisReference
            | RegTypeKind::UnresolvedUninitializedThisReference => Some(0),
            _ => None,
        }
    }

    /// Child type of an unresolved superclass placeholder
    pub fn unresolved_super_class_child(&self) -> Option<&'r RegType<'r, 'g>> {
        match self.kind {
            RegTypeKind::UnresolvedSuperClass { child } => Some(child),
            _ => None,
        }
    }

    /// Resolved part of an unresolved merge (zero if the merge has no resolved part)
    pub fn resolved_part(&self) -> Option<&'r RegType<'r, 'g>> {
        match self.kind {
            RegTypeKind::UnresolvedMerged { resolved_part, .. } => Some(resolved_part),
            _ => None,
        }
    }

    /// Cache ids of the unresolved types summarized by an unresolved merge
    pub fn unresolved_types(&self) -> Option<&BitVector> {
        match &self.kind {
            RegTypeKind::UnresolvedMerged {
                unresolved_types, ..
            } => Some(unresolved_types),
            _ => None,
        }
    }

    /// Superclass of the type
    ///
    /// The superclass of a resolved class is never precise, and the superclass of
    /// `java.lang.Object` is zero. Unresolved types get a placeholder, except for arrays (whose
    /// superclass is always `java.lang.Object`).
    pub fn super_class(&'r self, cache: &RegTypeCache<'r, 'g>) -> &'r RegType<'r, 'g> {
        if self.is_unresolved_types() {
            if self.descriptor.starts_with('[') {
                cache.java_lang_object(false)
            } else {
                cache.from_unresolved_super_class(self)
            }
        } else {
            match self.klass {
                Some(klass) => match klass.0.superclass {
                    Some(superclass) => cache.from_class(superclass, false),
                    None => cache.zero(),
                },
                None => cache.conflict(),
            }
        }
    }

    /// High half matching this low half (`Conflict` if this isn't a low half)
    pub fn high_half(&self, cache: &RegTypeCache<'r, 'g>) -> &'r RegType<'r, 'g> {
        match self.kind {
            RegTypeKind::LongLo => cache.long_hi(),
            RegTypeKind::DoubleLo => cache.double_hi(),
            RegTypeKind::ConstantLo { value, precise } => cache.from_cat2_const_hi(value, precise),
            _ => cache.conflict(),
        }
    }
}

impl<'r, 'g> fmt::Display for RegType<'r, 'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = |precise: bool| if precise { "Precise" } else { "Imprecise" };
        match &self.kind {
            RegTypeKind::Undefined => f.write_str("Undefined"),
            RegTypeKind::Conflict => f.write_str("Conflict"),
            RegTypeKind::Boolean => f.write_str("Boolean"),
            RegTypeKind::Byte => f.write_str("Byte"),
            RegTypeKind::Short => f.write_str("Short"),
            RegTypeKind::Char => f.write_str("Char"),
            RegTypeKind::Integer => f.write_str("Integer"),
            RegTypeKind::Float => f.write_str("Float"),
            RegTypeKind::LongLo => f.write_str("Long (Low Half)"),
            RegTypeKind::LongHi => f.write_str("Long (High Half)"),
            RegTypeKind::DoubleLo => f.write_str("Double (Low Half)"),
            RegTypeKind::DoubleHi => f.write_str("Double (High Half)"),
            RegTypeKind::Constant { .. } if self.is_zero() => f.write_str("Precise Zero/null"),
            RegTypeKind::Constant { value, precise } => {
                write!(f, "{} Constant: {}", precision(*precise), value)
            }
            RegTypeKind::ConstantLo { value, precise } => {
                write!(f, "{} Low-half Constant: {}", precision(*precise), value)
            }
            RegTypeKind::ConstantHi { value, precise } => {
                write!(f, "{} High-half Constant: {}", precision(*precise), value)
            }
            RegTypeKind::Null => f.write_str("null"),
            RegTypeKind::Reference => {
                write!(f, "Reference: {}", pretty_descriptor(self.descriptor))
            }
            RegTypeKind::PreciseReference => {
                write!(f, "Precise Reference: {}", pretty_descriptor(self.descriptor))
            }
            RegTypeKind::UninitializedReference { allocation_pc } => write!(
                f,
                "Uninitialized Reference: {} Allocation PC: {}",
                pretty_descriptor(self.descriptor),
                allocation_pc
            ),
            RegTypeKind::UninitializedThisReference => write!(
                f,
                "Uninitialized This Reference: {}",
                pretty_descriptor(self.descriptor)
            ),
            RegTypeKind::UnresolvedUninitializedReference { allocation_pc } => write!(
                f,
                "Unresolved And Uninitialized Reference: {} Allocation PC: {}",
                pretty_descriptor(self.descriptor),
                allocation_pc
            ),
            RegTypeKind::UnresolvedUninitializedThisReference => write!(
                f,
                "Unresolved And Uninitialized This Reference: {}",
                pretty_descriptor(self.descriptor)
            ),
            RegTypeKind::UnresolvedReference => {
                write!(f, "Unresolved Reference: {}", pretty_descriptor(self.descriptor))
            }
            RegTypeKind::UnresolvedSuperClass { child } => {
                write!(f, "UnresolvedSuperClass({})", child)
            }
            RegTypeKind::UnresolvedMerged {
                resolved_part,
                unresolved_types,
                ..
            } => {
                write!(f, "UnresolvedMergedReferences({} |", resolved_part)?;
                for (idx, type_id) in unresolved_types.indexes().enumerate() {
                    let separator = if idx == 0 { " " } else { ", " };
                    write!(f, "{}#{}", separator, type_id)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl<'r, 'g> fmt::Debug for RegType<'r, 'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.cache_id, self)
    }
}
