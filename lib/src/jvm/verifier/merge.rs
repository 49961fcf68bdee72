use super::{ClassResolver, RegType, RegTypeCache};
use crate::jvm::class_graph::{Assignable, ClassId};

/// Pick whichever side is not a constant
fn select_non_constant<'r, 'g>(
    a: &'r RegType<'r, 'g>,
    b: &'r RegType<'r, 'g>,
) -> &'r RegType<'r, 'g> {
    if a.is_constant_types() {
        b
    } else {
        a
    }
}

/// Pick whichever side is not a constant, preferring `null` over zero
fn select_non_constant2<'r, 'g>(
    a: &'r RegType<'r, 'g>,
    b: &'r RegType<'r, 'g>,
) -> &'r RegType<'r, 'g> {
    if a.is_constant_types() && !b.is_zero() {
        b
    } else {
        a
    }
}

impl<'r, 'g> RegType<'r, 'g> {
    /// Least upper bound of this type and `incoming`, when they are different
    ///
    /// The result is something both types can be assigned to: incompatible primitives become
    /// `Conflict`, while incompatible references are widened (at worst to `java.lang.Object`).
    /// Uninitialized references only merge with themselves, so they must go through
    /// [`RegType::safe_merge`].
    pub fn merge(
        &'r self,
        incoming: &'r RegType<'r, 'g>,
        cache: &RegTypeCache<'r, 'g>,
    ) -> &'r RegType<'r, 'g> {
        debug_assert!(!self.equals(incoming), "trivial merges are the caller's job");

        if self.is_conflict() {
            self
        } else if incoming.is_conflict() {
            incoming
        } else if self.is_undefined() || incoming.is_undefined() {
            cache.conflict()
        } else if let (Some(value1), Some(value2)) =
            (self.constant_value(), incoming.constant_value())
        {
            merge_constants(self, value1, incoming, value2, cache)
        } else if let (Some(value1), Some(value2)) =
            (self.constant_value_lo(), incoming.constant_value_lo())
        {
            cache.from_cat2_const_lo(value1 | value2, false)
        } else if let (Some(value1), Some(value2)) =
            (self.constant_value_hi(), incoming.constant_value_hi())
        {
            cache.from_cat2_const_hi(value1 | value2, false)
        } else if self.is_integral_types() && incoming.is_integral_types() {
            if self.is_boolean_types() && incoming.is_boolean_types() {
                cache.boolean()
            } else if self.is_byte_types() && incoming.is_byte_types() {
                cache.byte()
            } else if self.is_short_types() && incoming.is_short_types() {
                cache.short()
            } else if self.is_char_types() && incoming.is_char_types() {
                cache.char()
            } else {
                cache.integer()
            }
        } else if (self.is_float_types() && incoming.is_float_types())
            || (self.is_long_types() && incoming.is_long_types())
            || (self.is_long_high_types() && incoming.is_long_high_types())
            || (self.is_double_types() && incoming.is_double_types())
            || (self.is_double_high_types() && incoming.is_double_high_types())
        {
            // Two constants would have been handled above
            debug_assert!(!self.is_constant() || !incoming.is_constant());
            select_non_constant(self, incoming)
        } else if self.is_reference_types() && incoming.is_reference_types() {
            if self.is_uninitialized_types() || incoming.is_uninitialized_types() {
                cache.conflict()
            } else if self.is_java_lang_object() || incoming.is_java_lang_object() {
                cache.java_lang_object(false)
            } else if self.is_zero_or_null() || incoming.is_zero_or_null() {
                select_non_constant2(self, incoming)
            } else if self.is_unresolved_types() || incoming.is_unresolved_types() {
                cache.from_unresolved_merge(self, incoming)
            } else {
                self.merge_classes(incoming, cache)
            }
        } else {
            cache.conflict()
        }
    }

    /// Same as [`RegType::merge`], but also accepts merging a type with itself
    pub fn safe_merge(
        &'r self,
        incoming: &'r RegType<'r, 'g>,
        cache: &RegTypeCache<'r, 'g>,
    ) -> &'r RegType<'r, 'g> {
        if self.equals(incoming) {
            self
        } else {
            self.merge(incoming, cache)
        }
    }

    /// Merge two resolved references through the join of their classes
    fn merge_classes(
        &'r self,
        incoming: &'r RegType<'r, 'g>,
        cache: &RegTypeCache<'r, 'g>,
    ) -> &'r RegType<'r, 'g> {
        let (klass, incoming_klass) = match (self.class(), incoming.class()) {
            (Some(klass), Some(incoming_klass)) => (klass, incoming_klass),
            _ => return cache.conflict(),
        };

        match class_join(klass, incoming_klass, cache.resolver()) {
            Some(join) if join == klass && !self.is_precise_reference() => self,
            Some(join) if join == incoming_klass && !incoming.is_precise_reference() => incoming,
            Some(join) => cache.from_class(join, false),
            None => {
                // An unresolved merge would merge the resolved parts again, and loop forever
                log::warn!("Could not join {} and {}", self, incoming);
                cache.make_unresolved_reference()
            }
        }
    }
}

/// Merge two 32-bit constants into an imprecise constant covering both values
///
/// Constants of the same sign merge to the one with the largest magnitude. Otherwise, the
/// result stands for the smallest integral type that can hold both values.
fn merge_constants<'r, 'g>(
    type1: &'r RegType<'r, 'g>,
    value1: i32,
    type2: &'r RegType<'r, 'g>,
    value2: i32,
    cache: &RegTypeCache<'r, 'g>,
) -> &'r RegType<'r, 'g> {
    let widest = |reg_type: &'r RegType<'r, 'g>, value: i32| {
        if reg_type.is_precise_constant() {
            cache.from_cat1_const(value, false)
        } else {
            reg_type
        }
    };

    if value1 >= 0 && value2 >= 0 {
        if value1 >= value2 {
            widest(type1, value1)
        } else {
            widest(type2, value2)
        }
    } else if value1 < 0 && value2 < 0 {
        if value1 <= value2 {
            widest(type1, value1)
        } else {
            widest(type2, value2)
        }
    } else if type1.is_constant_byte() && type2.is_constant_byte() {
        cache.byte_constant()
    } else if type1.is_constant_short() && type2.is_constant_short() {
        cache.short_constant()
    } else {
        cache.int_constant()
    }
}

/// Closest common superclass of two (non-primitive) classes
///
/// Interfaces are not considered: two classes implementing the same interfaces still join to
/// their common superclass, which is why assignment to an interface is not strictly checked.
/// Arrays of references join to arrays of the join of their components. Fails only if an array
/// class for that join can't be created.
pub fn class_join<'g>(
    s: ClassId<'g>,
    t: ClassId<'g>,
    resolver: &dyn ClassResolver<'g>,
) -> Option<ClassId<'g>> {
    debug_assert!(!s.is_primitive() && !t.is_primitive());

    if s == t || t.is_assignable(&s) {
        Some(s)
    } else if s.is_assignable(&t) {
        Some(t)
    } else if let (Some(s_component), Some(t_component)) = (s.0.component_type, t.0.component_type)
    {
        if s_component.is_primitive() || t_component.is_primitive() {
            // Distinct arrays of primitives only have `java.lang.Object` in common
            s.0.superclass
        } else {
            let common_component = class_join(s_component, t_component, resolver)?;
            match resolver.find_array_class(common_component) {
                Ok(array_class) => Some(array_class),
                Err(err) => {
                    log::warn!("Failed to join {:?} and {:?}: {}", s, t, err);
                    None
                }
            }
        }
    } else {
        let mut s = s;
        let mut t = t;
        let mut s_depth = s.depth();
        let mut t_depth = t.depth();

        // Get to the same depth in the hierarchy, then go up until the classes meet
        while s_depth > t_depth {
            s = s.0.superclass?;
            s_depth -= 1;
        }
        while t_depth > s_depth {
            t = t.0.superclass?;
            t_depth -= 1;
        }
        while s != t {
            s = s.0.superclass?;
            t = t.0.superclass?;
        }
        Some(s)
    }
}
