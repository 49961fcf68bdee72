use super::{AssignmentType, RegType};
use crate::jvm::class_graph::Assignable;

impl<'r, 'g> RegType<'r, 'g> {
    /// Can a value of type `src` be stored where this type is expected?
    ///
    /// Assignment to interfaces always succeeds for references: class joins don't track
    /// interfaces, so a merged type may have lost the fact that it implements one.
    pub fn is_assignable_from(&self, src: &RegType<'r, 'g>) -> bool {
        assignable_from(self, src, false)
    }

    /// Same as [`RegType::is_assignable_from`], but interfaces are checked like classes
    pub fn is_strictly_assignable_from(&self, src: &RegType<'r, 'g>) -> bool {
        assignable_from(self, src, true)
    }
}

fn assignable_from<'r, 'g>(lhs: &RegType<'r, 'g>, rhs: &RegType<'r, 'g>, strict: bool) -> bool {
    if lhs.equals(rhs) {
        return true;
    }

    match lhs.assignment_type() {
        AssignmentType::Boolean => rhs.is_boolean_types(),
        AssignmentType::Byte => rhs.is_byte_types(),
        AssignmentType::Short => rhs.is_short_types(),
        AssignmentType::Char => rhs.is_char_types(),
        AssignmentType::Integer => rhs.is_integral_types(),
        AssignmentType::Float => rhs.is_float_types(),
        AssignmentType::LongLo => rhs.is_long_types(),
        AssignmentType::DoubleLo => rhs.is_double_types(),
        AssignmentType::Conflict => {
            log::warn!("Assignment to conflict type from {}", rhs);
            false
        }
        AssignmentType::NotAssignable => false,
        AssignmentType::Reference => {
            if rhs.is_zero_or_null() {
                true
            } else if !rhs.is_reference_types() {
                false
            } else if lhs.is_uninitialized_types() || rhs.is_uninitialized_types() {
                // Only assignable to themselves, which was checked above
                false
            } else if lhs.is_java_lang_object() {
                true
            } else if !strict && lhs.class().map_or(false, |klass| klass.is_interface()) {
                true
            } else if lhs.is_java_lang_object_array() {
                rhs.is_object_array_types()
            } else if let (Some(lhs_class), Some(rhs_class)) = (lhs.class(), rhs.class()) {
                rhs_class.is_assignable(&lhs_class)
            } else {
                false
            }
        }
    }
}
