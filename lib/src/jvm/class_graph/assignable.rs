use crate::jvm::class_graph::ClassId;

/// Subtyping relationship between types
pub trait Assignable {
    /// Is the first type assignable to the second?
    fn is_assignable(&self, super_type: &Self) -> bool;
}

/// Assignability between resolved classes
///
/// Arrays are covariant in their component type, except that primitive components only match
/// themselves. Every class (including arrays and interfaces) is assignable to `java.lang.Object`,
/// while primitive classes are only assignable to themselves.
impl<'g> Assignable for ClassId<'g> {
    fn is_assignable(&self, super_type: &ClassId<'g>) -> bool {
        let sub_type = *self;
        let super_type = *super_type;

        if sub_type == super_type {
            true
        } else if super_type.is_object_class() {
            !sub_type.is_primitive()
        } else if super_type.is_interface() {
            sub_type.implements(super_type)
        } else if let Some(sub_component) = sub_type.component_type {
            match super_type.component_type {
                Some(super_component) => sub_component.is_assignable(&super_component),
                None => false,
            }
        } else {
            !sub_type.is_interface() && sub_type.is_subclass(super_type)
        }
    }
}
