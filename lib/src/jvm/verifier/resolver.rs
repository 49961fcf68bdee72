use crate::jvm::class_graph::{ClassGraph, ClassId, ClassLoaderId};
use crate::jvm::{BaseType, ResolutionError};

/// Classes the register type cache must always be able to name
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClassRoot {
    Object,
    Class,
    String,
    Throwable,
    MethodHandle,
    MethodType,
    Primitive(BaseType),
}

/// Resolution of classes on behalf of the register type cache
///
/// Implementations own the classes they return: handles must outlive every cache built on top
/// of the resolver.
pub trait ClassResolver<'g> {
    /// Find a class, loading and linking it if needed
    fn find_class(
        &self,
        descriptor: &str,
        loader: ClassLoaderId<'g>,
    ) -> Result<ClassId<'g>, ResolutionError>;

    /// Find a class only if it was already loaded (never triggers loading or linking)
    fn lookup_class(&self, descriptor: &str, loader: ClassLoaderId<'g>) -> Option<ClassId<'g>>;

    /// Get the array class with the given component
    fn find_array_class(&self, component: ClassId<'g>) -> Result<ClassId<'g>, ResolutionError>;

    fn class_root(&self, root: ClassRoot) -> ClassId<'g>;
}

impl<'g> ClassResolver<'g> for ClassGraph<'g> {
    fn find_class(
        &self,
        descriptor: &str,
        loader: ClassLoaderId<'g>,
    ) -> Result<ClassId<'g>, ResolutionError> {
        ClassGraph::find_class(self, descriptor, loader)
    }

    fn lookup_class(&self, descriptor: &str, loader: ClassLoaderId<'g>) -> Option<ClassId<'g>> {
        ClassGraph::lookup_class(self, descriptor, loader)
    }

    fn find_array_class(&self, component: ClassId<'g>) -> Result<ClassId<'g>, ResolutionError> {
        if component.is_erroneous() {
            return Err(ResolutionError::NoArrayClass(component.descriptor.clone()));
        }
        Ok(self.array_class(component))
    }

    fn class_root(&self, root: ClassRoot) -> ClassId<'g> {
        let java = self.java();
        match root {
            ClassRoot::Object => java.lang.object,
            ClassRoot::Class => java.lang.class,
            ClassRoot::String => java.lang.string,
            ClassRoot::Throwable => java.lang.throwable,
            ClassRoot::MethodHandle => java.lang.invoke.method_handle,
            ClassRoot::MethodType => java.lang.invoke.method_type,
            ClassRoot::Primitive(base_type) => java.primitives.get(base_type),
        }
    }
}
