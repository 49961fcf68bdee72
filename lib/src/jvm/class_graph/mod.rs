use super::{
    BaseType, BinaryName, ClassAccessFlags, FieldType, ParseDescriptor, RefType, RenderDescriptor,
    ResolutionError,
};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

mod assignable;
mod java_classes;

pub use assignable::*;
pub use java_classes::*;

pub type ClassId<'g> = RefId<'g, ClassData<'g>>;
pub type ClassLoaderId<'g> = RefId<'g, ClassLoaderData<'g>>;

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    loader_arena: Arena<ClassLoaderData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            loader_arena: Arena::new(),
        }
    }

    /// Allocate a class and define it in its class loader
    ///
    /// If the loader already defines a class with the same descriptor, that class wins and the
    /// new data is left unreachable.
    fn define_class(&'g self, data: ClassData<'g>) -> ClassId<'g> {
        let data: &'g ClassData<'g> = self.class_arena.alloc(data);
        let defined = data.loader.0.classes.insert(data.descriptor.clone(), data);
        if !std::ptr::eq(defined, data) {
            log::warn!(
                "Class {} is already defined in loader {:?}",
                data.descriptor,
                data.loader
            );
        }
        RefId(defined)
    }

    fn alloc_loader(&'g self, loader: ClassLoaderData<'g>) -> ClassLoaderId<'g> {
        RefId(&*self.loader_arena.alloc(loader))
    }
}

/// Tracks the classes (and the loaders defining them) visible to the verifier
///
/// Classes are identified by their descriptor within a class loader. Lookups delegate to the
/// parent loader first, so a class defined by the boot loader shadows any class of the same name
/// defined by a child loader. Every graph starts with a boot loader that already defines the
/// primitive classes and the core library classes from [`JavaClasses`].
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    boot_loader: ClassLoaderId<'g>,
    java: JavaClasses<'g>,
}

impl<'g> ClassGraph<'g> {
    /// New graph containing only the boot loader and its classes
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        let boot_loader = arenas.alloc_loader(ClassLoaderData::new("boot", None));
        let java = JavaClasses::add_to_graph(arenas, boot_loader);
        ClassGraph {
            arenas,
            boot_loader,
            java,
        }
    }

    /// Core library classes, defined by the boot loader
    pub fn java(&self) -> &JavaClasses<'g> {
        &self.java
    }

    pub fn boot_loader(&self) -> ClassLoaderId<'g> {
        self.boot_loader
    }

    /// Add a new class loader delegating to `parent`
    pub fn add_loader(&self, name: &str, parent: ClassLoaderId<'g>) -> ClassLoaderId<'g> {
        self.arenas.alloc_loader(ClassLoaderData::new(name, Some(parent)))
    }

    /// Add a new class to the class graph
    ///
    /// The class is defined in the loader recorded in its data and starts out loaded but not
    /// resolved.
    pub fn add_class(&self, data: ClassData<'g>) -> ClassId<'g> {
        self.arenas.define_class(data)
    }

    /// Find an already loaded class, without triggering any linking
    ///
    /// Array classes are only found if something already asked for them to be created.
    pub fn lookup_class(&self, descriptor: &str, loader: ClassLoaderId<'g>) -> Option<ClassId<'g>> {
        match FieldType::<BinaryName>::parse(descriptor).ok()? {
            FieldType::Base(base_type) => Some(self.java.primitives.get(base_type)),
            FieldType::Ref(RefType::Object(_)) => loader.0.lookup(descriptor),
            FieldType::Ref(_) => {
                let component = self.lookup_class(&descriptor[1..], loader)?;
                component.0.loader.0.array_classes.get(&component).map(RefId)
            }
        }
    }

    /// Find a class and make sure it is resolved
    ///
    /// Resolving a class resolves its superclass and interfaces first. If any of those fail, the
    /// class is marked as erroneous and every later attempt fails too.
    pub fn find_class(
        &self,
        descriptor: &str,
        loader: ClassLoaderId<'g>,
    ) -> Result<ClassId<'g>, ResolutionError> {
        let field_type = FieldType::<BinaryName>::parse(descriptor).map_err(|err| {
            ResolutionError::BadDescriptor {
                descriptor: String::from(descriptor),
                reason: err.to_string(),
            }
        })?;
        match field_type {
            FieldType::Base(base_type) => Ok(self.java.primitives.get(base_type)),
            FieldType::Ref(RefType::Object(_)) => {
                let class = loader
                    .0
                    .lookup(descriptor)
                    .ok_or_else(|| ResolutionError::ClassNotFound(String::from(descriptor)))?;
                self.link(class)?;
                Ok(class)
            }
            FieldType::Ref(_) => {
                let component = self.find_class(&descriptor[1..], loader)?;
                Ok(self.array_class(component))
            }
        }
    }

    /// Get (or create) the array class whose elements have the given class
    ///
    /// Array classes live in the loader of their component, are final and abstract, extend
    /// `java.lang.Object`, and implement `java.lang.Cloneable` and `java.io.Serializable`.
    pub fn array_class(&self, component: ClassId<'g>) -> ClassId<'g> {
        let loader = component.0.loader;
        if let Some(array) = loader.0.array_classes.get(&component) {
            return RefId(array);
        }

        let mut access_flags = ClassAccessFlags::FINAL | ClassAccessFlags::ABSTRACT;
        access_flags.set(
            ClassAccessFlags::PUBLIC,
            component.access_flags.contains(ClassAccessFlags::PUBLIC),
        );
        let array = ClassData {
            descriptor: format!("[{}", component.descriptor),
            superclass: Some(self.java.lang.object),
            interfaces: FrozenVec::new(),
            access_flags,
            component_type: Some(component),
            primitive_type: None,
            loader,
            status: Cell::new(ClassStatus::Resolved),
        };
        array.interfaces.push(self.java.lang.cloneable);
        array.interfaces.push(self.java.io.serializable);

        let array: &'g ClassData<'g> = self.arenas.class_arena.alloc(array);
        log::trace!("Created array class {}", array.descriptor);
        RefId(loader.0.array_classes.insert(component, array))
    }

    fn link(&self, class: ClassId<'g>) -> Result<(), ResolutionError> {
        match class.status() {
            ClassStatus::Resolved => Ok(()),
            ClassStatus::Erroneous => {
                Err(ResolutionError::NoClassDefFound(class.descriptor.clone()))
            }
            ClassStatus::Loaded => {
                let supertypes = class.superclass.into_iter().chain(class.interfaces());
                for supertype in supertypes {
                    if let Err(err) = self.link(supertype) {
                        log::debug!("Failed to link {}: {}", class.descriptor, err);
                        class.set_status(ClassStatus::Erroneous);
                        return Err(ResolutionError::NoClassDefFound(class.descriptor.clone()));
                    }
                }
                class.set_status(ClassStatus::Resolved);
                Ok(())
            }
        }
    }
}

/// Lifecycle of a class
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClassStatus {
    /// Defined by a loader, but super types have not been checked
    Loaded,

    /// Usable: all super types are resolved too
    Resolved,

    /// Linking failed, the class is unusable
    Erroneous,
}

pub struct ClassData<'g> {
    /// Field descriptor of the class (eg. `Ljava/lang/String;`, `[I`, or `I`)
    pub descriptor: String,

    /// Superclass is only missing for `java/lang/Object` and primitive classes
    ///
    /// Interfaces have `java/lang/Object` as their superclass.
    pub superclass: Option<ClassId<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<ClassId<'g>>,

    pub access_flags: ClassAccessFlags,

    /// Class of the elements, for array classes
    pub component_type: Option<ClassId<'g>>,

    /// Primitive type, for primitive classes
    pub primitive_type: Option<BaseType>,

    /// Defining class loader
    pub loader: ClassLoaderId<'g>,

    status: Cell<ClassStatus>,
}

impl<'g> ClassData<'g> {
    /// New (not yet resolved) class or interface
    pub fn new(
        loader: ClassLoaderId<'g>,
        name: BinaryName,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassData<'g> {
        ClassData {
            descriptor: name.render(),
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            access_flags,
            component_type: None,
            primitive_type: None,
            loader,
            status: Cell::new(ClassStatus::Loaded),
        }
    }

    /// Class representing a primitive type
    pub fn primitive(loader: ClassLoaderId<'g>, base_type: BaseType) -> ClassData<'g> {
        ClassData {
            descriptor: base_type.render(),
            superclass: None,
            interfaces: FrozenVec::new(),
            access_flags: ClassAccessFlags::PUBLIC
                | ClassAccessFlags::FINAL
                | ClassAccessFlags::ABSTRACT,
            component_type: None,
            primitive_type: Some(base_type),
            loader,
            status: Cell::new(ClassStatus::Resolved),
        }
    }

    /// Builder-style helper for declaring an implemented interface
    pub fn with_interface(self, interface: ClassId<'g>) -> ClassData<'g> {
        self.interfaces.push(interface);
        self
    }

    /// Interfaces directly implemented by this class
    pub fn interfaces(&self) -> impl Iterator<Item = ClassId<'g>> + '_ {
        (0..self.interfaces.len()).filter_map(move |idx| self.interfaces.get_copy(idx))
    }

    pub fn status(&self) -> ClassStatus {
        self.status.get()
    }

    pub fn set_status(&self, status: ClassStatus) {
        self.status.set(status)
    }

    pub fn is_resolved(&self) -> bool {
        self.status() == ClassStatus::Resolved
    }

    pub fn is_erroneous(&self) -> bool {
        self.status() == ClassStatus::Erroneous
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::FINAL)
    }

    pub fn is_array_class(&self) -> bool {
        self.component_type.is_some()
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_type.is_some()
    }

    /// Is this `java.lang.Object`?
    pub fn is_object_class(&self) -> bool {
        !self.is_primitive() && self.superclass.is_none()
    }

    /// Can a value whose static type is this class only ever be an instance of exactly this
    /// class?
    ///
    /// This holds for final classes, primitive classes, arrays of primitives, and arrays whose
    /// component itself cannot be assigned from other types.
    pub fn cannot_be_assigned_from_other_types(&self) -> bool {
        match self.component_type {
            Some(component) => {
                component.is_primitive() || component.cannot_be_assigned_from_other_types()
            }
            None => self.is_final(),
        }
    }

    /// Can `new` create an instance of this class?
    ///
    /// Array classes are abstract, but are still instantiable (through the array creation
    /// instructions).
    pub fn is_instantiable(&self) -> bool {
        (!self.is_primitive() && !self.is_interface() && !self.is_abstract())
            || (self.is_abstract() && self.is_array_class())
    }

    /// Number of superclasses above this class (`java.lang.Object` has depth 0)
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut next_class = self.superclass;
        while let Some(class) = next_class {
            depth += 1;
            next_class = class.superclass;
        }
        depth
    }

    /// Is `superclass` found by walking up the superclass chain?
    pub fn is_subclass(&self, superclass: ClassId<'g>) -> bool {
        let mut next_class = self.superclass;
        while let Some(class) = next_class {
            if class == superclass {
                return true;
            }
            next_class = class.superclass;
        }
        false
    }

    /// Does this class (or one of its super types) implement `interface`?
    pub fn implements(&self, interface: ClassId<'g>) -> bool {
        let mut supertypes_to_visit: Vec<ClassId<'g>> =
            self.superclass.into_iter().chain(self.interfaces()).collect();
        let mut dont_revisit: HashSet<ClassId<'g>> = supertypes_to_visit.iter().copied().collect();

        while let Some(class) = supertypes_to_visit.pop() {
            if class == interface {
                return true;
            }
            let class = class.0;

            // Enqueue next types to visit
            for supertype in class.superclass.into_iter().chain(class.interfaces()) {
                if dont_revisit.insert(supertype) {
                    supertypes_to_visit.push(supertype);
                }
            }
        }

        false
    }

    /// Name as it would appear in Java source (eg. `java.lang.String[]`)
    pub fn pretty_name(&self) -> String {
        super::pretty_descriptor(&self.descriptor)
    }
}

impl<'g> Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

pub struct ClassLoaderData<'g> {
    /// Name, only used for debugging
    pub name: String,

    /// Loader to which lookups are delegated first
    pub parent: Option<ClassLoaderId<'g>>,

    /// Classes defined by this loader, keyed by descriptor
    classes: FrozenMap<String, &'g ClassData<'g>>,

    /// Array classes whose component is defined by this loader, keyed by component
    array_classes: FrozenMap<ClassId<'g>, &'g ClassData<'g>>,
}

impl<'g> ClassLoaderData<'g> {
    fn new(name: &str, parent: Option<ClassLoaderId<'g>>) -> ClassLoaderData<'g> {
        ClassLoaderData {
            name: String::from(name),
            parent,
            classes: FrozenMap::new(),
            array_classes: FrozenMap::new(),
        }
    }

    /// Find a (non-array) class visible from this loader, asking the parent first
    pub fn lookup(&'g self, descriptor: &str) -> Option<ClassId<'g>> {
        if let Some(parent) = self.parent {
            if let Some(class) = parent.0.lookup(descriptor) {
                return Some(class);
            }
        }
        self.classes.get(descriptor).map(RefId)
    }
}

impl<'g> Debug for ClassLoaderData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
