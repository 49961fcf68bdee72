use super::{ClassData, ClassGraphArenas, ClassId, ClassLoaderId, ClassStatus};
use crate::jvm::{BaseType, BinaryName, ClassAccessFlags, RenderDescriptor};
use elsa::FrozenVec;
use std::cell::Cell;

/// Classes always present in the boot class loader
pub struct JavaClasses<'g> {
    pub primitives: PrimitiveClasses<'g>,
    pub lang: LangClasses<'g>,
    pub io: IoClasses<'g>,
}

/// Classes of the primitive types (eg. `int.class`)
pub struct PrimitiveClasses<'g> {
    pub boolean: ClassId<'g>,
    pub byte: ClassId<'g>,
    pub short: ClassId<'g>,
    pub char: ClassId<'g>,
    pub int: ClassId<'g>,
    pub long: ClassId<'g>,
    pub float: ClassId<'g>,
    pub double: ClassId<'g>,
}

/// Classes inside `java.lang.*`
pub struct LangClasses<'g> {
    pub object: ClassId<'g>,
    pub cloneable: ClassId<'g>,
    pub comparable: ClassId<'g>,
    pub char_sequence: ClassId<'g>,
    pub string: ClassId<'g>,
    pub class: ClassId<'g>,
    pub number: ClassId<'g>,
    pub integer: ClassId<'g>,
    pub throwable: ClassId<'g>,
    pub error: ClassId<'g>,
    pub exception: ClassId<'g>,
    pub runtime_exception: ClassId<'g>,
    pub invoke: InvokeClasses<'g>,
}

/// Classes inside `java.lang.invoke.*`
pub struct InvokeClasses<'g> {
    pub method_handle: ClassId<'g>,
    pub method_type: ClassId<'g>,
}

/// Classes inside `java.io.*`
pub struct IoClasses<'g> {
    pub serializable: ClassId<'g>,
}

/// Define a core class, which is resolved from the start
fn add_boot_class<'g>(
    arenas: &'g ClassGraphArenas<'g>,
    loader: ClassLoaderId<'g>,
    data: ClassData<'g>,
) -> ClassId<'g> {
    debug_assert!(data.loader == loader);
    let class = arenas.define_class(data);
    class.set_status(ClassStatus::Resolved);
    class
}

impl<'g> JavaClasses<'g> {
    pub(super) fn add_to_graph(
        arenas: &'g ClassGraphArenas<'g>,
        boot: ClassLoaderId<'g>,
    ) -> JavaClasses<'g> {
        let primitives = PrimitiveClasses::add_to_graph(arenas, boot);
        let object = add_boot_class(
            arenas,
            boot,
            ClassData {
                descriptor: BinaryName::OBJECT.render(),
                superclass: None,
                interfaces: FrozenVec::new(),
                access_flags: ClassAccessFlags::class(),
                component_type: None,
                primitive_type: None,
                loader: boot,
                status: Cell::new(ClassStatus::Resolved),
            },
        );
        let io = IoClasses::add_to_graph(arenas, boot, object);
        let lang = LangClasses::add_to_graph(arenas, boot, object, &io);

        JavaClasses {
            primitives,
            lang,
            io,
        }
    }
}

impl<'g> PrimitiveClasses<'g> {
    fn add_to_graph(
        arenas: &'g ClassGraphArenas<'g>,
        boot: ClassLoaderId<'g>,
    ) -> PrimitiveClasses<'g> {
        let primitive =
            |base_type| add_boot_class(arenas, boot, ClassData::primitive(boot, base_type));
        PrimitiveClasses {
            boolean: primitive(BaseType::Boolean),
            byte: primitive(BaseType::Byte),
            short: primitive(BaseType::Short),
            char: primitive(BaseType::Char),
            int: primitive(BaseType::Int),
            long: primitive(BaseType::Long),
            float: primitive(BaseType::Float),
            double: primitive(BaseType::Double),
        }
    }

    /// Class of a primitive type
    pub fn get(&self, base_type: BaseType) -> ClassId<'g> {
        match base_type {
            BaseType::Boolean => self.boolean,
            BaseType::Byte => self.byte,
            BaseType::Short => self.short,
            BaseType::Char => self.char,
            BaseType::Int => self.int,
            BaseType::Long => self.long,
            BaseType::Float => self.float,
            BaseType::Double => self.double,
        }
    }
}

impl<'g> IoClasses<'g> {
    fn add_to_graph(
        arenas: &'g ClassGraphArenas<'g>,
        boot: ClassLoaderId<'g>,
        object: ClassId<'g>,
    ) -> IoClasses<'g> {
        let serializable = add_boot_class(
            arenas,
            boot,
            ClassData::new(boot, BinaryName::SERIALIZABLE, object, ClassAccessFlags::interface()),
        );
        IoClasses { serializable }
    }
}

impl<'g> LangClasses<'g> {
    fn add_to_graph(
        arenas: &'g ClassGraphArenas<'g>,
        boot: ClassLoaderId<'g>,
        object: ClassId<'g>,
        io: &IoClasses<'g>,
    ) -> LangClasses<'g> {
        let class = |name, superclass, access_flags| {
            add_boot_class(arenas, boot, ClassData::new(boot, name, superclass, access_flags))
        };
        let final_class = ClassAccessFlags::class() | ClassAccessFlags::FINAL;
        let abstract_class = ClassAccessFlags::class() | ClassAccessFlags::ABSTRACT;
        let interface = ClassAccessFlags::interface();

        let cloneable = class(BinaryName::CLONEABLE, object, interface);
        let comparable = class(BinaryName::COMPARABLE, object, interface);
        let char_sequence = class(BinaryName::CHARSEQUENCE, object, interface);

        let string = add_boot_class(
            arenas,
            boot,
            ClassData::new(boot, BinaryName::STRING, object, final_class)
                .with_interface(io.serializable)
                .with_interface(comparable)
                .with_interface(char_sequence),
        );
        let number = add_boot_class(
            arenas,
            boot,
            ClassData::new(boot, BinaryName::NUMBER, object, abstract_class)
                .with_interface(io.serializable),
        );
        let integer = add_boot_class(
            arenas,
            boot,
            ClassData::new(boot, BinaryName::INTEGER, number, final_class)
                .with_interface(comparable),
        );
        let class_class = class(BinaryName::CLASS, object, final_class);

        let throwable = add_boot_class(
            arenas,
            boot,
            ClassData::new(boot, BinaryName::THROWABLE, object, ClassAccessFlags::class())
                .with_interface(io.serializable),
        );
        let error = class(BinaryName::ERROR, throwable, ClassAccessFlags::class());
        let exception = class(BinaryName::EXCEPTION, throwable, ClassAccessFlags::class());
        let runtime_exception = class(
            BinaryName::RUNTIMEEXCEPTION,
            exception,
            ClassAccessFlags::class(),
        );

        let invoke = InvokeClasses {
            method_handle: class(BinaryName::METHODHANDLE, object, abstract_class),
            method_type: class(BinaryName::METHODTYPE, object, final_class),
        };

        LangClasses {
            object,
            cloneable,
            comparable,
            char_sequence,
            string,
            class: class_class,
            number,
            integer,
            throwable,
            error,
            exception,
            runtime_exception,
            invoke,
        }
    }
}
