use bitflags::bitflags;

bitflags! {
    /// Access flags on classes
    ///
    /// Only the flags that matter for assignability and instantiability are interpreted; the
    /// rest are carried through untouched.
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl ClassAccessFlags {
    /// Flags of an ordinary public class
    pub const fn class() -> ClassAccessFlags {
        ClassAccessFlags::from_bits_truncate(
            ClassAccessFlags::PUBLIC.bits() | ClassAccessFlags::SUPER.bits(),
        )
    }

    /// Flags of a public interface
    pub const fn interface() -> ClassAccessFlags {
        ClassAccessFlags::from_bits_truncate(
            ClassAccessFlags::PUBLIC.bits()
                | ClassAccessFlags::INTERFACE.bits()
                | ClassAccessFlags::ABSTRACT.bits(),
        )
    }
}
