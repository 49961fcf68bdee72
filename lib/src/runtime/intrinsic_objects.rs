use crate::util::{minimum_bits_to_store, BitField};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io;

/// Box classes whose `valueOf` hands out instances from a fixed cache
///
/// The caches of all boxed types are laid out back to back in one table of objects, in the
/// order of the variants here.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BoxedType {
    Byte,
    Short,
    Character,
    Integer,
}

/// Total number of objects across all boxed value caches
pub const NUMBER_OF_BOXED_CACHES: u32 = BoxedType::Integer.last_index();

impl BoxedType {
    pub const ALL: [BoxedType; 4] = [
        BoxedType::Byte,
        BoxedType::Short,
        BoxedType::Character,
        BoxedType::Integer,
    ];

    pub const fn low(self) -> i32 {
        match self {
            BoxedType::Byte | BoxedType::Short | BoxedType::Integer => -128,
            BoxedType::Character => 0,
        }
    }

    pub const fn high(self) -> i32 {
        127
    }

    /// Number of cached values
    pub const fn length(self) -> u32 {
        (self.high() - self.low() + 1) as u32
    }

    /// Index of the cached object for `low()`
    pub const fn first_index(self) -> u32 {
        match self {
            BoxedType::Byte => 0,
            BoxedType::Short => BoxedType::Byte.last_index(),
            BoxedType::Character => BoxedType::Short.last_index(),
            BoxedType::Integer => BoxedType::Character.last_index(),
        }
    }

    /// One past the index of the cached object for `high()`
    pub const fn last_index(self) -> u32 {
        self.first_index() + self.length()
    }

    /// Name of the box class
    pub const fn class_name(self) -> &'static str {
        match self {
            BoxedType::Byte => "java/lang/Byte",
            BoxedType::Short => "java/lang/Short",
            BoxedType::Character => "java/lang/Character",
            BoxedType::Integer => "java/lang/Integer",
        }
    }

    /// Offset of `value` inside this type's cache, if it is cached at all
    pub fn cache_offset(self, value: i32) -> Option<u32> {
        // Values below `low()` wrap around to large offsets
        let offset = (value as u32).wrapping_sub(self.low() as u32);
        if offset < self.length() {
            Some(offset)
        } else {
            None
        }
    }

    /// Index of the cached object for `value` across all caches
    pub fn value_index(self, value: i32) -> Option<u32> {
        self.cache_offset(value)
            .map(|offset| self.first_index() + offset)
    }

    /// Boxed type and value of the object at a given index across all caches
    pub fn from_index(index: u32) -> Option<(BoxedType, i32)> {
        BoxedType::ALL
            .iter()
            .find(|boxed_type| index >= boxed_type.first_index() && index < boxed_type.last_index())
            .map(|boxed_type| {
                let value = boxed_type.low() + (index - boxed_type.first_index()) as i32;
                (*boxed_type, value)
            })
    }
}

/// What an intrinsic patch points to
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PatchType {
    /// One cached boxed object
    ValueOfObject = 0,

    /// Start of the data of a boxed cache
    ValueOfArray = 1,
}

impl PatchType {
    pub const LAST: PatchType = PatchType::ValueOfArray;

    fn from_bits(bits: u32) -> Option<PatchType> {
        match bits {
            0 => Some(PatchType::ValueOfObject),
            1 => Some(PatchType::ValueOfArray),
            _ => None,
        }
    }
}

const PATCH_TYPE_FIELD: BitField = BitField::new(0, minimum_bits_to_store(PatchType::LAST as u32));
const INDEX_FIELD: BitField = PATCH_TYPE_FIELD.remaining();

/// Reference to an object in the boxed caches, as embedded in generated code
///
/// A patch is packed into a single `u32`: the patch type takes the lowest bits, and the index
/// takes all the bits above it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct IntrinsicPatch {
    pub patch_type: PatchType,
    pub index: u32,
}

impl IntrinsicPatch {
    pub fn new(patch_type: PatchType, index: u32) -> IntrinsicPatch {
        debug_assert!(INDEX_FIELD.is_valid(index), "Patch index {} too large", index);
        IntrinsicPatch { patch_type, index }
    }

    /// Patch to the cached object `valueOf(value)` returns, if there is one
    pub fn value_of_object(boxed_type: BoxedType, value: i32) -> Option<IntrinsicPatch> {
        boxed_type
            .value_index(value)
            .map(|index| IntrinsicPatch::new(PatchType::ValueOfObject, index))
    }

    /// Patch to the start of the cache of a boxed type
    pub fn value_of_array(boxed_type: BoxedType) -> IntrinsicPatch {
        IntrinsicPatch::new(PatchType::ValueOfArray, boxed_type.first_index())
    }

    pub fn encode(self) -> u32 {
        PATCH_TYPE_FIELD.encode(self.patch_type as u32) | INDEX_FIELD.encode(self.index)
    }

    /// Cached object this patch points to
    pub fn boxed_value(self) -> Result<(BoxedType, i32), PatchDecodeError> {
        match self.patch_type {
            PatchType::ValueOfObject => BoxedType::from_index(self.index)
                .ok_or(PatchDecodeError::IndexOutOfRange(self.index)),
            PatchType::ValueOfArray => self
                .boxed_array()
                .map(|boxed_type| (boxed_type, boxed_type.low())),
        }
    }

    /// Boxed type whose cache this patch points to the start of
    pub fn boxed_array(self) -> Result<BoxedType, PatchDecodeError> {
        if self.patch_type != PatchType::ValueOfArray {
            return Err(PatchDecodeError::NotAnArrayPatch(self.encode()));
        }
        BoxedType::ALL
            .iter()
            .copied()
            .find(|boxed_type| boxed_type.first_index() == self.index)
            .ok_or(PatchDecodeError::NotACacheStart(self.index))
    }
}

impl TryFrom<u32> for IntrinsicPatch {
    type Error = PatchDecodeError;

    fn try_from(word: u32) -> Result<IntrinsicPatch, PatchDecodeError> {
        let patch_type = PatchType::from_bits(PATCH_TYPE_FIELD.decode(word))
            .ok_or(PatchDecodeError::BadPatchType(word))?;
        let patch = IntrinsicPatch {
            patch_type,
            index: INDEX_FIELD.decode(word),
        };
        match patch_type {
            PatchType::ValueOfObject if patch.index >= NUMBER_OF_BOXED_CACHES => {
                Err(PatchDecodeError::IndexOutOfRange(patch.index))
            }
            PatchType::ValueOfArray => patch.boxed_array().map(|_| patch),
            _ => Ok(patch),
        }
    }
}

impl fmt::Display for IntrinsicPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.patch_type {
            PatchType::ValueOfObject => "ValueOfObject",
            PatchType::ValueOfArray => "ValueOfArray",
        };
        write!(f, "{}({})", kind, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchDecodeError {
    /// Patch type bits don't name a patch type
    BadPatchType(u32),

    /// Object index past the end of the boxed caches
    IndexOutOfRange(u32),

    /// Array patch index that is not the first index of a cache
    NotACacheStart(u32),

    /// Expected an array patch
    NotAnArrayPatch(u32),
}

impl fmt::Display for PatchDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchDecodeError::BadPatchType(word) => write!(f, "Bad patch type in {:#010x}", word),
            PatchDecodeError::IndexOutOfRange(index) => {
                write!(f, "Boxed object index {} out of range", index)
            }
            PatchDecodeError::NotACacheStart(index) => {
                write!(f, "Index {} is not the start of a boxed cache", index)
            }
            PatchDecodeError::NotAnArrayPatch(word) => {
                write!(f, "Patch {:#010x} does not point to a cache", word)
            }
        }
    }
}

impl std::error::Error for PatchDecodeError {}

impl From<PatchDecodeError> for io::Error {
    fn from(err: PatchDecodeError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

/// Patches collected while generating code, in the order they were recorded
///
/// On disk, the table is a big-endian `u32` count followed by the packed patch words.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct PatchTable {
    patches: Vec<IntrinsicPatch>,
}

impl PatchTable {
    pub fn new() -> PatchTable {
        PatchTable::default()
    }

    /// Record a patch, returning its position in the table
    pub fn push(&mut self, patch: IntrinsicPatch) -> usize {
        self.patches.push(patch);
        self.patches.len() - 1
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntrinsicPatch> {
        self.patches.iter()
    }

    pub fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<BigEndian>(self.patches.len() as u32)?;
        for patch in &self.patches {
            writer.write_u32::<BigEndian>(patch.encode())?;
        }
        Ok(())
    }

    pub fn deserialize<R: ReadBytesExt>(reader: &mut R) -> io::Result<PatchTable> {
        let count = reader.read_u32::<BigEndian>()?;
        let mut patches = Vec::new();
        for _ in 0..count {
            let word = reader.read_u32::<BigEndian>()?;
            patches.push(IntrinsicPatch::try_from(word)?);
        }
        Ok(PatchTable { patches })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_layout() {
        assert_eq!(BoxedType::Byte.first_index(), 0);
        assert_eq!(BoxedType::Short.first_index(), 256);
        assert_eq!(BoxedType::Character.first_index(), 512);
        assert_eq!(BoxedType::Character.length(), 128);
        assert_eq!(BoxedType::Integer.first_index(), 640);
        assert_eq!(NUMBER_OF_BOXED_CACHES, 896);
    }

    #[test]
    fn value_indices() {
        assert_eq!(BoxedType::Byte.value_index(-128), Some(0));
        assert_eq!(BoxedType::Short.value_index(0), Some(384));
        assert_eq!(BoxedType::Character.value_index(-1), None);
        assert_eq!(BoxedType::Character.value_index(128), None);
        assert_eq!(BoxedType::Integer.value_index(127), Some(895));
        assert_eq!(BoxedType::Integer.value_index(128), None);
        assert_eq!(BoxedType::Integer.value_index(i32::MIN), None);

        assert_eq!(BoxedType::from_index(384), Some((BoxedType::Short, 0)));
        assert_eq!(BoxedType::from_index(512), Some((BoxedType::Character, 0)));
        assert_eq!(BoxedType::from_index(895), Some((BoxedType::Integer, 127)));
        assert_eq!(BoxedType::from_index(896), None);
    }

    #[test]
    fn packing() {
        // One bit is enough for the patch type
        assert_eq!(PATCH_TYPE_FIELD.width(), 1);
        assert_eq!(INDEX_FIELD.shift(), 1);
        assert_eq!(INDEX_FIELD.width(), 31);

        let object = IntrinsicPatch::value_of_object(BoxedType::Integer, 5).unwrap();
        assert_eq!(object.index, 773);
        assert_eq!(object.encode(), 773 << 1);
        assert_eq!(IntrinsicPatch::try_from(773 << 1), Ok(object));
        assert_eq!(object.boxed_value(), Ok((BoxedType::Integer, 5)));
        assert!(IntrinsicPatch::value_of_object(BoxedType::Integer, 1000).is_none());

        let array = IntrinsicPatch::value_of_array(BoxedType::Short);
        assert_eq!(array.encode(), (256 << 1) | 1);
        assert_eq!(array.boxed_array(), Ok(BoxedType::Short));
        assert_eq!(array.boxed_value(), Ok((BoxedType::Short, -128)));
        assert_eq!(object.to_string(), "ValueOfObject(773)");
    }

    #[test]
    fn invalid_patches() {
        assert_eq!(
            IntrinsicPatch::try_from(896 << 1),
            Err(PatchDecodeError::IndexOutOfRange(896))
        );
        assert_eq!(
            IntrinsicPatch::try_from((300 << 1) | 1),
            Err(PatchDecodeError::NotACacheStart(300))
        );
        let object = IntrinsicPatch::new(PatchType::ValueOfObject, 3);
        assert_eq!(
            object.boxed_array(),
            Err(PatchDecodeError::NotAnArrayPatch(6))
        );
    }

    #[test]
    fn patch_tables() {
        let mut table = PatchTable::new();
        assert!(table.is_empty());
        table.push(IntrinsicPatch::value_of_array(BoxedType::Integer));
        let position = table.push(IntrinsicPatch::value_of_object(BoxedType::Byte, -1).unwrap());
        assert_eq!(position, 1);

        let mut bytes = vec![];
        table.serialize(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 2, 0, 0, 0x05, 0x01, 0, 0, 0x00, 0xfe]
        );
        let decoded = PatchTable::deserialize(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, table);

        let corrupt: Vec<u8> = vec![0, 0, 0, 1, 0, 0, 0x02, 0x59];
        let err = PatchTable::deserialize(&mut corrupt.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let truncated: Vec<u8> = vec![0, 0, 0, 3, 0, 0, 0, 0];
        let err = PatchTable::deserialize(&mut truncated.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
