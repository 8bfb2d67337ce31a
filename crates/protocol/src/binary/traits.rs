//! Binary codec traits for fixed container structures

use std::io::{self, Read, Write};

/// Read from the container's binary layout
pub trait BinaryRead: Sized {
    /// Error produced when the input is short or malformed
    type Error: From<io::Error>;

    /// Read this type from a binary reader
    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error>;
}

/// Write in the container's binary layout
pub trait BinaryWrite {
    /// Write this type to a binary writer
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// Exact number of bytes `write_to` emits
    fn serialized_size(&self) -> usize;
}

