/// Byte-granular access to an address space.
///
/// Every backing store implements this; the wider 16/32-bit bus accesses
/// are composed from byte accesses in little-endian order.
pub trait IoDevice {
    type Address;
    type Value;

    fn read_at(&self, address: Self::Address) -> Self::Value;
    fn write_at(&mut self, address: Self::Address, value: Self::Value);
}
