//! Register memory
//!
//! Two fixed banks of 16 bit words. Accesses are either a single word (`W`) or a double word (`DW`)
//! made of the word at the access address (low half) and the word after it (high half).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use delta_if::RegSize;

use super::StoreError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Inclusive start address of the primary bank.
pub const PRIMARY_START: i64 = 0x1000;
/// Inclusive end address of the primary bank.
pub const PRIMARY_END: i64 = 0x1FFF;
/// Inclusive start address of the secondary bank.
pub const SECONDARY_START: i64 = 0x3000;
/// Inclusive end address of the secondary bank.
pub const SECONDARY_END: i64 = 0x3FFF;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Backing storage for both register banks.
#[derive(Debug, Clone)]
pub struct RegisterMemory {
    primary: Box<[u16]>,
    secondary: Box<[u16]>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The addressable register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterBank {
    /// `0x1000..=0x1FFF`
    Primary,
    /// `0x3000..=0x3FFF`
    Secondary,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RegisterBank {
    /// Returns the inclusive bounds of this bank.
    pub const fn bounds(self) -> (i64, i64) {
        match self {
            Self::Primary => (PRIMARY_START, PRIMARY_END),
            Self::Secondary => (SECONDARY_START, SECONDARY_END),
        }
    }

    /// Number of words in the bank.
    pub const fn num_words(self) -> usize {
        let (start, end) = self.bounds();
        (end - start + 1) as usize
    }

    pub const fn contains(self, address: i64) -> bool {
        let (start, end) = self.bounds();
        address >= start && address <= end
    }
}

/// Decodes an address into its bank, or `None` if it lies outside both banks.
pub const fn decode_register_bank(address: i64) -> Option<RegisterBank> {
    match address {
        PRIMARY_START..=PRIMARY_END => Some(RegisterBank::Primary),
        SECONDARY_START..=SECONDARY_END => Some(RegisterBank::Secondary),
        _ => None,
    }
}

/// Reinterpret a value as the signed integer of the given width that has the same low bits.
pub const fn wrap_to_width(value: i64, size: RegSize) -> i64 {
    match size {
        RegSize::W => value as i16 as i64,
        RegSize::DW => value as i32 as i64,
    }
}

impl Default for RegisterMemory {
    fn default() -> Self {
        Self {
            primary: vec![0; RegisterBank::Primary.num_words()].into_boxed_slice(),
            secondary: vec![0; RegisterBank::Secondary.num_words()].into_boxed_slice(),
        }
    }
}

impl RegisterMemory {
    /// Read a signed value of the given width.
    pub fn read(&self, address: i64, size: RegSize) -> Result<i64, StoreError> {
        let (bank, offset) = Self::locate(address, size)?;
        let words = self.bank(bank);

        Ok(match size {
            RegSize::W => words[offset] as i16 as i64,
            RegSize::DW => {
                let low = words[offset] as u32;
                let high = words[offset + 1] as u32;
                ((high << 16) | low) as i32 as i64
            }
        })
    }

    /// Write a value of the given width, wrapping it into the width's two's complement range.
    ///
    /// Returns the value as it is now stored.
    pub fn write(&mut self, address: i64, value: i64, size: RegSize) -> Result<i64, StoreError> {
        let (bank, offset) = Self::locate(address, size)?;
        let words = self.bank_mut(bank);

        match size {
            RegSize::W => words[offset] = value as u16,
            RegSize::DW => {
                let dword = value as u32;
                words[offset] = (dword & 0xFFFF) as u16;
                words[offset + 1] = (dword >> 16) as u16;
            }
        }

        Ok(wrap_to_width(value, size))
    }

    /// Find the bank and word offset of an access, checking that every word it covers lies in the
    /// same bank.
    fn locate(address: i64, size: RegSize) -> Result<(RegisterBank, usize), StoreError> {
        let bank = decode_register_bank(address).ok_or(StoreError::AddressOutOfRange(address))?;

        let last = address + size.num_words() as i64 - 1;
        if !bank.contains(last) {
            return Err(StoreError::AddressOutOfRange(last));
        }

        Ok((bank, (address - bank.bounds().0) as usize))
    }

    fn bank(&self, bank: RegisterBank) -> &[u16] {
        match bank {
            RegisterBank::Primary => &self.primary,
            RegisterBank::Secondary => &self.secondary,
        }
    }

    fn bank_mut(&mut self, bank: RegisterBank) -> &mut [u16] {
        match bank {
            RegisterBank::Primary => &mut self.primary,
            RegisterBank::Secondary => &mut self.secondary,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_at_boundaries() {
        assert_eq!(decode_register_bank(0x0FFF), None);
        assert_eq!(decode_register_bank(0x1000), Some(RegisterBank::Primary));
        assert_eq!(decode_register_bank(0x1FFF), Some(RegisterBank::Primary));
        assert_eq!(decode_register_bank(0x2000), None);
        assert_eq!(decode_register_bank(0x2FFF), None);
        assert_eq!(decode_register_bank(0x3000), Some(RegisterBank::Secondary));
        assert_eq!(decode_register_bank(0x3FFF), Some(RegisterBank::Secondary));
        assert_eq!(decode_register_bank(0x4000), None);
        assert_eq!(decode_register_bank(-1), None);
        assert_eq!(RegisterBank::Primary.num_words(), 0x1000);
    }

    #[test]
    fn test_word_roundtrip_and_wrap() {
        let mut mem = RegisterMemory::default();

        assert_eq!(mem.write(0x1000, 12345, RegSize::W), Ok(12345));
        assert_eq!(mem.read(0x1000, RegSize::W), Ok(12345));

        // 70000 mod 65536
        assert_eq!(mem.write(0x1000, 70000, RegSize::W), Ok(4464));
        assert_eq!(mem.read(0x1000, RegSize::W), Ok(4464));

        // Two's complement, not saturation
        assert_eq!(mem.write(0x3000, 40000, RegSize::W), Ok(-25536));
        assert_eq!(mem.write(0x3001, -1, RegSize::W), Ok(-1));
        assert_eq!(mem.read(0x3001, RegSize::W), Ok(-1));
    }

    #[test]
    fn test_width_reinterprets_storage() {
        let mut mem = RegisterMemory::default();

        assert_eq!(mem.write(0x1010, 0x0001_0002, RegSize::DW), Ok(65538));
        assert_eq!(mem.read(0x1010, RegSize::W), Ok(2));
        assert_eq!(mem.read(0x1011, RegSize::W), Ok(1));
        assert_eq!(mem.read(0x1010, RegSize::DW), Ok(65538));

        assert_eq!(mem.write(0x1020, 1 << 33, RegSize::DW), Ok(0));
        assert_eq!(mem.write(0x1020, -2, RegSize::DW), Ok(-2));
        assert_eq!(mem.read(0x1020, RegSize::DW), Ok(-2));
    }

    #[test]
    fn test_wrap_to_width() {
        assert_eq!(wrap_to_width(70000, RegSize::W), 4464);
        assert_eq!(wrap_to_width(65535, RegSize::W), -1);
        assert_eq!(wrap_to_width(65535, RegSize::DW), 65535);
        assert_eq!(wrap_to_width(0xFFFF_FFFF, RegSize::DW), -1);
    }

    #[test]
    fn test_out_of_range() {
        let mut mem = RegisterMemory::default();

        assert_eq!(
            mem.write(0x2000, 1, RegSize::W),
            Err(StoreError::AddressOutOfRange(0x2000))
        );
        assert_eq!(
            mem.read(0x1FFF, RegSize::DW),
            Err(StoreError::AddressOutOfRange(0x2000))
        );
        assert!(mem.read(0x1FFF, RegSize::W).is_ok());
    }
}
