//! # Digital I/O
//!
//! Local inputs and outputs live in fixed arrays. Extension module pins are addressed by
//! `(module address, pin)` and are created on first write, reading one that was never written
//! gives `OFF`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use delta_if::PinStatus;

use super::StoreError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of local digital inputs, numbered from 1.
pub const NUM_DI: usize = 24;

/// Number of local digital outputs, numbered from 1.
pub const NUM_DO: usize = 12;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DigitalIo {
    di: [PinStatus; NUM_DI],
    dout: [PinStatus; NUM_DO],
    ext_di: BTreeMap<(i64, i64), PinStatus>,
    ext_do: BTreeMap<(i64, i64), PinStatus>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DigitalIo {
    fn default() -> Self {
        Self {
            di: [PinStatus::Off; NUM_DI],
            dout: [PinStatus::Off; NUM_DO],
            ext_di: BTreeMap::new(),
            ext_do: BTreeMap::new(),
        }
    }
}

impl DigitalIo {
    pub fn input(&self, pin: i64) -> Result<PinStatus, StoreError> {
        Ok(self.di[pin_index("DI pin", pin, NUM_DI)?])
    }

    pub fn set_input(&mut self, pin: i64, status: PinStatus) -> Result<(), StoreError> {
        self.di[pin_index("DI pin", pin, NUM_DI)?] = status;
        Ok(())
    }

    pub fn output(&self, pin: i64) -> Result<PinStatus, StoreError> {
        Ok(self.dout[pin_index("DO pin", pin, NUM_DO)?])
    }

    pub fn set_output(&mut self, pin: i64, status: PinStatus) -> Result<(), StoreError> {
        self.dout[pin_index("DO pin", pin, NUM_DO)?] = status;
        Ok(())
    }

    /// Read `length` inputs starting at `pin` as a bit field, with `pin` in bit 0.
    pub fn inputs(&self, pin: i64, length: i64) -> Result<i64, StoreError> {
        let range = field_range("DI pin", pin, length, NUM_DI)?;
        Ok(pack(&self.di[range]))
    }

    /// Read `length` outputs starting at `pin` as a bit field, with `pin` in bit 0.
    pub fn outputs(&self, pin: i64, length: i64) -> Result<i64, StoreError> {
        let range = field_range("DO pin", pin, length, NUM_DO)?;
        Ok(pack(&self.dout[range]))
    }

    /// Set `length` outputs starting at `pin` from a bit field, with `pin` taken from bit 0.
    ///
    /// Nothing is written unless the whole field is valid.
    pub fn set_outputs(&mut self, pin: i64, length: i64, bits: i64) -> Result<(), StoreError> {
        let range = field_range("DO pin", pin, length, NUM_DO)?;

        if bits < 0 || bits >> length != 0 {
            return Err(StoreError::InvalidArgument(format!(
                "bit field {} does not fit in {} pins",
                bits, length
            )));
        }

        for (i, status) in self.dout[range].iter_mut().enumerate() {
            *status = PinStatus::from(bits >> i & 1 == 1);
        }

        Ok(())
    }

    pub fn external_input(&self, address: i64, pin: i64) -> Result<PinStatus, StoreError> {
        let key = ext_key(address, pin)?;
        Ok(self.ext_di.get(&key).copied().unwrap_or(PinStatus::Off))
    }

    pub fn set_external_input(
        &mut self,
        address: i64,
        pin: i64,
        status: PinStatus,
    ) -> Result<(), StoreError> {
        self.ext_di.insert(ext_key(address, pin)?, status);
        Ok(())
    }

    pub fn external_output(&self, address: i64, pin: i64) -> Result<PinStatus, StoreError> {
        let key = ext_key(address, pin)?;
        Ok(self.ext_do.get(&key).copied().unwrap_or(PinStatus::Off))
    }

    pub fn set_external_output(
        &mut self,
        address: i64,
        pin: i64,
        status: PinStatus,
    ) -> Result<(), StoreError> {
        self.ext_do.insert(ext_key(address, pin)?, status);
        Ok(())
    }

    /// Every local input keyed by pin number.
    pub fn input_states(&self) -> BTreeMap<u32, PinStatus> {
        numbered(&self.di)
    }

    /// Every local output keyed by pin number.
    pub fn output_states(&self) -> BTreeMap<u32, PinStatus> {
        numbered(&self.dout)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a 1-based pin number into an array index.
fn pin_index(what: &'static str, pin: i64, count: usize) -> Result<usize, StoreError> {
    if pin >= 1 && pin <= count as i64 {
        Ok((pin - 1) as usize)
    } else {
        Err(StoreError::OutOfRange {
            what,
            value: pin,
            min: 1,
            max: count as i64,
        })
    }
}

fn field_range(
    what: &'static str,
    pin: i64,
    length: i64,
    count: usize,
) -> Result<std::ops::Range<usize>, StoreError> {
    if !(1..=count as i64).contains(&length) {
        return Err(StoreError::OutOfRange {
            what: "bit field length",
            value: length,
            min: 1,
            max: count as i64,
        });
    }

    let first = pin_index(what, pin, count)?;
    let last = pin_index(what, pin + length - 1, count)?;

    Ok(first..last + 1)
}

fn ext_key(address: i64, pin: i64) -> Result<(i64, i64), StoreError> {
    if address < 0 {
        return Err(StoreError::Negative("extension module address", address));
    }
    if pin < 0 {
        return Err(StoreError::Negative("extension pin", pin));
    }
    Ok((address, pin))
}

fn pack(pins: &[PinStatus]) -> i64 {
    pins.iter()
        .enumerate()
        .filter(|(_, s)| s.is_on())
        .fold(0, |acc, (i, _)| acc | 1 << i)
}

fn numbered(pins: &[PinStatus]) -> BTreeMap<u32, PinStatus> {
    pins.iter()
        .enumerate()
        .map(|(i, s)| (i as u32 + 1, *s))
        .collect()
}
